//! Signing session exposed to JavaScript
//!
//! Wraps [`EditorSession`]. JavaScript renders pages and placement overlays
//! and forwards pointer and keyboard events; all state lives here.

use pdfsign_core::{
    Direction, EditorConfig, EditorSession, PadConfig, PadPoint, PlacementId, SignaturePad, Zoom,
};
use wasm_bindgen::prelude::*;

fn parse_direction(value: &str) -> Result<Direction, String> {
    match value.to_ascii_lowercase().as_str() {
        "up" | "arrowup" => Ok(Direction::Up),
        "down" | "arrowdown" => Ok(Direction::Down),
        "left" | "arrowleft" => Ok(Direction::Left),
        "right" | "arrowright" => Ok(Direction::Right),
        other => Err(format!("Unknown direction: {}", other)),
    }
}

fn parse_zoom(value: &str) -> Result<Zoom, String> {
    match value.to_ascii_lowercase().as_str() {
        "in" | "+" => Ok(Zoom::In),
        "out" | "-" => Ok(Zoom::Out),
        other => Err(format!("Unknown zoom: {}", other)),
    }
}

/// A signed PDF ready for download
#[wasm_bindgen]
pub struct SignedPdf {
    file_name: String,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl SignedPdf {
    #[wasm_bindgen(getter, js_name = fileName)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.bytes.as_slice())
    }
}

/// Session for signing a single PDF document
#[wasm_bindgen]
pub struct SignSession {
    inner: EditorSession,
}

#[wasm_bindgen]
impl SignSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: EditorSession::default(),
        }
    }

    /// Create a session from a TOML configuration string
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(toml: &str) -> Result<SignSession, JsValue> {
        let config = EditorConfig::from_toml_str(toml).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            inner: EditorSession::new(config),
        })
    }

    fn load_document_internal(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<pdfsign_core::DocumentInfo, String> {
        self.inner
            .load_document(name, bytes.to_vec())
            .map_err(|e| e.to_string())
    }

    /// Load a PDF, replacing any current document and its signatures
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&mut self, name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
        let info = self
            .load_document_internal(name, bytes)
            .map_err(|e| JsValue::from_str(&e))?;

        serde_wasm_bindgen::to_value(&info)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = closeDocument)]
    pub fn close_document(&mut self) {
        self.inner.close_document();
    }

    #[wasm_bindgen(getter, js_name = hasDocument)]
    pub fn has_document(&self) -> bool {
        self.inner.has_document()
    }

    #[wasm_bindgen(getter, js_name = documentName)]
    pub fn document_name(&self) -> Option<String> {
        self.inner.document().map(|d| d.name().to_string())
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.inner.page_count()
    }

    /// Get document bytes for PDF.js rendering
    #[wasm_bindgen(js_name = getDocumentBytes)]
    pub fn get_document_bytes(&self) -> Option<js_sys::Uint8Array> {
        self.inner
            .document()
            .map(|d| js_sys::Uint8Array::from(d.bytes()))
    }

    #[wasm_bindgen(js_name = getPageInfo)]
    pub fn get_page_info(&self, page: u32) -> Result<JsValue, JsValue> {
        let info = self
            .inner
            .page_info(page)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        serde_wasm_bindgen::to_value(&info)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(getter, js_name = currentPage)]
    pub fn current_page(&self) -> u32 {
        self.inner.current_page()
    }

    #[wasm_bindgen(js_name = goToPage)]
    pub fn go_to_page(&mut self, page: u32) -> bool {
        self.inner.go_to_page(page)
    }

    #[wasm_bindgen(js_name = nextPage)]
    pub fn next_page(&mut self) -> bool {
        self.inner.next_page()
    }

    #[wasm_bindgen(js_name = prevPage)]
    pub fn prev_page(&mut self) -> bool {
        self.inner.prev_page()
    }

    /// Tell the session how wide a page is drawn on screen, in CSS pixels
    #[wasm_bindgen(js_name = setDisplayWidth)]
    pub fn set_display_width(&mut self, page: u32, width: f64) -> bool {
        self.inner.set_display_width(page, width)
    }

    /// Save a signature from a `data:` URL (canvas export or file reader)
    #[wasm_bindgen(js_name = saveSignatureDataUrl)]
    pub fn save_signature_data_url(&mut self, url: &str) -> Result<u64, JsValue> {
        self.inner
            .save_data_url_signature(url)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Save an uploaded PNG or JPEG
    #[wasm_bindgen(js_name = saveUploadedSignature)]
    pub fn save_uploaded_signature(&mut self, mime: &str, bytes: &[u8]) -> Result<u64, JsValue> {
        self.inner
            .save_uploaded_signature(mime, bytes.to_vec())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = saveDrawnSignature)]
    pub fn save_drawn_signature(&mut self, pad: &SignPad) -> Result<u64, JsValue> {
        self.inner
            .save_drawn_signature(&pad.inner)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn selected(&self) -> Option<u64> {
        self.inner.selected()
    }

    pub fn select(&mut self, id: u64) -> bool {
        self.inner.select(id)
    }

    #[wasm_bindgen(js_name = selectAndRaise)]
    pub fn select_and_raise(&mut self, id: u64) -> bool {
        self.inner.select_and_raise(id)
    }

    pub fn deselect(&mut self) {
        self.inner.deselect();
    }

    #[wasm_bindgen(js_name = dropAt)]
    pub fn drop_at(&mut self, id: u64, x: f64, y: f64) -> bool {
        self.inner.drop_at(id, x, y)
    }

    #[wasm_bindgen(js_name = moveBy)]
    pub fn move_by(&mut self, id: u64, dx: f64, dy: f64) -> bool {
        self.inner.move_by(id, dx, dy)
    }

    /// Move the selection; accepts "up"/"down"/"left"/"right" or the
    /// matching `KeyboardEvent.key` values
    pub fn nudge(&mut self, direction: &str) -> Result<bool, JsValue> {
        let direction = parse_direction(direction).map_err(|e| JsValue::from_str(&e))?;
        Ok(self.inner.nudge(direction))
    }

    pub fn resize(&mut self, id: u64, scale_factor: f64, preserve_aspect_ratio: bool) -> bool {
        self.inner.resize(id, scale_factor, preserve_aspect_ratio)
    }

    /// "in" or "out"
    #[wasm_bindgen(js_name = zoomSelected)]
    pub fn zoom_selected(&mut self, zoom: &str) -> Result<bool, JsValue> {
        let zoom = parse_zoom(zoom).map_err(|e| JsValue::from_str(&e))?;
        Ok(self.inner.zoom_selected(zoom))
    }

    #[wasm_bindgen(js_name = applyPreset)]
    pub fn apply_preset(&mut self, id: u64, preset: &str) -> bool {
        self.inner.apply_preset(id, preset)
    }

    #[wasm_bindgen(js_name = duplicateToCurrentPage)]
    pub fn duplicate_to_current_page(&mut self, id: u64) -> Option<u64> {
        self.inner.duplicate_to_current_page(id)
    }

    #[wasm_bindgen(js_name = duplicateToAllPages)]
    pub fn duplicate_to_all_pages(&mut self, id: u64) -> Vec<u64> {
        self.inner.duplicate_to_all_pages(id)
    }

    pub fn delete(&mut self, id: u64) -> bool {
        self.inner.delete(id)
    }

    /// Restore creation order after raises
    #[wasm_bindgen(js_name = sortPlacements)]
    pub fn sort_placements(&mut self) {
        self.inner.sort_placements();
    }

    /// All placements as `[{ id, page, x, y, width, height, name, mime }]`
    #[wasm_bindgen(js_name = getPlacements)]
    pub fn get_placements(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.placements().summaries())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = getPlacementsForPage)]
    pub fn get_placements_for_page(&self, page: u32) -> Result<JsValue, JsValue> {
        let summaries: Vec<_> = self
            .inner
            .placements()
            .list_for_page(page)
            .into_iter()
            .map(|p| p.summary())
            .collect();
        serde_wasm_bindgen::to_value(&summaries)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Image for an overlay `<img src>`
    #[wasm_bindgen(js_name = getSignatureDataUrl)]
    pub fn get_signature_data_url(&self, id: u64) -> Option<String> {
        self.signature_data_url(id)
    }

    fn signature_data_url(&self, id: PlacementId) -> Option<String> {
        self.inner
            .placements()
            .get(id)
            .map(|p| p.source.to_data_url())
    }

    fn export_internal(&self) -> Result<SignedPdf, String> {
        let exported = self.inner.export().map_err(|e| e.to_string())?;
        Ok(SignedPdf {
            file_name: exported.file_name,
            bytes: exported.bytes,
        })
    }

    /// Bake all placements into a new PDF
    pub fn export(&self) -> Result<SignedPdf, JsValue> {
        self.export_internal().map_err(|e| JsValue::from_str(&e))
    }
}

impl Default for SignSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Freehand drawing surface
#[wasm_bindgen]
pub struct SignPad {
    inner: SignaturePad,
}

#[wasm_bindgen]
impl SignPad {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: SignaturePad::new(&PadConfig::default()),
        }
    }

    fn with_size_internal(
        width: u32,
        height: u32,
        pen_width: f64,
        pen_color: &str,
    ) -> Result<SignPad, String> {
        let defaults = PadConfig::default();
        let config = PadConfig {
            width,
            height,
            pen_width: if pen_width.is_finite() && pen_width > 0.0 {
                pen_width
            } else {
                defaults.pen_width
            },
            pen_color: pen_color.to_string(),
        };
        config.validate().map_err(|e| e.to_string())?;
        Ok(Self {
            inner: SignaturePad::new(&config),
        })
    }

    /// Pad sized to match the on-screen canvas
    #[wasm_bindgen(js_name = withSize)]
    pub fn with_size(
        width: u32,
        height: u32,
        pen_width: f64,
        pen_color: &str,
    ) -> Result<SignPad, JsValue> {
        Self::with_size_internal(width, height, pen_width, pen_color)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.dimensions().0
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.dimensions().1
    }

    #[wasm_bindgen(js_name = beginStroke)]
    pub fn begin_stroke(&mut self, x: f64, y: f64) {
        self.inner.begin_stroke(x, y);
    }

    #[wasm_bindgen(js_name = extendStroke)]
    pub fn extend_stroke(&mut self, x: f64, y: f64) {
        self.inner.extend_stroke(x, y);
    }

    #[wasm_bindgen(js_name = endStroke)]
    pub fn end_stroke(&mut self) {
        self.inner.end_stroke();
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[wasm_bindgen(js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Replace strokes with `[[{x, y}, ...], ...]` collected in JavaScript
    #[wasm_bindgen(js_name = setStrokes)]
    pub fn set_strokes(&mut self, strokes: JsValue) -> Result<(), JsValue> {
        let strokes: Vec<Vec<PadPoint>> = serde_wasm_bindgen::from_value(strokes)
            .map_err(|e| JsValue::from_str(&format!("Invalid strokes: {}", e)))?;
        self.inner.set_strokes(strokes);
        Ok(())
    }

    #[wasm_bindgen(js_name = toDataUrl)]
    pub fn to_data_url(&self) -> Result<String, JsValue> {
        self.inner
            .to_data_url()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Default for SignPad {
    fn default() -> Self {
        Self::new()
    }
}
