//! Editor session
//!
//! Owns everything the signing UI works on: the loaded document, the
//! placement model, the current selection and page, and the per-page
//! display widths used to map screen pixels back to points on export.

use crate::capture::SignaturePad;
use crate::config::EditorConfig;
use crate::coords::ScreenRect;
use crate::document::{DocumentInfo, LoadedDocument, PageInfo};
use crate::error::SignPdfError;
use crate::export::{export_pdf, output_file_name, ExportOptions};
use crate::placement::{Placement, PlacementId, PlacementModel};
use crate::signature::SignatureImage;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Arrow-key direction for nudging the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Screen-space unit vector; Y grows downward
    fn delta(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zoom {
    In,
    Out,
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    config: EditorConfig,
    document: Option<LoadedDocument>,
    placements: PlacementModel,
    selected: Option<PlacementId>,
    current_page: u32,
    display_widths: BTreeMap<u32, f64>,
    /// Labels handed out for the current document; never goes back down
    labels_issued: u32,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let placements = PlacementModel::new(1, config.size_limits());
        Self {
            config,
            document: None,
            placements,
            selected: None,
            current_page: 1,
            display_widths: BTreeMap::new(),
            labels_issued: 0,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Load a new document, discarding all placements and selection.
    /// On failure the session is left with no document.
    pub fn load_document(&mut self, name: &str, bytes: Vec<u8>) -> Result<DocumentInfo, SignPdfError> {
        self.close_document();

        let document = LoadedDocument::from_bytes(name, bytes)?;
        let info = document.info();
        self.placements = PlacementModel::new(document.page_count(), self.config.size_limits());
        self.document = Some(document);
        Ok(info)
    }

    /// Drop the document and everything placed on it
    pub fn close_document(&mut self) {
        if let Some(doc) = self.document.take() {
            info!(name = doc.name(), "document closed");
        }
        self.placements = PlacementModel::new(1, self.config.size_limits());
        self.selected = None;
        self.current_page = 1;
        self.display_widths.clear();
        self.labels_issued = 0;
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    fn require_document(&self) -> Result<&LoadedDocument, SignPdfError> {
        self.document.as_ref().ok_or(SignPdfError::NoDocument)
    }

    /// 0 when no document is loaded
    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map_or(0, LoadedDocument::page_count)
    }

    pub fn page_info(&self, page: u32) -> Result<PageInfo, SignPdfError> {
        self.require_document()?.page_info(page)
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page == 0 || page > self.page_count() {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.current_page > 1 && self.go_to_page(self.current_page - 1)
    }

    /// Record how wide a page is rendered on screen. A non-positive width
    /// resets the page to one pixel per point.
    pub fn set_display_width(&mut self, page: u32, width: f64) -> bool {
        if page == 0 || page > self.page_count() {
            return false;
        }
        if width.is_finite() && width > 0.0 {
            self.display_widths.insert(page, width);
        } else {
            self.display_widths.remove(&page);
        }
        true
    }

    pub fn placements(&self) -> &PlacementModel {
        &self.placements
    }

    pub fn placements_on_current_page(&self) -> Vec<&Placement> {
        self.placements.list_for_page(self.current_page)
    }

    pub fn selected(&self) -> Option<PlacementId> {
        self.selected
    }

    /// Place a new signature at the top-left of the current page and
    /// select it
    pub fn save_signature(&mut self, image: SignatureImage) -> Result<PlacementId, SignPdfError> {
        self.require_document()?;

        let width = self.config.default_width;
        let height = if self.config.keep_image_aspect {
            width / image.aspect_ratio()
        } else {
            self.config.default_height
        };
        self.labels_issued += 1;
        let name = format!("{} {}", self.config.label_prefix, self.labels_issued);
        let placement = Placement::new(
            Arc::new(image),
            self.current_page,
            ScreenRect::new(0.0, 0.0, width, height),
            &name,
        );

        let id = self.placements.add(placement);
        self.selected = Some(id);
        info!(id, page = self.current_page, %name, "signature saved");
        Ok(id)
    }

    pub fn save_drawn_signature(&mut self, pad: &SignaturePad) -> Result<PlacementId, SignPdfError> {
        self.require_document()?;
        let image = pad.to_signature_image()?;
        self.save_signature(image)
    }

    pub fn save_uploaded_signature(
        &mut self,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<PlacementId, SignPdfError> {
        self.require_document()?;
        let image = SignatureImage::from_upload(mime, bytes)?;
        self.save_signature(image)
    }

    pub fn save_data_url_signature(&mut self, url: &str) -> Result<PlacementId, SignPdfError> {
        self.require_document()?;
        let image = SignatureImage::from_data_url(url)?;
        self.save_signature(image)
    }

    /// Select a placement and show its page
    pub fn select(&mut self, id: PlacementId) -> bool {
        let Some(page) = self.placements.get(id).map(|p| p.page) else {
            return false;
        };
        self.selected = Some(id);
        self.current_page = page;
        true
    }

    /// Select a placement and draw it above the others
    pub fn select_and_raise(&mut self, id: PlacementId) -> bool {
        self.select(id) && self.placements.bring_to_front(id)
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Put placements back in creation order, undoing any raises
    pub fn sort_placements(&mut self) {
        self.placements.sort_by_id();
    }

    /// Drop a placement at a position on the current page
    pub fn drop_at(&mut self, id: PlacementId, x: f64, y: f64) -> bool {
        self.placements.place_at(id, x, y, self.current_page)
    }

    pub fn move_by(&mut self, id: PlacementId, dx: f64, dy: f64) -> bool {
        self.placements.move_by(id, dx, dy)
    }

    /// Move the selection one nudge step
    pub fn nudge(&mut self, direction: Direction) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        let (ux, uy) = direction.delta();
        let step = self.config.nudge_step;
        self.placements.move_by(id, ux * step, uy * step)
    }

    pub fn resize(&mut self, id: PlacementId, scale_factor: f64, preserve_aspect_ratio: bool) -> bool {
        self.placements.resize(id, scale_factor, preserve_aspect_ratio)
    }

    /// Grow or shrink the selection, keeping its aspect ratio
    pub fn zoom_selected(&mut self, zoom: Zoom) -> bool {
        let Some(id) = self.selected else {
            return false;
        };
        let factor = match zoom {
            Zoom::In => self.config.zoom_in_factor,
            Zoom::Out => self.config.zoom_out_factor,
        };
        self.placements.resize(id, factor, true)
    }

    /// Apply a named width preset ("sm", "md", "lg", "xl")
    pub fn apply_preset(&mut self, id: PlacementId, preset: &str) -> bool {
        match self.config.preset(preset).map(|p| p.width) {
            Some(width) => self.placements.set_width(id, width),
            None => {
                warn!(preset, "unknown size preset");
                false
            }
        }
    }

    pub fn duplicate_to_page(&mut self, id: PlacementId, page: u32) -> Option<PlacementId> {
        self.placements.duplicate_to_page(id, page)
    }

    pub fn duplicate_to_current_page(&mut self, id: PlacementId) -> Option<PlacementId> {
        self.placements.duplicate_to_page(id, self.current_page)
    }

    pub fn duplicate_to_all_pages(&mut self, id: PlacementId) -> Vec<PlacementId> {
        let copies = self.placements.duplicate_to_all_pages(id);
        if !copies.is_empty() {
            info!(id, copies = copies.len(), "signature copied to all pages");
        }
        copies
    }

    /// Remove a placement, clearing the selection if it was selected
    pub fn delete(&mut self, id: PlacementId) -> bool {
        let removed = self.placements.delete(id);
        if removed && self.selected == Some(id) {
            self.selected = None;
        }
        removed
    }

    /// Export with a local-time timestamp in the file name
    pub fn export(&self) -> Result<ExportedPdf, SignPdfError> {
        self.export_at(Local::now().naive_local())
    }

    pub fn export_at(&self, timestamp: NaiveDateTime) -> Result<ExportedPdf, SignPdfError> {
        let document = self.require_document()?;
        let options = ExportOptions {
            display_widths: self.display_widths.clone(),
        };
        let bytes = export_pdf(document.bytes(), self.placements.placements(), &options)?;
        let file_name = output_file_name(
            document.name(),
            timestamp,
            &self.config.file_timestamp_format,
        );
        info!(%file_name, placements = self.placements.len(), "document exported");
        Ok(ExportedPdf { file_name, bytes })
    }
}
