//! WASM bindings for client-side PDF signing
//!
//! All state is held in Rust; JavaScript renders pages, draws overlays and
//! forwards user input.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { SignSession, SignPad } from './pkg/pdfsign_wasm.js';
//!
//! await init();
//!
//! const session = new SignSession();
//! const info = session.loadDocument(file.name, bytes);
//! session.setDisplayWidth(1, canvas.width);
//!
//! const pad = new SignPad();
//! pad.beginStroke(x, y); pad.extendStroke(x2, y2); pad.endStroke();
//! const id = session.saveDrawnSignature(pad);
//! session.dropAt(id, 120, 340);
//! session.duplicateToAllPages(id);
//!
//! const signed = session.export();
//! downloadBlob(signed.bytes, signed.fileName);
//! ```

pub mod session;

use wasm_bindgen::prelude::*;

pub use session::{SignPad, SignSession, SignedPdf};

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen(js_name = quickValidate)]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    pdfsign_core::quick_validate(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get page count from PDF bytes (convenience function)
#[wasm_bindgen(js_name = getPageCount)]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    pdfsign_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Build the download name for a signed copy, using local time
#[wasm_bindgen(js_name = outputFileName)]
pub fn output_file_name(original_name: &str) -> String {
    let config = pdfsign_core::EditorConfig::default();
    pdfsign_core::output_file_name(
        original_name,
        chrono::Local::now().naive_local(),
        &config.file_timestamp_format,
    )
}
