//! Client-side PDF signing
//!
//! This crate places signature images on PDF pages and bakes them into a new
//! document using lopdf. Everything runs in-process, natively or in the
//! browser through WebAssembly.
//!
//! - `document`: load and validate PDF bytes, page geometry
//! - `signature` / `capture`: uploaded or hand-drawn signature images
//! - `placement`: where each signature sits, per page
//! - `export`: embed the placements into the PDF
//! - `session`: an owned editor session tying the above together

pub mod capture;
pub mod config;
pub mod coords;
pub mod document;
pub mod error;
pub mod export;
pub mod placement;
pub mod session;
pub mod signature;

pub use capture::{PadPoint, SignaturePad};
pub use config::{EditorConfig, PadConfig, SizePreset, MAX_PAD_DIMENSION};
pub use coords::{PageFrame, PdfRect, ScreenRect};
pub use document::{quick_validate, DocumentInfo, LoadedDocument, PageInfo, PageOrientation};
pub use error::SignPdfError;
pub use export::{export_pdf, output_file_name, ExportOptions};
pub use placement::{Placement, PlacementId, PlacementModel, PlacementSummary, SizeLimits};
pub use session::{Direction, EditorSession, ExportedPdf, Zoom};
pub use signature::{ImageFormat, SignatureImage};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, SignPdfError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| SignPdfError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
