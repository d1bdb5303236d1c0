//! Document loading and page information
//!
//! Validates PDF bytes, keeps the parsed document for page queries and keeps
//! the original bytes untouched for export.

use crate::error::SignPdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::{info, warn};

/// US Letter, used when a page has no usable MediaBox
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Parent chains deeper than this are treated as broken
const MAX_INHERITANCE_DEPTH: usize = 32;

/// A loaded PDF
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    name: String,
    bytes: Vec<u8>,
    document: Document,
    page_count: u32,
    version: String,
    encrypted: bool,
}

impl LoadedDocument {
    /// Validate and parse PDF bytes
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self, SignPdfError> {
        if bytes.len() < 8 {
            return Err(SignPdfError::ParseError(
                "File too small to be a valid PDF".to_string(),
            ));
        }
        if !bytes.starts_with(b"%PDF-") {
            return Err(SignPdfError::ParseError(
                "Not a valid PDF file (missing %PDF- header)".to_string(),
            ));
        }

        let document = Document::load_mem(&bytes).map_err(|e| {
            warn!(name, error = %e, "PDF failed to parse");
            SignPdfError::ParseError(e.to_string())
        })?;

        let page_count = document.get_pages().len() as u32;
        if page_count == 0 {
            return Err(SignPdfError::NoPages);
        }

        let version = extract_version(&bytes);
        let encrypted = document.is_encrypted();
        info!(name, page_count, %version, encrypted, "document loaded");

        Ok(Self {
            name: name.to_string(),
            bytes,
            document,
            page_count,
            version,
            encrypted,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original file bytes, exactly as loaded
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn page_info(&self, page_num: u32) -> Result<PageInfo, SignPdfError> {
        PageInfo::from_document(&self.document, page_num)
    }

    pub fn pages(&self) -> Result<Vec<PageInfo>, SignPdfError> {
        (1..=self.page_count)
            .map(|n| PageInfo::from_document(&self.document, n))
            .collect()
    }

    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            name: self.name.clone(),
            page_count: self.page_count,
            version: self.version.clone(),
            encrypted: self.encrypted,
            size_bytes: self.bytes.len(),
        }
    }
}

/// Summary handed to UI layers after a successful load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub page_count: u32,
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
}

/// Information about a single PDF page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub page_num: u32,
    /// [x1, y1, x2, y2] in points
    pub media_box: [f64; 4],
    /// Page width in points (1 point = 1/72 inch)
    pub width: f64,
    /// Page height in points
    pub height: f64,
    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i64,
    pub orientation: PageOrientation,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
    Square,
}

impl PageInfo {
    pub fn from_document(doc: &Document, page_num: u32) -> Result<Self, SignPdfError> {
        let page_id = *doc
            .get_pages()
            .get(&page_num)
            .ok_or_else(|| SignPdfError::ParseError(format!("Page {} not found", page_num)))?;

        let media_box = page_media_box(doc, page_id);
        let (width, height) = (media_box[2] - media_box[0], media_box[3] - media_box[1]);
        let rotation = page_rotation(doc, page_id);

        let (effective_width, effective_height) = if rotation == 90 || rotation == 270 {
            (height, width)
        } else {
            (width, height)
        };
        let orientation = if (effective_width - effective_height).abs() < 1.0 {
            PageOrientation::Square
        } else if effective_width > effective_height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        };

        Ok(Self {
            page_num,
            media_box,
            width,
            height,
            rotation,
            orientation,
        })
    }
}

/// Look up a page attribute, following `/Parent` links for inheritable keys
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent_id).ok()?.as_dict().ok()?;
    }
    None
}

/// Resolve one level of indirection
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// MediaBox of a page, normalized so x1 < x2 and y1 < y2
pub(crate) fn page_media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    inherited_attribute(doc, page_id, b"MediaBox")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .and_then(|array| parse_box_array(array))
        .unwrap_or(DEFAULT_MEDIA_BOX)
}

fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_i64().ok())
        .map(|r| r.rem_euclid(360))
        .unwrap_or(0)
}

/// Parse a box array [x1, y1, x2, y2]
fn parse_box_array(array: &[Object]) -> Option<[f64; 4]> {
    if array.len() != 4 {
        return None;
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = number(obj)?;
    }

    let [x1, y1, x2, y2] = result;
    let normalized = [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)];
    if normalized[2] - normalized[0] <= 0.0 || normalized[3] - normalized[1] <= 0.0 {
        return None;
    }
    Some(normalized)
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(*n as f64),
        _ => None,
    }
}

/// Page dictionary for a page id
pub(crate) fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, SignPdfError> {
    doc.get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| SignPdfError::ParseError(format!("Page object {:?}: {}", page_id, e)))
}

/// Extract PDF version from header
fn extract_version(bytes: &[u8]) -> String {
    // Header format: %PDF-1.7
    if bytes.len() >= 8 && bytes.starts_with(b"%PDF-") {
        if let Ok(version) = std::str::from_utf8(&bytes[5..8]) {
            return version.trim().to_string();
        }
    }
    "1.4".to_string()
}

/// Header and trailer check without a full parse
pub fn quick_validate(bytes: &[u8]) -> Result<(), SignPdfError> {
    if bytes.len() < 8 {
        return Err(SignPdfError::ParseError(
            "File too small to be a valid PDF".to_string(),
        ));
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(SignPdfError::ParseError(
            "Not a valid PDF file (missing %PDF- header)".to_string(),
        ));
    }

    let tail = if bytes.len() > 1024 {
        &bytes[bytes.len() - 1024..]
    } else {
        bytes
    };
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(SignPdfError::ParseError(
            "PDF appears truncated (missing %%EOF marker)".to_string(),
        ));
    }

    Ok(())
}
