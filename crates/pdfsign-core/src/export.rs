//! Embed signature placements into a PDF
//!
//! Export always starts from a fresh parse of the original bytes. Each page
//! that carries placements gets its original content wrapped in `q`/`Q` and
//! an overlay stream appended that draws the image XObjects.

use crate::coords::{PageFrame, PdfRect};
use crate::document::{inherited_attribute, page_dict, page_media_box, resolve};
use crate::error::SignPdfError;
use crate::placement::Placement;
use crate::signature::{jpeg_header, ImageFormat, SignatureImage};
use chrono::NaiveDateTime;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::ExtendedColorType;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use tracing::{debug, info, warn};

const FALLBACK_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Per-export settings
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Rendered width in pixels for pages shown at a scale other than one
    /// pixel per point. Pages not listed are unscaled.
    pub display_widths: BTreeMap<u32, f64>,
}

impl ExportOptions {
    fn frame_for(&self, page_num: u32, media_box: [f64; 4]) -> PageFrame {
        match self.display_widths.get(&page_num) {
            Some(width) => PageFrame::for_display_width(media_box, *width),
            None => PageFrame::unscaled(media_box),
        }
    }
}

/// Produce a new PDF with every placement drawn on its page.
///
/// With no placements the source bytes are returned unchanged. Any failure
/// aborts the whole export with [`SignPdfError::ExportFailed`].
pub fn export_pdf(
    source: &[u8],
    placements: &[Placement],
    options: &ExportOptions,
) -> Result<Vec<u8>, SignPdfError> {
    if placements.is_empty() {
        // No changes, return original
        return Ok(source.to_vec());
    }

    match embed_placements(source, placements, options) {
        Ok(output) => {
            info!(
                placements = placements.len(),
                input_bytes = source.len(),
                output_bytes = output.len(),
                "export finished"
            );
            Ok(output)
        }
        Err(e) => {
            warn!(error = %e, "export failed");
            Err(SignPdfError::ExportFailed(e.to_string()))
        }
    }
}

fn embed_placements(
    source: &[u8],
    placements: &[Placement],
    options: &ExportOptions,
) -> Result<Vec<u8>, SignPdfError> {
    let mut doc =
        Document::load_mem(source).map_err(|e| SignPdfError::ParseError(e.to_string()))?;
    let pages = doc.get_pages();

    let mut by_page: BTreeMap<u32, Vec<&Placement>> = BTreeMap::new();
    for placement in placements {
        by_page.entry(placement.page).or_default().push(placement);
    }

    let mut embedded: HashMap<[u8; 32], ObjectId> = HashMap::new();

    for (page_num, page_placements) in by_page {
        let page_id = *pages.get(&page_num).ok_or_else(|| {
            SignPdfError::ParseError(format!(
                "placement on page {} but document has {} pages",
                page_num,
                pages.len()
            ))
        })?;
        let frame = options.frame_for(page_num, page_media_box(&doc, page_id));
        materialize_resources(&mut doc, page_id)?;

        let mut operations = Vec::new();
        for placement in page_placements {
            let image = placement.source.as_ref();
            let image_id = match embedded.get(image.digest()) {
                Some(id) => *id,
                None => {
                    let id = embed_image(&mut doc, image)?;
                    embedded.insert(*image.digest(), id);
                    id
                }
            };

            let name = register_xobject(&mut doc, page_id, image_id)?;
            let rect = placement.rect.to_pdf(&frame);
            debug!(id = placement.id, page = page_num, ?rect, %name, "drawing placement");
            operations.extend(draw_image(&name, &rect));
        }

        wrap_page_content(&mut doc, page_id, operations)?;
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| SignPdfError::ExportFailed(e.to_string()))?;
    Ok(output)
}

/// `q`, `cm [w 0 0 h x y]`, `/Name Do`, `Q`
fn draw_image(name: &str, rect: &PdfRect) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Real(rect.width as f32),
                0.into(),
                0.into(),
                Object::Real(rect.height as f32),
                Object::Real(rect.x as f32),
                Object::Real(rect.y as f32),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Write the image as an XObject and return its id
fn embed_image(doc: &mut Document, image: &SignatureImage) -> Result<ObjectId, SignPdfError> {
    let stream = match image.format() {
        ImageFormat::Png => png_image_stream(doc, image.bytes())?,
        ImageFormat::Jpeg => jpeg_image_stream(image.bytes())?,
    };
    Ok(doc.add_object(stream))
}

fn png_image_stream(doc: &mut Document, bytes: &[u8]) -> Result<Stream, SignPdfError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| SignPdfError::InvalidImage(format!("PNG: {}", e)))?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buffer)
        .map_err(|e| SignPdfError::InvalidImage(format!("PNG: {}", e)))?;
    let data = &buffer[..frame.buffer_size()];

    let (color_space, samples, alpha) = match frame.color_type {
        png::ColorType::Grayscale => ("DeviceGray", data.to_vec(), None),
        png::ColorType::Rgb => ("DeviceRGB", data.to_vec(), None),
        png::ColorType::GrayscaleAlpha => {
            let (gray, alpha) = split_alpha(data, 1);
            ("DeviceGray", gray, Some(alpha))
        }
        png::ColorType::Rgba => {
            let (rgb, alpha) = split_alpha(data, 3);
            ("DeviceRGB", rgb, Some(alpha))
        }
        png::ColorType::Indexed => {
            return Err(SignPdfError::InvalidImage(
                "PNG palette was not expanded".to_string(),
            ))
        }
    };

    let mut dict = image_dictionary(frame.width, frame.height, color_space, "FlateDecode");
    // Fully opaque images need no soft mask
    if let Some(alpha) = alpha.filter(|a| a.iter().any(|&v| v != 255)) {
        let mask = Stream::new(
            image_dictionary(frame.width, frame.height, "DeviceGray", "FlateDecode"),
            deflate(&alpha)?,
        )
        .with_compression(false);
        let mask_id = doc.add_object(mask);
        dict.set("SMask", mask_id);
    }

    Ok(Stream::new(dict, deflate(&samples)?).with_compression(false))
}

fn jpeg_image_stream(bytes: &[u8]) -> Result<Stream, SignPdfError> {
    let header = jpeg_header(bytes)?;
    let (width, height) = header.dimensions;

    let color_space = match header.color_type {
        ExtendedColorType::L8 | ExtendedColorType::L16 => "DeviceGray",
        ExtendedColorType::Cmyk8 => "DeviceCMYK",
        _ => "DeviceRGB",
    };
    let mut dict = image_dictionary(width, height, color_space, "DCTDecode");
    if color_space == "DeviceCMYK" {
        // Adobe CMYK JPEGs are stored inverted
        dict.set(
            "Decode",
            [1, 0, 1, 0, 1, 0, 1, 0]
                .into_iter()
                .map(Object::Integer)
                .collect::<Vec<_>>(),
        );
    }

    Ok(Stream::new(dict, bytes.to_vec()).with_compression(false))
}

fn image_dictionary(width: u32, height: u32, color_space: &str, filter: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => filter,
    }
}

/// Separate interleaved samples into colour and alpha planes
fn split_alpha(data: &[u8], color_channels: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = color_channels + 1;
    let pixels = data.len() / stride;
    let mut color = Vec::with_capacity(pixels * color_channels);
    let mut alpha = Vec::with_capacity(pixels);
    for px in data.chunks_exact(stride) {
        color.extend_from_slice(&px[..color_channels]);
        alpha.push(px[color_channels]);
    }
    (color, alpha)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, SignPdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Give the page its own `/Resources` dictionary with an inline `/XObject`
/// table, copying anything it inherited or referenced.
fn materialize_resources(doc: &mut Document, page_id: ObjectId) -> Result<(), SignPdfError> {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let xobjects = resources
        .get(b"XObject")
        .ok()
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    resources.set("XObject", xobjects);

    page_dict_mut(doc, page_id)?.set("Resources", resources);
    Ok(())
}

/// Add the image to the page's XObject table, reusing an existing entry
/// for the same object. Returns the resource name.
fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    image_id: ObjectId,
) -> Result<String, SignPdfError> {
    let page = page_dict_mut(doc, page_id)?;
    let xobjects = page
        .get_mut(b"Resources")
        .and_then(|r| r.as_dict_mut())
        .and_then(|r| r.get_mut(b"XObject"))
        .and_then(|x| x.as_dict_mut())
        .map_err(|e| SignPdfError::ParseError(format!("page resources: {}", e)))?;

    let existing = xobjects
        .iter()
        .find(|(_, value)| matches!(value, Object::Reference(id) if *id == image_id))
        .map(|(name, _)| String::from_utf8_lossy(name).into_owned());
    if let Some(name) = existing {
        return Ok(name);
    }

    let name = (1..)
        .map(|n| format!("Sig{}", n))
        .find(|name| !xobjects.has(name.as_bytes()))
        .unwrap_or_else(|| "Sig".to_string());
    xobjects.set(name.clone(), image_id);
    Ok(name)
}

/// Replace `/Contents` with `[q, original..., Q + overlay]`. The original
/// streams are referenced, not rewritten.
fn wrap_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    overlay: Vec<Operation>,
) -> Result<(), SignPdfError> {
    let current = page_dict(doc, page_id)?.get(b"Contents").ok().cloned();
    let original = match current {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(items)) => items,
        Some(Object::Stream(stream)) => vec![Object::Reference(doc.add_object(stream))],
        _ => Vec::new(),
    };

    let mut operations = vec![Operation::new("Q", vec![])];
    operations.extend(overlay);
    let overlay_bytes = Content { operations }
        .encode()
        .map_err(|e| SignPdfError::ParseError(format!("content stream: {}", e)))?;

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay_bytes));

    let mut contents = Vec::with_capacity(original.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(original);
    contents.push(Object::Reference(overlay_id));

    page_dict_mut(doc, page_id)?.set("Contents", contents);
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, SignPdfError> {
    doc.get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| SignPdfError::ParseError(format!("Page object {:?}: {}", page_id, e)))
}

/// `<name without .pdf>-<timestamp>.pdf`
pub fn output_file_name(original: &str, timestamp: NaiveDateTime, format: &str) -> String {
    let trimmed = original.trim();
    let stem = trimmed
        .len()
        .checked_sub(4)
        .and_then(|cut| trimmed.get(cut..).map(|ext| (cut, ext)))
        .filter(|(_, ext)| ext.eq_ignore_ascii_case(".pdf"))
        .map(|(cut, _)| &trimmed[..cut])
        .unwrap_or(trimmed);
    let stem = if stem.is_empty() { "document" } else { stem };

    let mut stamp = String::new();
    if write!(stamp, "{}", timestamp.format(format)).is_err() {
        stamp.clear();
        let _ = write!(stamp, "{}", timestamp.format(FALLBACK_TIMESTAMP_FORMAT));
    }

    format!("{}-{}.pdf", stem, stamp)
}
