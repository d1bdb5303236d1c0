//! Shared helpers for integration tests

#![allow(dead_code)]

use lopdf::{content::Content, content::Operation, dictionary, Document, Object, Stream};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route tracing output through the test harness
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Create a synthetic PDF. Each page owns a referenced Resources dictionary
/// and the media box starts at `origin` rather than 0,0.
pub fn create_synthetic_pdf(num_pages: u32, origin: (i64, i64), size: (i64, i64)) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });

    let mut page_ids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                // Leaves a scaled CTM behind on purpose
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(2),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(2),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(40), Object::Integer(300)]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Agreement page {}", i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));

        let (x, y) = origin;
        let (w, h) = size;
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![x.into(), y.into(), (x + w).into(), (y + h).into()],
            "Resources" => Object::Reference(resources_id),
            "Contents" => Object::Array(vec![Object::Reference(content_id)]),
        });
        page_ids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => num_pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save synthetic pdf");
    buffer
}

/// A tiny RGBA PNG with a transparent left half
pub fn half_transparent_png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("png header");
        let data: Vec<u8> = (0..width * height)
            .flat_map(|i| {
                let alpha = if i % width < width / 2 { 0 } else { 255 };
                [0, 0, 0, alpha]
            })
            .collect();
        writer.write_image_data(&data).expect("png data");
    }
    out
}

/// Operations of the last content stream on a page
pub fn overlay_operations(doc: &Document, page_num: u32) -> Vec<Operation> {
    let page_id = doc.get_pages()[&page_num];
    let contents = doc
        .get_dictionary(page_id)
        .expect("page dict")
        .get(b"Contents")
        .expect("contents")
        .as_array()
        .expect("contents array");
    let last = contents
        .last()
        .expect("overlay stream")
        .as_reference()
        .expect("reference");
    let stream = doc.get_object(last).expect("object").as_stream().expect("stream");
    Content::decode(&stream.content).expect("decode").operations
}

/// Operand values of the first `cm` after the leading `Q`
pub fn first_cm(ops: &[Operation]) -> Vec<f32> {
    ops.iter()
        .find(|op| op.operator == "cm")
        .expect("cm operator")
        .operands
        .iter()
        .map(|o| o.as_float().expect("number"))
        .collect()
}
