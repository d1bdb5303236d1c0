//! End-to-end editor flows: load, place, duplicate, export
//!
//! Run with: cargo test -p pdfsign-core --test editor_flow -- --nocapture

mod common;

use chrono::NaiveDate;
use common::{create_synthetic_pdf, first_cm, half_transparent_png, init_tracing, overlay_operations};
use lopdf::{Document, Object};
use pdfsign_core::{Direction, EditorConfig, EditorSession, SignPdfError, SignaturePad, Zoom};
use pretty_assertions::assert_eq;

fn timestamp() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 30)
        .unwrap()
        .and_hms_opt(23, 59, 1)
        .unwrap()
}

fn loaded_session(pages: u32) -> EditorSession {
    init_tracing();
    let mut session = EditorSession::new(EditorConfig::default());
    session
        .load_document(
            "lease agreement.pdf",
            create_synthetic_pdf(pages, (10, 20), (600, 800)),
        )
        .unwrap();
    session
}

fn image_stream_count(doc: &Document) -> usize {
    doc.objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| matches!(s.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image"))
        .count()
}

#[test]
fn sign_every_page_and_export() {
    let mut session = loaded_session(3);
    let source = Document::load_mem(session.document().unwrap().bytes()).unwrap();

    let id = session
        .save_uploaded_signature("image/png", half_transparent_png(8, 4))
        .unwrap();
    assert!(session.drop_at(id, 50.0, 50.0));
    assert!(session.resize(id, 1.5, true));
    let copies = session.duplicate_to_all_pages(id);
    assert_eq!(copies.len(), 2);

    let exported = session.export_at(timestamp()).unwrap();
    assert_eq!(exported.file_name, "lease agreement-20250630235901.pdf");

    let doc = Document::load_mem(&exported.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 3);

    for page in 1..=3 {
        // x = 10 + 50, y = 20 + 800 - 75 - 50
        assert_eq!(
            first_cm(&overlay_operations(&doc, page)),
            vec![150.0, 0.0, 0.0, 75.0, 60.0, 695.0]
        );
    }

    // One image plus its soft mask, shared by all three pages
    assert_eq!(image_stream_count(&doc), 2);

    for (page_num, page_id) in source.get_pages() {
        let before = source
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_reference().unwrap())
            .collect::<Vec<_>>();
        let after_page = doc.get_dictionary(doc.get_pages()[&page_num]).unwrap();
        let after: Vec<_> = after_page
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_reference().unwrap())
            .collect();

        assert_eq!(after.len(), before.len() + 2);
        assert_eq!(&after[1..after.len() - 1], before.as_slice());
        for &id in &before {
            assert_eq!(
                doc.get_object(id).unwrap().as_stream().unwrap().content,
                source.get_object(id).unwrap().as_stream().unwrap().content
            );
        }

        let resources = after_page.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.has(b"Font"));
        assert!(resources.get(b"XObject").unwrap().as_dict().unwrap().has(b"Sig1"));
    }
}

#[test]
fn untouched_pages_keep_their_contents() {
    let mut session = loaded_session(2);
    let source = Document::load_mem(session.document().unwrap().bytes()).unwrap();

    let id = session
        .save_uploaded_signature("image/png", half_transparent_png(8, 4))
        .unwrap();
    let copy = session.duplicate_to_page(id, 2).unwrap();
    assert!(session.select(copy));
    assert!(session.delete(copy));
    assert_eq!(session.selected(), None);

    let exported = session.export_at(timestamp()).unwrap();
    let doc = Document::load_mem(&exported.bytes).unwrap();

    let page_two = |d: &Document| -> Vec<lopdf::ObjectId> {
        d.get_dictionary(d.get_pages()[&2])
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_reference().unwrap())
            .collect()
    };
    assert_eq!(page_two(&doc), page_two(&source));
}

#[test]
fn display_scale_maps_pixels_to_points() {
    let mut session = loaded_session(1);
    // 600pt page rendered 300px wide
    assert!(session.set_display_width(1, 300.0));

    let id = session
        .save_uploaded_signature("image/png", half_transparent_png(8, 4))
        .unwrap();
    assert!(session.drop_at(id, 25.0, 40.0));

    let exported = session.export_at(timestamp()).unwrap();
    let doc = Document::load_mem(&exported.bytes).unwrap();
    // 100x50 px -> 200x100 pt; y = 20 + 800 - 100 - 80
    assert_eq!(
        first_cm(&overlay_operations(&doc, 1)),
        vec![200.0, 0.0, 0.0, 100.0, 60.0, 640.0]
    );
}

#[test]
fn keyboard_editing_then_export() {
    let mut session = loaded_session(1);
    let id = session
        .save_uploaded_signature("image/png", half_transparent_png(8, 4))
        .unwrap();

    for _ in 0..4 {
        assert!(session.nudge(Direction::Right));
    }
    assert!(session.nudge(Direction::Down));
    assert!(session.apply_preset(id, "lg"));
    assert!(session.zoom_selected(Zoom::Out));

    let rect = session.placements().get(id).unwrap().rect;
    assert_eq!((rect.x, rect.y), (20.0, 5.0));
    assert!((rect.width - 180.0).abs() < 1e-9);
    assert!((rect.height - 90.0).abs() < 1e-9);

    let exported = session.export_at(timestamp()).unwrap();
    let cm = first_cm(&overlay_operations(
        &Document::load_mem(&exported.bytes).unwrap(),
        1,
    ));
    assert_eq!(cm[4], 30.0);
    assert_eq!(cm[5], 20.0 + 800.0 - 90.0 - 5.0);
}

#[test]
fn drawn_signature_round_trip() {
    let mut session = loaded_session(1);
    let mut pad = SignaturePad::new(&session.config().pad);

    let err = session.save_drawn_signature(&pad).unwrap_err();
    assert!(matches!(err, SignPdfError::EmptySignature));

    pad.begin_stroke(20.0, 150.0);
    for step in 1..=40 {
        let x = 20.0 + step as f64 * 10.0;
        let y = 150.0 - (step as f64 / 4.0).sin() * 60.0;
        pad.extend_stroke(x, y);
    }
    pad.end_stroke();

    session.save_drawn_signature(&pad).unwrap();
    let exported = session.export_at(timestamp()).unwrap();
    let doc = Document::load_mem(&exported.bytes).unwrap();
    assert_eq!(image_stream_count(&doc), 2);
}

#[test]
fn config_from_toml_drives_session() {
    init_tracing();
    let config = EditorConfig::from_toml_str(
        r##"
            default_width = 240.0
            nudge_step = 1.0
            label_prefix = "initials"
            file_timestamp_format = "%Y%m%d"
        "##,
    )
    .unwrap();

    let mut session = EditorSession::new(config);
    session
        .load_document("deed.PDF", create_synthetic_pdf(1, (0, 0), (612, 792)))
        .unwrap();
    let id = session
        .save_uploaded_signature("image/png", half_transparent_png(8, 4))
        .unwrap();
    session.nudge(Direction::Left);

    let placement = session.placements().get(id).unwrap();
    assert_eq!(placement.name, "initials 1");
    assert_eq!(placement.rect.width, 240.0);
    assert_eq!(placement.rect.x, -1.0);

    let exported = session.export_at(timestamp()).unwrap();
    assert_eq!(exported.file_name, "deed-20250630.pdf");
}
