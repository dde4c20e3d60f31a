//! Round-trip conversion tests between formats.
//!
//! The text format keeps geometry and labels but not ids, colors or image
//! size; the JSON format keeps everything.

use super::create_sample_document;
use crate::format::formats::{JsonFormat, TextFormat};
use crate::format::traits::AnnotationFormat;

#[test]
fn test_text_keeps_geometry_and_labels() {
    let original = create_sample_document();
    let back = TextFormat
        .import(&TextFormat.export(&original).unwrap())
        .unwrap();

    assert_eq!(back.annotations.len(), original.annotations.len());
    for (a, b) in original.annotations.iter().zip(&back.annotations) {
        assert_eq!(a.shape, b.shape);
        assert_eq!(a.label, b.label);
        assert_eq!(b.id, 0);
        assert_eq!(b.color, None);
    }
}

#[test]
fn test_text_to_json_to_text_is_stable() {
    let text = TextFormat.export(&create_sample_document()).unwrap();
    let via_json = JsonFormat
        .import(&JsonFormat.export(&TextFormat.import(&text).unwrap()).unwrap())
        .unwrap();
    assert_eq!(TextFormat.export(&via_json).unwrap(), text);
}

#[test]
fn test_float_precision_survives_text() {
    let mut doc = create_sample_document();
    if let crate::format::document::ShapeEntry::Box { x1, .. } = &mut doc.annotations[0].shape {
        *x1 = 0.1 + 0.2;
    }
    let back = TextFormat.import(&TextFormat.export(&doc).unwrap()).unwrap();
    assert_eq!(back.annotations[0].shape, doc.annotations[0].shape);
}
