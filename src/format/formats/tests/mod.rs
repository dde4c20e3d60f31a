//! Unit tests for annotation format implementations.
//!
//! These tests verify the correctness of format serialization, parsing,
//! and round-trip conversions.

mod json_tests;
mod roundtrip_tests;
mod text_tests;

use crate::format::document::{AnnotationDocument, AnnotationEntry, ShapeEntry};

/// A document with one labeled box and one unlabeled stroke.
pub(super) fn create_sample_document() -> AnnotationDocument {
    let mut doc = AnnotationDocument::new(100, 100);
    let mut cat = AnnotationEntry::new(ShapeEntry::Box {
        x1: 10.0,
        y1: 10.0,
        x2: 40.0,
        y2: 40.0,
    })
    .with_label("cat");
    cat.id = 1;
    cat.color = Some("#ff0000".to_string());
    doc.annotations.push(cat);

    let mut stroke = AnnotationEntry::new(ShapeEntry::Stroke {
        points: vec![[0.0, 0.0], [5.0, 5.0], [10.0, 0.0]],
    });
    stroke.id = 2;
    stroke.color = Some("#0000ff".to_string());
    doc.annotations.push(stroke);
    doc
}
