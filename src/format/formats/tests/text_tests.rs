//! Tests for the line-based text format.

use super::create_sample_document;
use crate::format::document::ShapeEntry;
use crate::format::error::FormatError;
use crate::format::formats::TextFormat;
use crate::format::traits::AnnotationFormat;

#[test]
fn test_export_layout() {
    let text = TextFormat.export(&create_sample_document()).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines,
        vec![
            "# annomark annotations v1",
            "box \"cat\" 10 10 40 40",
            "stroke \"\" 3 0 0 5 5 10 0",
        ]
    );
}

#[test]
fn test_export_empty_document_is_header_only() {
    let doc = crate::format::document::AnnotationDocument::new(10, 10);
    let text = TextFormat.export(&doc).unwrap();
    assert_eq!(text, "# annomark annotations v1\n");
}

#[test]
fn test_labels_with_spaces_and_quotes() {
    let mut doc = create_sample_document();
    doc.annotations[0].label = Some("big \"fat\" cat".to_string());

    let text = TextFormat.export(&doc).unwrap();
    let back = TextFormat.import(&text).unwrap();
    assert_eq!(back.annotations[0].label.as_deref(), Some("big \"fat\" cat"));
}

#[test]
fn test_import_fractional_and_negative_coordinates() {
    let text = "# annomark annotations v1\nbox \"x\" -1.5 2.25 3 4\n";
    let doc = TextFormat.import(text).unwrap();
    assert_eq!(
        doc.annotations[0].shape,
        ShapeEntry::Box {
            x1: -1.5,
            y1: 2.25,
            x2: 3.0,
            y2: 4.0
        }
    );
}

#[test]
fn test_import_skips_blank_lines() {
    let text = "# annomark annotations v1\n\nbox \"a\" 0 0 1 1\n\n";
    assert_eq!(TextFormat.import(text).unwrap().annotations.len(), 1);
}

#[test]
fn test_rejects_missing_header() {
    let err = TextFormat.import("box \"a\" 0 0 1 1\n").unwrap_err();
    assert!(matches!(err, FormatError::Parse { line: 1, .. }));
}

#[test]
fn test_rejects_other_version() {
    let err = TextFormat.import("# annomark annotations v2\n").unwrap_err();
    assert!(matches!(err, FormatError::VersionMismatch { .. }));
}

#[test]
fn test_reports_bad_line_number() {
    let text = "# annomark annotations v1\nbox \"a\" 0 0 1 1\nbox \"b\" 0 0 1\n";
    let err = TextFormat.import(text).unwrap_err();
    assert!(matches!(err, FormatError::Parse { line: 3, .. }));
}

#[test]
fn test_rejects_bad_stroke_count() {
    let text = "# annomark annotations v1\nstroke \"\" 3 0 0 1 1\n";
    assert!(TextFormat.import(text).is_err());
}

#[test]
fn test_rejects_huge_or_fractional_stroke_count() {
    for count in ["1e30", "1.9", "-1", "18446744073709551615"] {
        let text = format!("# annomark annotations v1\nstroke \"\" {} 0 0\n", count);
        let err = TextFormat.import(&text).unwrap_err();
        assert!(
            matches!(err, FormatError::Parse { line: 2, .. }),
            "count {} gave {:?}",
            count,
            err
        );
    }
}

#[test]
fn test_single_point_stroke() {
    let back = TextFormat
        .import("# annomark annotations v1\nstroke \"\" 1 2 3\n")
        .unwrap();
    assert_eq!(
        back.annotations[0].shape,
        ShapeEntry::Stroke {
            points: vec![[2.0, 3.0]]
        }
    );
}

#[test]
fn test_rejects_unknown_kind_and_non_numbers() {
    assert!(TextFormat.import("# annomark annotations v1\ncircle \"\" 1 2 3\n").is_err());
    assert!(TextFormat.import("# annomark annotations v1\nbox \"\" 1 2 x 4\n").is_err());
    assert!(TextFormat.import("# annomark annotations v1\nbox \"\" 1 2 inf 4\n").is_err());
    assert!(TextFormat.import("# annomark annotations v1\nbox unquoted 1 2 3 4\n").is_err());
}
