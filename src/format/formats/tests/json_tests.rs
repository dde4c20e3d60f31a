//! Tests for the JSON format.

use super::create_sample_document;
use crate::format::document::AnnotationDocument;
use crate::format::error::FormatError;
use crate::format::formats::JsonFormat;
use crate::format::traits::AnnotationFormat;

#[test]
fn test_export_structure() {
    let json = JsonFormat.export(&create_sample_document()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["version"], AnnotationDocument::CURRENT_VERSION);
    assert_eq!(value["image"]["width"], 100);
    assert_eq!(value["annotations"][0]["kind"], "box");
    assert_eq!(value["annotations"][0]["label"], "cat");
    assert_eq!(value["annotations"][0]["x2"], 40.0);
    assert_eq!(value["annotations"][1]["kind"], "stroke");
    assert!(value["annotations"][1].get("label").is_none());
    assert_eq!(value["annotations"][1]["points"][1][0], 5.0);
}

#[test]
fn test_import_full_document() {
    let json = JsonFormat.export(&create_sample_document()).unwrap();
    let doc = JsonFormat.import(&json).unwrap();
    assert_eq!(doc, create_sample_document());
}

#[test]
fn test_import_minimal_entry() {
    let json = r#"{
        "version": "1.0.0",
        "image": {"width": 5, "height": 5},
        "annotations": [{"kind": "stroke", "points": [[1, 2]]}]
    }"#;
    let doc = JsonFormat.import(json).unwrap();
    assert_eq!(doc.annotations.len(), 1);
    assert_eq!(doc.annotations[0].label, None);
    assert_eq!(doc.annotations[0].parsed_color(), None);
}

#[test]
fn test_rejects_incompatible_version() {
    let json = r#"{"version": "2.0.0", "image": {"width": 1, "height": 1}, "annotations": []}"#;
    let err = JsonFormat.import(json).unwrap_err();
    assert!(matches!(err, FormatError::VersionMismatch { .. }));
}

#[test]
fn test_accepts_newer_minor_version() {
    let json = r#"{"version": "1.4.0", "image": {"width": 1, "height": 1}, "annotations": []}"#;
    assert!(JsonFormat.import(json).is_ok());
}

#[test]
fn test_rejects_empty_stroke() {
    let json = r#"{
        "version": "1.0.0",
        "image": {"width": 5, "height": 5},
        "annotations": [{"kind": "stroke", "points": []}]
    }"#;
    assert!(matches!(
        JsonFormat.import(json).unwrap_err(),
        FormatError::InvalidFormat { .. }
    ));
}

#[test]
fn test_rejects_malformed_json() {
    assert!(matches!(
        JsonFormat.import("{not json").unwrap_err(),
        FormatError::Json(_)
    ));
}
