//! JSON annotation format.
//!
//! Full-fidelity format: geometry, labels and colors of every annotation,
//! plus the source image size, as a pretty-printed [`AnnotationDocument`].

use crate::format::document::AnnotationDocument;
use crate::format::error::FormatError;
use crate::format::traits::AnnotationFormat;

/// Versioned JSON document format.
pub struct JsonFormat;

impl AnnotationFormat for JsonFormat {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "Annotations (JSON)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn export(&self, doc: &AnnotationDocument) -> Result<String, FormatError> {
        let json = serde_json::to_string_pretty(doc)?;
        log::info!("Exported {} annotations as JSON", doc.annotations.len());
        Ok(json)
    }

    fn import(&self, text: &str) -> Result<AnnotationDocument, FormatError> {
        let doc: AnnotationDocument = serde_json::from_str(text)?;

        // Validate version compatibility
        if !AnnotationDocument::is_version_readable(&doc.version) {
            return Err(FormatError::VersionMismatch {
                expected: AnnotationDocument::CURRENT_VERSION.to_string(),
                found: doc.version.clone(),
            });
        }

        if !AnnotationDocument::is_version_compatible(&doc.version) {
            log::warn!(
                "Annotation file version {} is newer than {}, unknown fields are ignored",
                doc.version,
                AnnotationDocument::CURRENT_VERSION
            );
        }

        for (index, entry) in doc.annotations.iter().enumerate() {
            let points = entry.shape.points();
            if points.is_empty() {
                return Err(FormatError::invalid_format(format!(
                    "annotation {} has no points",
                    index
                )));
            }
            if points.iter().any(|p| !p.is_finite()) {
                return Err(FormatError::invalid_format(format!(
                    "annotation {} has non-finite coordinates",
                    index
                )));
            }
        }

        log::info!(
            "Imported {} annotations (format version {})",
            doc.annotations.len(),
            doc.version
        );

        Ok(doc)
    }
}
