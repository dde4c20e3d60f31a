//! Trait definitions for annotation format implementations.

use crate::format::document::AnnotationDocument;
use crate::format::error::FormatError;

/// Trait for annotation format export/import implementations.
///
/// Each format converts between [`AnnotationDocument`] and its own text
/// representation. Formats never touch the filesystem; the session does.
pub trait AnnotationFormat: Send + Sync {
    /// Unique identifier for this format (e.g., "text", "json").
    fn id(&self) -> &'static str;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// File extensions this format uses, without the leading dot.
    fn extensions(&self) -> &[&'static str];

    /// Render a document.
    fn export(&self, doc: &AnnotationDocument) -> Result<String, FormatError>;

    /// Parse a document previously written by [`AnnotationFormat::export`].
    fn import(&self, text: &str) -> Result<AnnotationDocument, FormatError>;
}
