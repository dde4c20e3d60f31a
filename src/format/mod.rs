//! Annotation export/import.
//!
//! Each format converts between an [`AnnotationDocument`] and text, and is
//! looked up through the [`FormatRegistry`] by id or file extension.
//!
//! ## Supported Formats
//!
//! - **text**: versioned, line-based, human-readable (`.txt`)
//! - **json**: versioned JSON document with colors and image size (`.json`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use annomark::format::{AnnotationDocument, FormatRegistry};
//!
//! let registry = FormatRegistry::new();
//! let doc = AnnotationDocument::from_store(&store, width, height);
//! let text = registry.get("text")?.export(&doc)?;
//! ```

mod document;
mod error;
pub mod formats;
mod registry;
mod traits;

pub use document::{AnnotationDocument, AnnotationEntry, ImageInfo, ShapeEntry};
pub use error::FormatError;
pub use registry::FormatRegistry;
pub use traits::AnnotationFormat;
