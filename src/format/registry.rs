//! Format registry for discovering and accessing annotation formats.

use std::collections::HashMap;
use std::path::Path;

use crate::format::error::FormatError;
use crate::format::formats::{JsonFormat, TextFormat};
use crate::format::traits::AnnotationFormat;

/// Registry of available annotation formats.
///
/// All built-in formats are registered automatically on creation.
pub struct FormatRegistry {
    formats: HashMap<&'static str, Box<dyn AnnotationFormat>>,
}

impl FormatRegistry {
    /// Create a new registry with all built-in formats registered.
    pub fn new() -> Self {
        let mut registry = Self {
            formats: HashMap::new(),
        };

        registry.register(Box::new(TextFormat));
        registry.register(Box::new(JsonFormat));

        registry
    }

    /// Register a format implementation.
    pub fn register(&mut self, format: Box<dyn AnnotationFormat>) {
        self.formats.insert(format.id(), format);
    }

    /// Get a format by its ID.
    pub fn get(&self, id: &str) -> Result<&dyn AnnotationFormat, FormatError> {
        self.formats
            .get(id)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::UnknownFormat(id.to_string()))
    }

    /// Find the format for a file path by its extension.
    pub fn for_path(&self, path: &Path) -> Result<&dyn AnnotationFormat, FormatError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| FormatError::UnknownFormat(format!("{:?}", path)))?;
        self.formats
            .values()
            .find(|f| f.extensions().contains(&ext.as_str()))
            .map(|f| f.as_ref())
            .ok_or(FormatError::UnknownFormat(ext))
    }

    /// Get all format IDs.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.formats.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
