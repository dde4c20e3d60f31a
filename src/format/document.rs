//! Format-neutral annotation document.
//!
//! Every format converts to and from [`AnnotationDocument`], which mirrors
//! the annotation store in insertion order plus the source image size.
//!
//! # Versioning
//!
//! The document uses semantic versioning (MAJOR.MINOR.PATCH). Files with the
//! same major version are readable; newer minor versions are read with a
//! warning.

use serde::{Deserialize, Serialize};

use crate::model::{Annotation, AnnotationStore, Color, Point};

/// Annotations of one image, ready to be written by a format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    /// Format version for compatibility checking.
    pub version: String,

    /// Size of the source image the coordinates refer to.
    pub image: ImageInfo,

    /// Annotations in insertion order.
    pub annotations: Vec<AnnotationEntry>,
}

impl AnnotationDocument {
    /// Current version of the document format.
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    /// Major version number for compatibility checking.
    pub const VERSION_MAJOR: u32 = 1;

    /// Minor version number.
    pub const VERSION_MINOR: u32 = 0;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
            image: ImageInfo { width, height },
            annotations: Vec::new(),
        }
    }

    /// Snapshot a store.
    pub fn from_store(store: &AnnotationStore, width: u32, height: u32) -> Self {
        let mut doc = Self::new(width, height);
        doc.annotations = store.iter().map(AnnotationEntry::from_annotation).collect();
        doc
    }

    /// Parse a version string into (major, minor, patch) components.
    pub fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
        let mut parts = version.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((major, minor, patch))
    }

    /// Same major version: readable.
    pub fn is_version_readable(file_version: &str) -> bool {
        matches!(Self::parse_version(file_version), Some((major, _, _)) if major == Self::VERSION_MAJOR)
    }

    /// Readable and not from a newer minor version.
    pub fn is_version_compatible(file_version: &str) -> bool {
        matches!(
            Self::parse_version(file_version),
            Some((major, minor, _)) if major == Self::VERSION_MAJOR && minor <= Self::VERSION_MINOR
        )
    }
}

/// Source image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// One annotation in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    /// Id in the exporting session; informational only, imports get fresh ids.
    #[serde(default)]
    pub id: u64,

    /// Label text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Outline/stroke color as `#rrggbb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// The geometry.
    #[serde(flatten)]
    pub shape: ShapeEntry,
}

impl AnnotationEntry {
    pub fn new(shape: ShapeEntry) -> Self {
        Self {
            id: 0,
            label: None,
            color: None,
            shape,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Create from an internal annotation.
    pub fn from_annotation(annotation: &Annotation) -> Self {
        let shape = match annotation {
            Annotation::Box(b) => ShapeEntry::Box {
                x1: b.corner1.x,
                y1: b.corner1.y,
                x2: b.corner2.x,
                y2: b.corner2.y,
            },
            Annotation::Stroke(s) => ShapeEntry::Stroke {
                points: s.points.iter().map(|p| [p.x, p.y]).collect(),
            },
        };
        Self {
            id: annotation.id().get(),
            label: annotation.label().map(str::to_string),
            color: Some(annotation.color().to_hex()),
            shape,
        }
    }

    /// Parsed color, if present and valid.
    pub fn parsed_color(&self) -> Option<Color> {
        self.color.as_deref().and_then(Color::from_hex)
    }
}

/// Geometry of an entry, in image-space coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeEntry {
    /// Box by its anchor corner and dragged corner.
    Box { x1: f32, y1: f32, x2: f32, y2: f32 },

    /// Stroke by its points in drawing order.
    Stroke { points: Vec<[f32; 2]> },
}

impl ShapeEntry {
    /// Geometry points, in order.
    pub fn points(&self) -> Vec<Point> {
        match self {
            ShapeEntry::Box { x1, y1, x2, y2 } => vec![Point::new(*x1, *y1), Point::new(*x2, *y2)],
            ShapeEntry::Stroke { points } => points.iter().map(|[x, y]| Point::new(*x, *y)).collect(),
        }
    }
}
