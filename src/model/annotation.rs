//! Annotation entities and their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::Point;

/// Opaque identifier for an annotation.
///
/// Issued by an [`IdAllocator`]; it is a domain key only and carries no
/// meaning for whatever rendering handle the UI assigns to the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(u64);

impl AnnotationId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// For looking up ids that were printed or exported earlier.
impl From<u64> for AnnotationId {
    fn from(raw: u64) -> Self {
        AnnotationId(raw)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id allocator. Ids are never handed out twice.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> AnnotationId {
        let id = AnnotationId(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// RGB color used for outlines, strokes and label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const RED: Color = Color([255, 0, 0]);
    pub const BLUE: Color = Color([0, 0, 255]);

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.0;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn to_rgba(&self) -> image::Rgba<u8> {
        let [r, g, b] = self.0;
        image::Rgba([r, g, b, 255])
    }
}

/// A rectangle drawn with a press-drag-release gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxAnnotation {
    pub id: AnnotationId,
    /// Anchor corner, fixed at creation.
    pub corner1: Point,
    /// Corner that follows the drag.
    pub corner2: Point,
    pub label: Option<String>,
    pub outline_color: Color,
}

impl BoxAnnotation {
    /// Corners as `(min_x, min_y, max_x, max_y)`.
    pub fn normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.corner1.x.min(self.corner2.x),
            self.corner1.y.min(self.corner2.y),
            self.corner1.x.max(self.corner2.x),
            self.corner1.y.max(self.corner2.y),
        )
    }
}

/// A freehand polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeAnnotation {
    pub id: AnnotationId,
    /// Ordered points, never empty.
    pub points: Vec<Point>,
    pub label: Option<String>,
    pub stroke_color: Color,
}

/// Any annotation held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    Box(BoxAnnotation),
    Stroke(StrokeAnnotation),
}

impl Annotation {
    pub fn id(&self) -> AnnotationId {
        match self {
            Annotation::Box(b) => b.id,
            Annotation::Stroke(s) => s.id,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Annotation::Box(b) => b.label.as_deref(),
            Annotation::Stroke(s) => s.label.as_deref(),
        }
    }

    pub(crate) fn label_mut(&mut self) -> &mut Option<String> {
        match self {
            Annotation::Box(b) => &mut b.label,
            Annotation::Stroke(s) => &mut s.label,
        }
    }

    /// Point labels are drawn next to: the first box corner or the first stroke point.
    pub fn anchor(&self) -> Point {
        match self {
            Annotation::Box(b) => b.corner1,
            // Strokes always hold at least one point.
            Annotation::Stroke(s) => s.points.first().copied().unwrap_or(Point::new(0.0, 0.0)),
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Annotation::Box(b) => b.outline_color,
            Annotation::Stroke(s) => s.stroke_color,
        }
    }

    /// Short kind name used in logs and text export.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Annotation::Box(_) => "box",
            Annotation::Stroke(_) => "stroke",
        }
    }

    /// All geometry points in image space.
    pub fn points(&self) -> Vec<Point> {
        match self {
            Annotation::Box(b) => vec![b.corner1, b.corner2],
            Annotation::Stroke(s) => s.points.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::RED));
        assert_eq!(Color::from_hex("0000ff"), Some(Color::BLUE));
        assert_eq!(Color::from_hex("#12"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color([1, 2, 255]).to_hex(), "#0102ff");
    }

    #[test]
    fn test_box_normalized() {
        let b = BoxAnnotation {
            id: IdAllocator::new().allocate(),
            corner1: Point::new(40.0, 10.0),
            corner2: Point::new(10.0, 40.0),
            label: None,
            outline_color: Color::RED,
        };
        assert_eq!(b.normalized(), (10.0, 10.0, 40.0, 40.0));
    }

    #[test]
    fn test_anchor() {
        let mut ids = IdAllocator::new();
        let stroke = Annotation::Stroke(StrokeAnnotation {
            id: ids.allocate(),
            points: vec![Point::new(3.0, 4.0), Point::new(5.0, 6.0)],
            label: Some("road".to_string()),
            stroke_color: Color::BLUE,
        });
        assert_eq!(stroke.anchor(), Point::new(3.0, 4.0));
        assert_eq!(stroke.label(), Some("road"));
        assert_eq!(stroke.kind_name(), "stroke");
    }
}
