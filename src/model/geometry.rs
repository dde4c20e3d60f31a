//! View transform mathematics.
//!
//! Annotation geometry is always stored in image space (the original,
//! unrotated, unscaled raster). The [`ViewTransform`] maps between that frame
//! and the currently displayed view, which is the source raster rotated
//! counter-clockwise in 90° steps (expanding, so the rotated raster starts at
//! the view origin) and then scaled uniformly.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A 2D point. Whether it is in image or view space depends on context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Restrict each coordinate to the rectangle spanned by `min` and `max`.
    pub fn clamp(self, min: Point, max: Point) -> Point {
        Point::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }

    pub(crate) fn ensure_finite(self) -> Result<Self, Error> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(Error::invalid_argument(format!(
                "point ({}, {}) is not finite",
                self.x, self.y
            )))
        }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// Counter-clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Parse a rotation from degrees. Only multiples of 90 are accepted.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// The next rotation, +90° mod 360.
    pub fn next(&self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// Whether width and height swap under this rotation.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Scale and rotation of the view over a source image of fixed extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub rotation: Rotation,
    /// Source image width in pixels.
    pub width: u32,
    /// Source image height in pixels.
    pub height: u32,
}

impl ViewTransform {
    /// Identity transform (scale 1, no rotation) over an image of the given size.
    pub fn identity(width: u32, height: u32) -> Self {
        Self {
            scale: 1.0,
            rotation: Rotation::Deg0,
            width,
            height,
        }
    }

    /// Multiply the scale by `factor`.
    ///
    /// Fails when the factor or the resulting scale is not a positive finite
    /// number, so a scale can never overflow to infinity or collapse to zero.
    pub fn apply_zoom(&self, factor: f32) -> Result<ViewTransform, Error> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::invalid_argument(format!(
                "zoom factor must be positive, got {}",
                factor
            )));
        }
        let scale = self.scale * factor;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::invalid_argument(format!(
                "zooming {} by {} leaves no usable scale",
                self.scale, factor
            )));
        }
        Ok(ViewTransform { scale, ..*self })
    }

    /// Advance the rotation by a quarter turn.
    pub fn apply_rotation(&self) -> ViewTransform {
        ViewTransform {
            rotation: self.rotation.next(),
            ..*self
        }
    }

    /// Size of the rotated source before scaling.
    pub fn rotated_extent(&self) -> (f32, f32) {
        let (w, h) = (self.width as f32, self.height as f32);
        if self.rotation.swaps_axes() {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Pixel size of the rendered view (at least 1x1).
    pub fn view_size(&self) -> (u32, u32) {
        let (w, h) = self.rotated_extent();
        let scaled = |v: f32| ((v * self.scale).round() as u32).max(1);
        (scaled(w), scaled(h))
    }

    /// Convert a view-space point into image space.
    pub fn to_image_space(&self, view: Point) -> Point {
        let (w, h) = (self.width as f32, self.height as f32);
        let u = view.x / self.scale;
        let v = view.y / self.scale;
        match self.rotation {
            Rotation::Deg0 => Point::new(u, v),
            Rotation::Deg90 => Point::new(w - v, u),
            Rotation::Deg180 => Point::new(w - u, h - v),
            Rotation::Deg270 => Point::new(v, h - u),
        }
    }

    /// Convert an image-space point into view space.
    pub fn to_view_space(&self, image: Point) -> Point {
        let (w, h) = (self.width as f32, self.height as f32);
        let rotated = match self.rotation {
            Rotation::Deg0 => image,
            Rotation::Deg90 => Point::new(image.y, w - image.x),
            Rotation::Deg180 => Point::new(w - image.x, h - image.y),
            Rotation::Deg270 => Point::new(h - image.y, image.x),
        };
        Point::new(rotated.x * self.scale, rotated.y * self.scale)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity(0, 0)
    }
}

/// Free-function form of [`ViewTransform::to_image_space`].
pub fn to_image_space(view: Point, transform: &ViewTransform) -> Point {
    transform.to_image_space(view)
}

/// Free-function form of [`ViewTransform::to_view_space`].
pub fn to_view_space(image: Point, transform: &ViewTransform) -> Point {
    transform.to_view_space(image)
}
