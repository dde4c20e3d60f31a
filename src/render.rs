//! Flattening annotations onto a raster.
//!
//! [`flatten`] renders the source image the way the view shows it (rotated,
//! then scaled) and burns every annotation into the copy through a
//! [`Painter`]. The session's source raster is never modified.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use crate::model::{Annotation, AnnotationStore, Color, Point, Rotation, ViewTransform};

/// Vertical distance between a label's baseline box and its anchor, in view pixels.
pub const LABEL_OFFSET: f32 = 10.0;

/// Colors and widths used when drawing annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawStyle {
    /// Outline color for new boxes
    pub box_color: Color,
    /// Line color for new strokes
    pub stroke_color: Color,
    /// Label text color
    pub label_color: Color,
    /// Outline and stroke width in pixels
    pub line_width: u32,
    /// Label text height in pixels
    pub font_size: f32,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            box_color: Color::RED,
            stroke_color: Color::BLUE,
            label_color: Color::BLACK,
            line_width: 2,
            font_size: 14.0,
        }
    }
}

/// Shape and text drawing primitives used by [`flatten`].
///
/// All coordinates are in pixels of the target raster.
pub trait Painter {
    fn draw_rect(&mut self, canvas: &mut RgbaImage, min: Point, max: Point, color: Color, width: u32);

    fn draw_polyline(&mut self, canvas: &mut RgbaImage, points: &[Point], color: Color, width: u32);

    fn draw_text(&mut self, canvas: &mut RgbaImage, position: Point, text: &str, color: Color, size: f32);
}

/// [`Painter`] drawing with `imageproc`; text needs a loaded font.
#[derive(Clone, Default)]
pub struct RasterPainter {
    font: Option<FontArc>,
}

impl RasterPainter {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

impl Painter for RasterPainter {
    fn draw_rect(&mut self, canvas: &mut RgbaImage, min: Point, max: Point, color: Color, width: u32) {
        let (lo, hi) = drawable_area(canvas, width as f32);
        if max.x < lo.x || max.y < lo.y || min.x > hi.x || min.y > hi.y {
            return;
        }
        let (min, max) = (min.clamp(lo, hi), max.clamp(lo, hi));

        let pixel = color.to_rgba();
        // Grow the outline inwards one pixel ring at a time.
        for inset in 0..width.max(1) {
            let inset = inset as f32;
            let x0 = (min.x + inset).round() as i64;
            let y0 = (min.y + inset).round() as i64;
            let x1 = (max.x - inset).round() as i64;
            let y1 = (max.y - inset).round() as i64;
            if x1 < x0 || y1 < y0 {
                break;
            }
            let rect = Rect::at(x0 as i32, y0 as i32).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
            draw_hollow_rect_mut(canvas, rect, pixel);
        }
    }

    fn draw_polyline(&mut self, canvas: &mut RgbaImage, points: &[Point], color: Color, width: u32) {
        let pixel = color.to_rgba();
        let (lo, hi) = drawable_area(canvas, width as f32);
        if let [only] = points {
            if only.clamp(lo, hi) != *only {
                return;
            }
            let radius = (width / 2).max(1) as i32;
            draw_filled_circle_mut(canvas, (only.x.round() as i32, only.y.round() as i32), radius, pixel);
            return;
        }
        let width = width.max(1);
        for segment in points.windows(2) {
            let (a, b) = (segment[0], segment[1]);
            let len = a.distance_to(&b);
            // Unit normal, for offsetting parallel lines to get the width.
            let (nx, ny) = if len > f32::EPSILON {
                (-(b.y - a.y) / len, (b.x - a.x) / len)
            } else {
                (0.0, 0.0)
            };
            for k in 0..width {
                let offset = k as f32 - (width - 1) as f32 / 2.0;
                let start = Point::new(a.x + nx * offset, a.y + ny * offset);
                let end = Point::new(b.x + nx * offset, b.y + ny * offset);
                if let Some((start, end)) = clip_segment(start, end, lo, hi) {
                    draw_line_segment_mut(canvas, (start.x, start.y), (end.x, end.y), pixel);
                }
            }
        }
    }

    fn draw_text(&mut self, canvas: &mut RgbaImage, position: Point, text: &str, color: Color, size: f32) {
        let Some(font) = self.font.as_ref() else {
            log::warn!("No font loaded, skipping label '{}'", text);
            return;
        };
        let reach = size * (text.chars().count() + 1) as f32;
        let (lo, hi) = drawable_area(canvas, reach);
        if position.clamp(lo, hi) != position {
            log::trace!("Label '{}' lies outside the canvas", text);
            return;
        }
        draw_text_mut(
            canvas,
            color.to_rgba(),
            position.x.round() as i32,
            position.y.round() as i32,
            PxScale::from(size),
            font,
            text,
        );
    }
}

/// Corners of the region worth drawing into: the canvas grown by its own
/// size plus `pad` on every side. Anything further out is never visible.
fn drawable_area(canvas: &RgbaImage, pad: f32) -> (Point, Point) {
    let (w, h) = canvas.dimensions();
    let margin = w.max(h) as f32 + pad;
    (
        Point::new(-margin, -margin),
        Point::new(w as f32 + margin, h as f32 + margin),
    )
}

/// Clip the segment `a`-`b` to the rectangle `lo`-`hi` (Liang-Barsky).
///
/// Runs in f64 so that endpoints billions of pixels away still clip onto
/// the right spot.
fn clip_segment(a: Point, b: Point, lo: Point, hi: Point) -> Option<(Point, Point)> {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    let edges = [
        (-dx, ax - lo.x as f64),
        (dx, hi.x as f64 - ax),
        (-dy, ay - lo.y as f64),
        (dy, hi.y as f64 - ay),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| Point::new((ax + t * dx) as f32, (ay + t * dy) as f32);
    Some((at(t0), at(t1)))
}

/// Load a TrueType/OpenType font for label rendering.
///
/// Tries `path` first, then the `ANNOMARK_FONT` environment variable.
pub fn load_font(path: Option<&Path>) -> Option<FontArc> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::var_os("ANNOMARK_FONT")?.into(),
    };
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to read font {:?}: {}", path, e);
            return None;
        }
    };
    match FontArc::try_from_vec(bytes) {
        Ok(font) => {
            log::info!("Loaded label font from {:?}", path);
            Some(font)
        }
        Err(e) => {
            log::warn!("Failed to parse font {:?}: {}", path, e);
            None
        }
    }
}

/// Render `image` as seen through `transform`: rotate, then resize.
pub fn render_view(image: &RgbaImage, transform: &ViewTransform) -> RgbaImage {
    if image.dimensions() != (transform.width, transform.height) {
        log::warn!(
            "Transform extent {}x{} does not match image {}x{}",
            transform.width,
            transform.height,
            image.width(),
            image.height()
        );
    }

    // Counter-clockwise quarter turns map onto the clockwise raster rotations.
    let rotated = match transform.rotation {
        Rotation::Deg0 => image.clone(),
        Rotation::Deg90 => imageops::rotate270(image),
        Rotation::Deg180 => imageops::rotate180(image),
        Rotation::Deg270 => imageops::rotate90(image),
    };

    let (width, height) = transform.view_size();
    if rotated.dimensions() == (width, height) {
        rotated
    } else {
        imageops::resize(&rotated, width, height, FilterType::Lanczos3)
    }
}

/// Produce a new raster with all annotations burned in.
///
/// Shapes are drawn first in insertion order, then every non-empty label.
pub fn flatten(
    image: &RgbaImage,
    transform: &ViewTransform,
    store: &AnnotationStore,
    style: &DrawStyle,
    painter: &mut dyn Painter,
) -> RgbaImage {
    let mut canvas = render_view(image, transform);

    for annotation in store.iter() {
        match annotation {
            Annotation::Box(b) => {
                let c1 = transform.to_view_space(b.corner1);
                let c2 = transform.to_view_space(b.corner2);
                let min = Point::new(c1.x.min(c2.x), c1.y.min(c2.y));
                let max = Point::new(c1.x.max(c2.x), c1.y.max(c2.y));
                painter.draw_rect(&mut canvas, min, max, b.outline_color, style.line_width);
            }
            Annotation::Stroke(s) => {
                let points: Vec<Point> =
                    s.points.iter().map(|p| transform.to_view_space(*p)).collect();
                painter.draw_polyline(&mut canvas, &points, s.stroke_color, style.line_width);
            }
        }
    }

    for annotation in store.iter() {
        let Some(label) = annotation.label().filter(|l| !l.is_empty()) else {
            continue;
        };
        let anchor = transform.to_view_space(annotation.anchor());
        let position = Point::new(anchor.x, anchor.y - LABEL_OFFSET);
        painter.draw_text(&mut canvas, position, label, style.label_color, style.font_size);
    }

    log::debug!(
        "Flattened {} annotations onto {}x{} raster",
        store.len(),
        canvas.width(),
        canvas.height()
    );
    canvas
}
