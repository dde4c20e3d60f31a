//! The editing session: one open image, its annotations and their history.
//!
//! [`Session`] is the surface a UI shell drives. Pointer gestures come in
//! view space through the gesture API (`begin_box`, `update_box`, ...);
//! programmatic edits use image space through the direct API. Every change
//! to annotations or the view goes through the history log, so undo always
//! matches what is on screen.

use std::path::Path;

use image::RgbaImage;

use crate::codec::{self, DefaultCodec, ImageCodec};
use crate::error::{Error, Result};
use crate::format::{AnnotationDocument, FormatRegistry, ShapeEntry};
use crate::history::{Command, Document, History, HistoryConfig, MergePolicy};
use crate::model::{
    Annotation, AnnotationId, AnnotationStore, BoxAnnotation, IdAllocator, Point,
    StrokeAnnotation, ViewTransform,
};
use crate::render::{self, DrawStyle, Painter};

/// Tunables for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Colors and widths for new annotations and flattening
    pub style: DrawStyle,
    /// Undo log limits
    pub history: HistoryConfig,
    /// Record a whole press-drag-release gesture as one undo step
    pub coalesce_gestures: bool,
    /// Fold a first label into the creation of a freshly drawn annotation
    pub fold_labels: bool,
    /// Factor used by [`Session::zoom_in`] and [`Session::zoom_out`]
    pub zoom_step: f32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            style: DrawStyle::default(),
            history: HistoryConfig::default(),
            coalesce_gestures: true,
            fold_labels: true,
            zoom_step: 1.1,
        }
    }
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Box(AnnotationId),
    Stroke(AnnotationId),
}

impl Gesture {
    fn id(&self) -> AnnotationId {
        match self {
            Gesture::Box(id) | Gesture::Stroke(id) => *id,
        }
    }
}

/// Annotation editing session over a single image.
pub struct Session {
    image: Option<RgbaImage>,
    doc: Document,
    history: History,
    ids: IdAllocator,
    gesture: Option<Gesture>,
    style: DrawStyle,
    coalesce_gestures: bool,
    fold_labels: bool,
    zoom_step: f32,
    codec: Box<dyn ImageCodec>,
    formats: FormatRegistry,
}

impl Session {
    /// Session with default options and the default image codec.
    pub fn new() -> Self {
        Self::with_options(SessionOptions::default())
    }

    pub fn with_options(options: SessionOptions) -> Self {
        Self::with_codec(options, Box::new(DefaultCodec))
    }

    /// Session decoding and encoding rasters through `codec`.
    pub fn with_codec(options: SessionOptions, codec: Box<dyn ImageCodec>) -> Self {
        Self {
            image: None,
            doc: Document::default(),
            history: History::with_config(options.history),
            ids: IdAllocator::new(),
            gesture: None,
            style: options.style,
            coalesce_gestures: options.coalesce_gestures,
            fold_labels: options.fold_labels,
            zoom_step: options.zoom_step,
            codec,
            formats: FormatRegistry::new(),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load an image file. On failure the session is left as it was.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        self.load_bytes(&bytes)?;
        log::info!("Loaded image {:?}", path);
        Ok(())
    }

    /// Load an encoded image. On failure the session is left as it was.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let raster = self.codec.decode(bytes)?;
        self.load_raster(raster)
    }

    /// Replace the open image, dropping all annotations and history.
    pub fn load_raster(&mut self, raster: RgbaImage) -> Result<()> {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::invalid_argument("image has no pixels"));
        }

        self.gesture = None;
        self.history.record(
            Command::LoadImage {
                transform: ViewTransform::identity(width, height),
            },
            &mut self.doc,
        )?;
        self.image = Some(raster);
        log::info!("Session: opened {}x{} image", width, height);
        Ok(())
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    fn ensure_loaded(&self) -> Result<&RgbaImage> {
        self.image.as_ref().ok_or(Error::NoActiveImage)
    }

    // ========================================================================
    // Recording
    // ========================================================================

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            gesture: self
                .gesture
                .filter(|_| self.coalesce_gestures)
                .map(|g| g.id()),
            fold_labels: self.fold_labels,
        }
    }

    fn record(&mut self, command: Command) -> Result<()> {
        let policy = self.merge_policy();
        self.history.record_merged(command, &mut self.doc, &policy)
    }

    fn new_box(&mut self, corner1: Point, corner2: Point) -> Result<BoxAnnotation> {
        let corner1 = corner1.ensure_finite()?;
        let corner2 = corner2.ensure_finite()?;
        Ok(BoxAnnotation {
            id: self.ids.allocate(),
            corner1,
            corner2,
            label: None,
            outline_color: self.style.box_color,
        })
    }

    fn new_stroke(&mut self, points: Vec<Point>) -> Result<StrokeAnnotation> {
        if points.is_empty() {
            return Err(Error::invalid_argument("a stroke needs at least one point"));
        }
        for p in &points {
            p.ensure_finite()?;
        }
        Ok(StrokeAnnotation {
            id: self.ids.allocate(),
            points,
            label: None,
            stroke_color: self.style.stroke_color,
        })
    }

    /// Record the creation of an annotation, optionally opening a gesture on it.
    fn record_creation(&mut self, command: Command, gesture: Option<Gesture>) -> Result<()> {
        self.end_gesture();
        self.gesture = gesture;
        let result = self.record(command);
        if result.is_err() {
            self.gesture = None;
        }
        result
    }

    fn resize_command(&self, id: AnnotationId, corner: Point) -> Result<Command> {
        match self.doc.store.get(id) {
            Some(Annotation::Box(b)) => Ok(Command::ResizeBox {
                id,
                old_corner: b.corner2,
                new_corner: corner.ensure_finite()?,
            }),
            Some(other) => Err(Error::invalid_argument(format!(
                "{} is a {}, not a box",
                id,
                other.kind_name()
            ))),
            None => Err(Error::NotFound { id }),
        }
    }

    fn append_command(&self, id: AnnotationId, point: Point) -> Result<Command> {
        match self.doc.store.get(id) {
            Some(Annotation::Stroke(s)) => Ok(Command::AppendStrokePoint {
                id,
                previous_len: s.points.len(),
                points: vec![point.ensure_finite()?],
            }),
            Some(other) => Err(Error::invalid_argument(format!(
                "{} is a {}, not a stroke",
                id,
                other.kind_name()
            ))),
            None => Err(Error::NotFound { id }),
        }
    }

    // ========================================================================
    // Gestures (view space)
    // ========================================================================

    /// Press in box mode: start a box anchored under the pointer.
    pub fn begin_box(&mut self, view_point: Point) -> Result<AnnotationId> {
        self.ensure_loaded()?;
        let anchor = self.to_image_space(view_point)?;
        let annotation = self.new_box(anchor, anchor)?;
        let id = annotation.id;
        self.record_creation(Command::CreateBox { annotation }, Some(Gesture::Box(id)))?;
        Ok(id)
    }

    /// Drag in box mode: move the open box's second corner under the pointer.
    pub fn update_box(&mut self, view_point: Point) -> Result<()> {
        self.ensure_loaded()?;
        let Some(Gesture::Box(id)) = self.gesture else {
            return Err(Error::invalid_argument("no box is being drawn"));
        };
        let corner = self.to_image_space(view_point)?;
        let command = self.resize_command(id, corner)?;
        self.record(command)
    }

    /// Press in stroke mode: start a stroke at the pointer.
    pub fn begin_stroke(&mut self, view_point: Point) -> Result<AnnotationId> {
        self.ensure_loaded()?;
        let first = self.to_image_space(view_point)?;
        let annotation = self.new_stroke(vec![first])?;
        let id = annotation.id;
        self.record_creation(Command::CreateStroke { annotation }, Some(Gesture::Stroke(id)))?;
        Ok(id)
    }

    /// Drag in stroke mode: append the pointer position to the open stroke.
    pub fn extend_stroke(&mut self, view_point: Point) -> Result<()> {
        self.ensure_loaded()?;
        let Some(Gesture::Stroke(id)) = self.gesture else {
            return Err(Error::invalid_argument("no stroke is being drawn"));
        };
        let point = self.to_image_space(view_point)?;
        let command = self.append_command(id, point)?;
        self.record(command)
    }

    /// Release: close the open gesture, returning the annotation it drew.
    pub fn end_gesture(&mut self) -> Option<AnnotationId> {
        let id = self.gesture.take().map(|g| g.id());
        if let Some(id) = id {
            log::trace!("Session: gesture on {} ended", id);
        }
        id
    }

    /// Annotation being drawn by the open gesture, if any.
    pub fn active_gesture(&self) -> Option<AnnotationId> {
        self.gesture.map(|g| g.id())
    }

    // ========================================================================
    // Direct edits (image space)
    // ========================================================================

    /// Create a box with both corners at `anchor`.
    pub fn create_box(&mut self, anchor: Point) -> Result<AnnotationId> {
        self.draw_box(anchor, anchor)
    }

    /// Create a finished box in a single undo step.
    pub fn draw_box(&mut self, corner1: Point, corner2: Point) -> Result<AnnotationId> {
        self.ensure_loaded()?;
        let annotation = self.new_box(corner1, corner2)?;
        let id = annotation.id;
        self.record_creation(Command::CreateBox { annotation }, None)?;
        Ok(id)
    }

    pub fn resize_box(&mut self, id: AnnotationId, corner: Point) -> Result<()> {
        self.ensure_loaded()?;
        self.end_gesture();
        let command = self.resize_command(id, corner)?;
        self.record(command)
    }

    /// Create a stroke holding just `first_point`.
    pub fn create_stroke(&mut self, first_point: Point) -> Result<AnnotationId> {
        self.draw_stroke(vec![first_point])
    }

    /// Create a finished stroke in a single undo step.
    pub fn draw_stroke(&mut self, points: Vec<Point>) -> Result<AnnotationId> {
        self.ensure_loaded()?;
        let annotation = self.new_stroke(points)?;
        let id = annotation.id;
        self.record_creation(Command::CreateStroke { annotation }, None)?;
        Ok(id)
    }

    pub fn append_stroke_point(&mut self, id: AnnotationId, point: Point) -> Result<()> {
        self.ensure_loaded()?;
        self.end_gesture();
        let command = self.append_command(id, point)?;
        self.record(command)
    }

    /// Attach a label to `target`, or to the most recently created
    /// annotation when no target is given. Returns the labeled id.
    pub fn attach_label(&mut self, target: Option<AnnotationId>, text: &str) -> Result<AnnotationId> {
        self.ensure_loaded()?;
        if text.is_empty() {
            return Err(Error::invalid_argument("label text is empty"));
        }
        let annotation = match target {
            Some(id) => self.doc.store.get(id).ok_or(Error::NotFound { id })?,
            None => self
                .doc
                .store
                .most_recent()
                .ok_or_else(|| Error::invalid_argument("there is no annotation to label"))?,
        };
        let id = annotation.id();
        let command = Command::AttachLabel {
            id,
            old_label: annotation.label().map(str::to_string),
            new_label: text.to_string(),
        };

        self.end_gesture();
        self.record(command)?;
        Ok(id)
    }

    pub fn remove(&mut self, id: AnnotationId) -> Result<()> {
        self.ensure_loaded()?;
        let annotation = self
            .doc
            .store
            .get(id)
            .cloned()
            .ok_or(Error::NotFound { id })?;
        self.end_gesture();
        self.record(Command::RemoveAnnotation { annotation })
    }

    // ========================================================================
    // View
    // ========================================================================

    /// Multiply the view scale by `factor`.
    pub fn zoom(&mut self, factor: f32) -> Result<()> {
        self.ensure_loaded()?;
        let old = self.doc.transform;
        let new = old.apply_zoom(factor)?;
        self.end_gesture();
        self.record(Command::SetTransform { old, new })
    }

    pub fn zoom_in(&mut self) -> Result<()> {
        self.zoom(self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Result<()> {
        self.zoom(1.0 / self.zoom_step)
    }

    /// Rotate the view a quarter turn counter-clockwise.
    pub fn rotate(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        let old = self.doc.transform;
        self.end_gesture();
        self.record(Command::SetTransform {
            old,
            new: old.apply_rotation(),
        })
    }

    /// Convert a pointer position into image space.
    pub fn to_image_space(&self, view_point: Point) -> Result<Point> {
        Ok(self.doc.transform.to_image_space(view_point.ensure_finite()?))
    }

    pub fn to_view_space(&self, image_point: Point) -> Point {
        self.doc.transform.to_view_space(image_point)
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Undo the last step. Returns false when there is nothing to undo,
    /// which includes a session with no image loaded yet.
    pub fn undo(&mut self) -> Result<bool> {
        self.end_gesture();
        self.history.undo(&mut self.doc)
    }

    /// Redo the last undone step. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        self.end_gesture();
        self.history.redo(&mut self.doc)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    pub fn transform(&self) -> ViewTransform {
        self.doc.transform
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.doc.store
    }

    /// Annotations in creation order.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.doc.store.iter()
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.doc.store.get(id)
    }

    pub fn style(&self) -> &DrawStyle {
        &self.style
    }

    /// Change the drawing style. Existing annotations keep their colors.
    pub fn set_style(&mut self, style: DrawStyle) {
        self.style = style;
    }

    pub fn style_mut(&mut self) -> &mut DrawStyle {
        &mut self.style
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    // ========================================================================
    // Export / import
    // ========================================================================

    /// Snapshot the annotations as a format-neutral document.
    pub fn annotation_document(&self) -> Result<AnnotationDocument> {
        let image = self.ensure_loaded()?;
        Ok(AnnotationDocument::from_store(
            &self.doc.store,
            image.width(),
            image.height(),
        ))
    }

    /// Serialize the annotations with the format registered as `format_id`.
    pub fn export_annotations(&self, format_id: &str) -> Result<String> {
        let doc = self.annotation_document()?;
        Ok(self.formats.get(format_id)?.export(&doc)?)
    }

    /// Write the annotations to `path`, picking the format by extension.
    pub fn save_annotations(&self, path: &Path) -> Result<()> {
        let doc = self.annotation_document()?;
        let text = self.formats.for_path(path)?.export(&doc)?;
        std::fs::write(path, text)?;
        log::info!("Saved {} annotations to {:?}", doc.annotations.len(), path);
        Ok(())
    }

    /// Add the annotations in `text` as one undo step. Imported annotations
    /// get fresh ids; the new ids are returned in file order.
    pub fn import_annotations(&mut self, text: &str, format_id: &str) -> Result<Vec<AnnotationId>> {
        let image = self.ensure_loaded()?;
        let (width, height) = image.dimensions();
        let doc = self.formats.get(format_id)?.import(text)?;

        if doc.image.width != 0
            && doc.image.height != 0
            && (doc.image.width, doc.image.height) != (width, height)
        {
            log::warn!(
                "Annotations were made on a {}x{} image, the open image is {}x{}",
                doc.image.width,
                doc.image.height,
                width,
                height
            );
        }

        let mut commands = Vec::with_capacity(doc.annotations.len());
        let mut ids = Vec::with_capacity(doc.annotations.len());
        for entry in &doc.annotations {
            let label = entry.label.clone().filter(|l| !l.is_empty());
            let color = entry.parsed_color();
            let command = match &entry.shape {
                ShapeEntry::Box { x1, y1, x2, y2 } => {
                    let mut annotation = self.new_box(Point::new(*x1, *y1), Point::new(*x2, *y2))?;
                    annotation.label = label;
                    annotation.outline_color = color.unwrap_or(annotation.outline_color);
                    ids.push(annotation.id);
                    Command::CreateBox { annotation }
                }
                ShapeEntry::Stroke { .. } => {
                    let mut annotation = self.new_stroke(entry.shape.points())?;
                    annotation.label = label;
                    annotation.stroke_color = color.unwrap_or(annotation.stroke_color);
                    ids.push(annotation.id);
                    Command::CreateStroke { annotation }
                }
            };
            commands.push(command);
        }

        if commands.is_empty() {
            log::info!("Import contained no annotations");
            return Ok(ids);
        }

        self.end_gesture();
        self.history.record(
            Command::Batch {
                description: format!("Import {} annotations", commands.len()),
                commands,
            },
            &mut self.doc,
        )?;
        log::info!("Imported {} annotations", ids.len());
        Ok(ids)
    }

    /// Read annotations from `path`, picking the format by extension.
    pub fn load_annotations(&mut self, path: &Path) -> Result<Vec<AnnotationId>> {
        self.ensure_loaded()?;
        let format_id = self.formats.for_path(path)?.id();
        let text = std::fs::read_to_string(path)?;
        self.import_annotations(&text, format_id)
    }

    // ========================================================================
    // Flattening
    // ========================================================================

    /// Render the current view with every annotation burned in.
    pub fn flatten(&self, painter: &mut dyn Painter) -> Result<RgbaImage> {
        let image = self.ensure_loaded()?;
        Ok(render::flatten(
            image,
            &self.doc.transform,
            &self.doc.store,
            &self.style,
            painter,
        ))
    }

    /// Flatten and encode to `path`; the format follows the extension.
    pub fn save_flattened(&self, path: &Path, painter: &mut dyn Painter) -> Result<()> {
        self.ensure_loaded()?;
        let format = codec::format_for_path(path)?;
        let flat = self.flatten(painter)?;
        let bytes = self.codec.encode(&flat, format)?;
        std::fs::write(path, bytes)?;
        log::info!(
            "Saved flattened {}x{} image to {:?}",
            flat.width(),
            flat.height(),
            path
        );
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
