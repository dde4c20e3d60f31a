//! Annotation storage for the open image.

use std::collections::BTreeMap;

use super::annotation::{Annotation, AnnotationId, BoxAnnotation, Color, StrokeAnnotation};
use super::geometry::Point;
use crate::error::Error;

/// All annotations on the open image, keyed by id.
///
/// Ids come from a monotonic allocator and restored annotations keep their
/// original id, so iterating in id order is iterating in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    annotations: BTreeMap<AnnotationId, Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a box with both corners at `anchor`.
    pub fn create_box(
        &mut self,
        id: AnnotationId,
        anchor: Point,
        outline_color: Color,
    ) -> Result<BoxAnnotation, Error> {
        let anchor = anchor.ensure_finite()?;
        self.ensure_vacant(id)?;
        let created = BoxAnnotation {
            id,
            corner1: anchor,
            corner2: anchor,
            label: None,
            outline_color,
        };
        self.annotations.insert(id, Annotation::Box(created.clone()));
        log::debug!("Created box {}", id);
        Ok(created)
    }

    /// Move the second corner of a box. The first corner never moves.
    pub fn resize_box(&mut self, id: AnnotationId, new_corner: Point) -> Result<Point, Error> {
        let new_corner = new_corner.ensure_finite()?;
        let b = self.box_mut(id)?;
        let old = b.corner2;
        b.corner2 = new_corner;
        Ok(old)
    }

    pub fn create_stroke(
        &mut self,
        id: AnnotationId,
        first_point: Point,
        stroke_color: Color,
    ) -> Result<StrokeAnnotation, Error> {
        let first_point = first_point.ensure_finite()?;
        self.ensure_vacant(id)?;
        let created = StrokeAnnotation {
            id,
            points: vec![first_point],
            label: None,
            stroke_color,
        };
        self.annotations.insert(id, Annotation::Stroke(created.clone()));
        log::debug!("Created stroke {}", id);
        Ok(created)
    }

    pub fn append_stroke_point(&mut self, id: AnnotationId, point: Point) -> Result<(), Error> {
        self.append_stroke_points(id, &[point])
    }

    /// Append several points at once. Either all are appended or none.
    pub fn append_stroke_points(&mut self, id: AnnotationId, points: &[Point]) -> Result<(), Error> {
        for p in points {
            p.ensure_finite()?;
        }
        self.stroke_mut(id)?.points.extend_from_slice(points);
        Ok(())
    }

    /// Attach a label, returning the label it replaces.
    pub fn attach_label(&mut self, id: AnnotationId, text: &str) -> Result<Option<String>, Error> {
        if text.is_empty() {
            return Err(Error::invalid_argument("label text is empty"));
        }
        self.set_label(id, Some(text.to_string()))
    }

    pub fn remove(&mut self, id: AnnotationId) -> Result<Annotation, Error> {
        let removed = self.annotations.remove(&id).ok_or(Error::NotFound { id })?;
        log::debug!("Removed {} {}", removed.kind_name(), id);
        Ok(removed)
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.annotations.contains_key(&id)
    }

    /// Annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values()
    }

    /// The most recently created annotation still in the store.
    pub fn most_recent(&self) -> Option<&Annotation> {
        self.annotations.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    // ========================================================================
    // Primitives used by the history engine to revert/replay exactly
    // ========================================================================

    /// Insert an annotation under its own id, which must be vacant.
    pub(crate) fn restore(&mut self, annotation: Annotation) -> Result<(), Error> {
        self.ensure_vacant(annotation.id())?;
        self.annotations.insert(annotation.id(), annotation);
        Ok(())
    }

    pub(crate) fn set_label(
        &mut self,
        id: AnnotationId,
        label: Option<String>,
    ) -> Result<Option<String>, Error> {
        let annotation = self.annotations.get_mut(&id).ok_or(Error::NotFound { id })?;
        Ok(std::mem::replace(annotation.label_mut(), label))
    }

    /// Shorten a stroke back to `len` points (never below one).
    pub(crate) fn truncate_stroke(&mut self, id: AnnotationId, len: usize) -> Result<(), Error> {
        if len == 0 {
            return Err(Error::invalid_argument("a stroke keeps at least one point"));
        }
        self.stroke_mut(id)?.points.truncate(len);
        Ok(())
    }

    fn ensure_vacant(&self, id: AnnotationId) -> Result<(), Error> {
        if self.annotations.contains_key(&id) {
            return Err(Error::invalid_argument(format!(
                "annotation {} already exists",
                id
            )));
        }
        Ok(())
    }

    fn box_mut(&mut self, id: AnnotationId) -> Result<&mut BoxAnnotation, Error> {
        match self.annotations.get_mut(&id) {
            Some(Annotation::Box(b)) => Ok(b),
            Some(Annotation::Stroke(_)) => Err(Error::invalid_argument(format!(
                "annotation {} is a stroke, not a box",
                id
            ))),
            None => Err(Error::NotFound { id }),
        }
    }

    pub(crate) fn stroke_mut(&mut self, id: AnnotationId) -> Result<&mut StrokeAnnotation, Error> {
        match self.annotations.get_mut(&id) {
            Some(Annotation::Stroke(s)) => Ok(s),
            Some(Annotation::Box(_)) => Err(Error::invalid_argument(format!(
                "annotation {} is a box, not a stroke",
                id
            ))),
            None => Err(Error::NotFound { id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::IdAllocator;

    #[test]
    fn test_create_and_resize_box() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let id = ids.allocate();

        let created = store.create_box(id, Point::new(10.0, 10.0), Color::RED).unwrap();
        assert_eq!(created.corner1, created.corner2);

        let old = store.resize_box(id, Point::new(40.0, 40.0)).unwrap();
        assert_eq!(old, Point::new(10.0, 10.0));

        let Some(Annotation::Box(b)) = store.get(id) else {
            panic!("Expected box annotation");
        };
        assert_eq!(b.corner1, Point::new(10.0, 10.0));
        assert_eq!(b.corner2, Point::new(40.0, 40.0));
    }

    #[test]
    fn test_stroke_append() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let id = ids.allocate();

        store.create_stroke(id, Point::new(0.0, 0.0), Color::BLUE).unwrap();
        store.append_stroke_point(id, Point::new(5.0, 5.0)).unwrap();
        store.append_stroke_point(id, Point::new(10.0, 0.0)).unwrap();

        let Some(Annotation::Stroke(s)) = store.get(id) else {
            panic!("Expected stroke annotation");
        };
        assert_eq!(s.points.len(), 3);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let missing = ids.allocate();

        let err = store.append_stroke_point(missing, Point::new(1.0, 1.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = store.attach_label(missing, "cat").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = store.remove(missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_empty_label_is_rejected() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let id = ids.allocate();
        store.create_box(id, Point::new(1.0, 1.0), Color::RED).unwrap();

        let err = store.attach_label(id, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(store.get(id).and_then(|a| a.label()), None);
    }

    #[test]
    fn test_kind_mismatch_is_invalid() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let id = ids.allocate();
        store.create_box(id, Point::new(1.0, 1.0), Color::RED).unwrap();

        let err = store.append_stroke_point(id, Point::new(2.0, 2.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let id = ids.allocate();
        store.create_box(id, Point::new(1.0, 1.0), Color::RED).unwrap();
        assert!(store.create_stroke(id, Point::new(1.0, 1.0), Color::BLUE).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_non_finite_point_is_rejected() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let id = ids.allocate();
        assert!(store.create_box(id, Point::new(f32::NAN, 0.0), Color::RED).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_insertion_order_and_most_recent() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();
        store.create_box(a, Point::new(0.0, 0.0), Color::RED).unwrap();
        store.create_stroke(b, Point::new(0.0, 0.0), Color::BLUE).unwrap();
        store.create_box(c, Point::new(0.0, 0.0), Color::RED).unwrap();

        let removed = store.remove(b).unwrap();
        store.restore(removed).unwrap();

        let order: Vec<_> = store.iter().map(|a| a.id()).collect();
        assert_eq!(order, vec![a, b, c]);
        assert_eq!(store.most_recent().map(|a| a.id()), Some(c));
    }

    #[test]
    fn test_off_image_coordinates_are_legal() {
        let mut ids = IdAllocator::new();
        let mut store = AnnotationStore::new();
        let id = ids.allocate();
        store.create_box(id, Point::new(-50.0, -20.0), Color::RED).unwrap();
        store.resize_box(id, Point::new(5000.0, 9000.0)).unwrap();
        assert_eq!(store.len(), 1);
    }
}
