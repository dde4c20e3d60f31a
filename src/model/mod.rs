//! Data models: geometry, annotations and their store.

mod annotation;
mod geometry;
mod store;

pub use annotation::{
    Annotation, AnnotationId, BoxAnnotation, Color, IdAllocator, StrokeAnnotation,
};
pub use geometry::{Point, Rotation, ViewTransform, to_image_space, to_view_space};
pub use store::AnnotationStore;
