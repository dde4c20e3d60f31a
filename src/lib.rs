//! annomark - image annotation core
//!
//! Boxes and freehand strokes over a zoomable, rotatable view of one image,
//! with a command-log undo/redo history, structured annotation export and
//! flattened raster output. A UI shell drives a [`Session`]; the shell owns
//! rendering and input, the session owns state.

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod model;
pub mod render;
pub mod script;
pub mod session;

pub use error::{Error, ErrorKind, Result};
pub use session::{Session, SessionOptions};
