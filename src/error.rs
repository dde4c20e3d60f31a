//! Error type for session operations.

use thiserror::Error;

use crate::format::FormatError;
use crate::model::AnnotationId;

/// Errors raised by the annotation core.
///
/// A failed operation never leaves the session partially mutated.
#[derive(Error, Debug)]
pub enum Error {
    /// An argument was rejected (non-positive zoom, empty label, ...)
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Why the argument was rejected
        message: String,
    },

    /// The target annotation is not in the store
    #[error("Annotation not found: {id}")]
    NotFound {
        /// The missing annotation id
        id: AnnotationId,
    },

    /// An operation needs an image but none is loaded
    #[error("No image is loaded")]
    NoActiveImage,

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode/encode error
    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// Annotation export/import error
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Coarse error category, for presenting errors in a UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    NoActiveImage,
    IoFailure,
}

impl Error {
    /// Create an invalid argument error with a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::NoActiveImage => ErrorKind::NoActiveImage,
            Error::Io(_) | Error::Codec(_) | Error::Format(_) => ErrorKind::IoFailure,
        }
    }
}

/// Result alias for session operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
