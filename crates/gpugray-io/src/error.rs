//! Error types for loading and saving images.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Format could not be determined or is not compiled in.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    Decode(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    Encode(String),

    /// Decoded pixels did not form a valid surface.
    #[error("invalid image: {0}")]
    Surface(#[from] gpugray_core::Error),
}

impl IoError {
    pub(crate) fn decode(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Self::Io(e),
            image::ImageError::Unsupported(e) => Self::UnsupportedFormat(e.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }

    pub(crate) fn encode(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Self::Io(e),
            image::ImageError::Unsupported(e) => Self::UnsupportedFormat(e.to_string()),
            other => Self::Encode(other.to_string()),
        }
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
