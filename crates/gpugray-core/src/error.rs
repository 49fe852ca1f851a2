//! Error types for gpugray-core operations.
//!
//! Covers the failure modes of building and decoding host-side pixel data:
//! zero-sized images, pixel counts that disagree with the declared
//! dimensions, and raw byte buffers that cannot be viewed as 32-bit words.
//!
//! # Usage
//!
//! ```rust
//! use gpugray_core::{Error, PixelSurface};
//!
//! let err = PixelSurface::new(0, 4, Vec::new()).unwrap_err();
//! assert!(matches!(err, Error::InvalidDimensions { .. }));
//! ```
//!
//! # Used By
//!
//! - [`crate::surface::PixelSurface`] - construction checks
//! - [`crate::packed::PackedBuffer`] - header and length checks
//! - `gpugray-compute` - wrapped as `ComputeError::InvalidImage`
//! - `gpugray-io` - wrapped as `IoError::Surface`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or decoding pixel data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Width or height is zero, or `width * height` overflows.
    ///
    /// Zero-sized images are rejected before any device resource exists.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Number of pixels or words does not match the declared dimensions.
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected element count
        expected: usize,
        /// Actual element count
        actual: usize,
    },

    /// Byte buffer length is not a multiple of 4.
    #[error("byte length {0} is not a multiple of 4")]
    MisalignedBytes(usize),
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidDimensions { width, height }
    }

    /// Creates an [`Error::SizeMismatch`] error.
    #[inline]
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Returns `true` if this error describes a zero-sized or oversized image.
    #[inline]
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, Self::InvalidDimensions { .. })
    }
}

/// Returns the pixel count for `width x height`, rejecting zero sizes and overflow.
pub fn checked_pixel_count(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_dimensions(width, height));
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| Error::invalid_dimensions(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions_message() {
        let err = Error::invalid_dimensions(0, 10);
        assert!(err.to_string().contains("0x10"));
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = Error::size_mismatch(6, 4);
        let msg = err.to_string();
        assert!(msg.contains('6'));
        assert!(msg.contains('4'));
        assert!(!err.is_dimension_error());
    }

    #[test]
    fn test_checked_pixel_count() {
        assert_eq!(checked_pixel_count(10, 10), Ok(100));
        assert!(checked_pixel_count(0, 1).is_err());
        assert!(checked_pixel_count(1, 0).is_err());
    }
}
