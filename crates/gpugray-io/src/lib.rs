//! Image I/O around the grayscale pipeline.
//!
//! Everything here runs on the host and sits outside the GPU core:
//!
//! - [`load`] / [`decode`] - decode PNG, JPEG, BMP, GIF or WebP into a
//!   [`PixelSurface`](gpugray_core::PixelSurface), pre-scaled per [`LoadOptions`]
//! - [`fit_dimensions`] / [`fit_within`] - uniform downscale to a display bound
//! - [`encode_png`] / [`save`] - turn a result back into a file or blob
//!
//! # Example
//!
//! ```rust,ignore
//! use gpugray_io::{load, save, LoadOptions};
//!
//! let surface = load("photo.jpg", &LoadOptions::default())?;
//! save("photo_gray.png", &surface)?;
//! ```

mod encode;
mod error;
mod load;
mod scale;

pub use encode::{encode_png, save};
pub use error::{IoError, IoResult};
pub use load::{DEFAULT_MAX_DIMENSION, LoadOptions, decode, load};
pub use scale::{fit_dimensions, fit_within};
