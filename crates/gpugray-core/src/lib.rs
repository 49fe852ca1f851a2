//! # gpugray-core
//!
//! Host-side types for the GPU grayscale pipeline.
//!
//! - [`PixelSurface`], [`Rgba8`] - caller-owned RGBA8 images
//! - [`PackedBuffer`] - the header-prefixed word layout uploaded to the device
//! - [`pack`], [`unpack`] - conversions between the two
//! - [`grayscale`] - CPU reference for the compute kernel
//!
//! ## Crate Structure
//!
//! ```text
//! gpugray-core (this crate)
//!    ^
//!    |
//!    +-- gpugray-compute (wgpu pipeline)
//!    +-- gpugray-io (decode, pre-scale, encode)
//!    +-- gpugray-cli
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gpugray_core::{PixelSurface, Rgba8, pack, unpack};
//!
//! let surface = PixelSurface::new(1, 1, vec![Rgba8::new(10, 20, 30, 255)]).unwrap();
//! let packed = pack(&surface);
//! assert_eq!(packed.header(), [1, 1]);
//! assert_eq!(unpack(&packed), surface);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod grayscale;
pub mod packed;
pub mod surface;

pub use error::{Error, Result};
pub use grayscale::{
    WORKGROUP_SIZE, apply_kernel_reference, gray_level, grayscale_packed_word, grayscale_pixel,
    reference_grayscale,
};
pub use packed::{HEADER_WORDS, PackedBuffer, pack, unpack, unpack_payload};
pub use surface::{PixelSurface, Rgba8};
