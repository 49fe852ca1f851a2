//! Decoding images into RGBA8 surfaces.

use std::path::Path;

use gpugray_core::PixelSurface;
use image::{DynamicImage, ImageReader};
use tracing::{debug, trace};

use crate::scale::fit_within;
use crate::{IoError, IoResult};

/// Longest side allowed before pre-scaling kicks in.
pub const DEFAULT_MAX_DIMENSION: u32 = 500;

/// Options applied after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Shrink so neither side exceeds this; `None` keeps the decoded size.
    pub max_dimension: Option<u32>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { max_dimension: Some(DEFAULT_MAX_DIMENSION) }
    }
}

impl LoadOptions {
    /// Keep decoded images at full size.
    pub fn full_size() -> Self {
        Self { max_dimension: None }
    }

    pub fn with_max_dimension(mut self, max: Option<u32>) -> Self {
        self.max_dimension = max;
        self
    }
}

/// Decode a file; format is sniffed from content, then from the extension.
pub fn load<P: AsRef<Path>>(path: P, options: &LoadOptions) -> IoResult<PixelSurface> {
    let path = path.as_ref();
    trace!(path = %path.display(), "load");
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(IoError::decode)?;
    finish(image, options)
}

/// Decode an in-memory encoded image.
pub fn decode(bytes: &[u8], options: &LoadOptions) -> IoResult<PixelSurface> {
    let image = image::load_from_memory(bytes).map_err(IoError::decode)?;
    finish(image, options)
}

fn finish(image: DynamicImage, options: &LoadOptions) -> IoResult<PixelSurface> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!(width, height, "decoded");

    let surface = PixelSurface::from_rgba_bytes(width, height, rgba.as_raw())?;
    match options.max_dimension {
        Some(max) if max > 0 => fit_within(&surface, max),
        _ => Ok(surface),
    }
}
