//! Display pre-scaling.
//!
//! Images larger than the display threshold are shrunk uniformly so the
//! longer side equals the threshold. Smaller images are left alone; this
//! never upscales.

use gpugray_core::PixelSurface;
use image::{RgbaImage, imageops};
use tracing::debug;

use crate::{IoError, IoResult};

/// Target dimensions for fitting `width x height` inside `max x max`.
///
/// The ratio is `min(max / width, max / height)` and each side is rounded
/// to the nearest integer, never below 1.
pub fn fit_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let ratio = (max as f64 / width as f64).min(max as f64 / height as f64);
    let w = (width as f64 * ratio).round().max(1.0) as u32;
    let h = (height as f64 * ratio).round().max(1.0) as u32;
    (w, h)
}

/// Resample `surface` so neither side exceeds `max`.
pub fn fit_within(surface: &PixelSurface, max: u32) -> IoResult<PixelSurface> {
    let (width, height) = surface.dimensions();
    let (w, h) = fit_dimensions(width, height, max);
    if (w, h) == (width, height) {
        return Ok(surface.clone());
    }

    let src = RgbaImage::from_raw(width, height, surface.to_rgba_bytes())
        .ok_or_else(|| IoError::Decode("pixel buffer does not match dimensions".into()))?;
    let resized = imageops::resize(&src, w, h, imageops::FilterType::Triangle);
    debug!(from_w = width, from_h = height, to_w = w, to_h = h, "pre-scaled");

    Ok(PixelSurface::from_rgba_bytes(w, h, resized.as_raw())?)
}
