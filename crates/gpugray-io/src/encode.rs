//! Encoding surfaces for display or transfer.

use std::path::Path;

use gpugray_core::PixelSurface;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use tracing::trace;

use crate::{IoError, IoResult};

/// Encode as an RGBA PNG in memory.
pub fn encode_png(surface: &PixelSurface) -> IoResult<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            surface.as_rgba_bytes(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(IoError::encode)?;
    Ok(out)
}

/// Write to `path`, choosing the format from its extension (PNG when absent).
///
/// Formats without alpha (JPEG) get the RGB channels only.
pub fn save<P: AsRef<Path>>(path: P, surface: &PixelSurface) -> IoResult<()> {
    let path = path.as_ref();
    let format = match path.extension() {
        None => ImageFormat::Png,
        Some(_) => ImageFormat::from_path(path)
            .map_err(|_| IoError::UnsupportedFormat(path.display().to_string()))?,
    };
    trace!(path = %path.display(), ?format, "save");

    let rgba = RgbaImage::from_raw(surface.width(), surface.height(), surface.to_rgba_bytes())
        .ok_or_else(|| IoError::Encode("pixel buffer does not match dimensions".into()))?;

    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(rgba)
            .to_rgb8()
            .save_with_format(path, format)
            .map_err(IoError::encode),
        _ => rgba.save_with_format(path, format).map_err(IoError::encode),
    }
}
