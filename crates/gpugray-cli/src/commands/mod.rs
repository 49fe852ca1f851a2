//! CLI command implementations

pub mod convert;
pub mod devices;

use anyhow::{Context, Result};
use gpugray_core::PixelSurface;
use gpugray_io::LoadOptions;
use std::path::Path;

/// Load image from path
pub fn load_image(path: &Path, options: &LoadOptions) -> Result<PixelSurface> {
    gpugray_io::load(path, options)
        .with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, surface: &PixelSurface) -> Result<()> {
    gpugray_io::save(path, surface)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Format a byte count for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
