//! Grayscale conversion command.
//!
//! Load, pre-scale, run the GPU kernel, optionally check against the CPU
//! reference, then save. Nothing is written unless the conversion succeeds.

use crate::ConvertArgs;
use anyhow::{Context, Result, bail};
use gpugray_compute::{DeviceSession, SessionConfig, grayscale_timed};
use gpugray_core::{PixelSurface, reference_grayscale};
use gpugray_io::LoadOptions;
use tracing::{debug, info, trace, warn};

/// Runs the convert command.
pub fn run(args: ConvertArgs, config: &SessionConfig, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "convert::run");

    let options = if args.no_scale {
        LoadOptions::full_size()
    } else {
        LoadOptions::default().with_max_dimension(Some(args.max_size))
    };
    let image = super::load_image(&args.input, &options)?;
    info!(
        input = %args.input.display(),
        width = image.width(),
        height = image.height(),
        "Loaded image"
    );

    if verbose > 0 {
        println!(
            "Converting {} ({}x{}) -> {}",
            args.input.display(),
            image.width(),
            image.height(),
            args.output.display()
        );
    }

    let session = DeviceSession::acquire(config).context("Failed to acquire GPU device")?;
    debug!(device = %session.describe(), "Acquired device");
    if verbose > 0 {
        println!("  Device: {}", session.describe());
    }

    let (gray, report) = grayscale_timed(&session, &image).context("GPU grayscale failed")?;
    info!(
        total_us = report.total().as_micros() as u64,
        grid = ?report.grid,
        "Converted"
    );
    if verbose > 1 {
        println!(
            "  pack {:?}, allocate {:?}, compile {:?}, submit {:?}, readback {:?}",
            report.pack, report.allocate, report.compile, report.submit, report.readback
        );
    }

    if args.verify {
        verify(&image, &gray)?;
        if verbose > 0 {
            println!("  Verified against CPU reference");
        }
    }

    if let Some(path) = &args.original {
        super::save_image(path, &image)?;
    }
    super::save_image(&args.output, &gray)?;

    if verbose > 0 {
        println!("Done.");
    }
    Ok(())
}

/// Compare a GPU result with the CPU reference and report the first mismatch.
fn verify(input: &PixelSurface, gpu: &PixelSurface) -> Result<()> {
    let expected = reference_grayscale(input);
    if expected.dimensions() != gpu.dimensions() {
        bail!(
            "GPU output is {}x{}, expected {}x{}",
            gpu.width(),
            gpu.height(),
            expected.width(),
            expected.height()
        );
    }

    let mismatches = expected
        .pixels()
        .iter()
        .zip(gpu.pixels())
        .filter(|(e, g)| e != g)
        .count();
    if mismatches > 0 {
        let index = expected
            .pixels()
            .iter()
            .zip(gpu.pixels())
            .position(|(e, g)| e != g)
            .unwrap_or(0);
        let width = expected.width() as usize;
        warn!(mismatches, "GPU output differs from CPU reference");
        bail!(
            "{} pixels differ from the CPU reference (first at {},{}: expected {:?}, got {:?})",
            mismatches,
            index % width,
            index / width,
            expected.pixels()[index],
            gpu.pixels()[index]
        );
    }
    Ok(())
}
