//! End-to-end grayscale job.
//!
//! Stages run strictly in order and each one either returns a value for
//! the next or fails the whole job:
//!
//! 1. validate the surface
//! 2. pack into the device layout
//! 3. allocate input / output / readback
//! 4. compile the kernel and bind buffers
//! 5. record one dispatch plus the readback copy, submit
//! 6. wait for the mapping, copy out, unpack
//!
//! Buffers and the pipeline are dropped when the job returns, on success or
//! failure.

use std::time::{Duration, Instant};

use gpugray_core::{PixelSurface, pack};
use tracing::{debug, info_span};

use crate::buffers::BufferSet;
use crate::dispatch::{self, DispatchGrid};
use crate::kernel::ComputeKernel;
use crate::readback;
use crate::session::{DeviceSession, SessionConfig};
use crate::ComputeResult;

/// Wall-clock time spent in each stage of one job.
#[derive(Debug, Clone, Default)]
pub struct GrayscaleReport {
    pub pack: Duration,
    pub allocate: Duration,
    pub compile: Duration,
    pub submit: Duration,
    pub readback: Duration,
    pub grid: Option<DispatchGrid>,
}

impl GrayscaleReport {
    pub fn total(&self) -> Duration {
        self.pack + self.allocate + self.compile + self.submit + self.readback
    }
}

/// Convert `surface` to grayscale on `session`'s device.
pub fn grayscale(session: &DeviceSession, surface: &PixelSurface) -> ComputeResult<PixelSurface> {
    grayscale_timed(session, surface).map(|(out, _)| out)
}

/// Like [`grayscale`], also returning per-stage timings.
pub fn grayscale_timed(
    session: &DeviceSession,
    surface: &PixelSurface,
) -> ComputeResult<(PixelSurface, GrayscaleReport)> {
    let (width, height) = surface.dimensions();
    let _span = info_span!("grayscale", width, height).entered();
    let mut report = GrayscaleReport::default();

    surface.validate()?;
    let grid = DispatchGrid::checked(width, height, &session.limits())?;
    report.grid = Some(grid);

    let t = Instant::now();
    let packed = pack(surface);
    report.pack = t.elapsed();
    debug!(bytes = packed.byte_len(), "packed");

    let t = Instant::now();
    let buffers = BufferSet::allocate(session, &packed)?;
    report.allocate = t.elapsed();

    let t = Instant::now();
    let kernel = ComputeKernel::compile(session)?;
    let job = kernel.bind(session, &buffers, grid);
    report.compile = t.elapsed();

    let t = Instant::now();
    let submission = dispatch::submit(session, &job, &buffers);
    report.submit = t.elapsed();

    let t = Instant::now();
    let out = readback::decode(session, &buffers, submission, width, height)?;
    report.readback = t.elapsed();

    debug!(total_us = report.total().as_micros() as u64, "job complete");
    Ok((out, report))
}

/// Validate, acquire a fresh session from `config`, run one job, release everything.
///
/// The surface is checked before the device is touched, so an invalid
/// image never causes device acquisition.
pub fn grayscale_with(config: &SessionConfig, surface: &PixelSurface) -> ComputeResult<PixelSurface> {
    surface.validate()?;
    let session = DeviceSession::acquire(config)?;
    grayscale(&session, surface)
}
