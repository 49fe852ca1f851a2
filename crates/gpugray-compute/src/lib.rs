//! GPU grayscale pipeline built on wgpu compute shaders.
//!
//! A job moves through a fixed, linear sequence of stages:
//!
//! ```text
//! PixelSurface
//!     └── pack                  (gpugray-core)
//!             └── BufferSet     input / output / readback
//!                     └── ComputeKernel + DispatchGrid   one dispatch, one copy, one submit
//!                             └── readback::decode        map, copy, unmap, unpack
//!                                     └── PixelSurface
//! ```
//!
//! The [`DeviceSession`] is explicit and owned by the caller. Every call
//! allocates its own buffers and compiles its own pipeline; nothing is
//! cached between calls.
//!
//! # Example
//!
//! ```ignore
//! use gpugray_compute::{DeviceSession, SessionConfig, grayscale};
//!
//! let session = DeviceSession::acquire(&SessionConfig::default())?;
//! let gray = grayscale(&session, &surface)?;
//! ```

pub mod buffers;
pub mod dispatch;
pub mod kernel;
pub mod pipeline;
pub mod readback;
pub mod session;

pub use buffers::{BufferSet, DeviceBuffer};
pub use dispatch::DispatchGrid;
pub use kernel::{ComputeJob, ComputeKernel, GRAYSCALE_WGSL};
pub use pipeline::{GrayscaleReport, grayscale, grayscale_timed, grayscale_with};
pub use session::{AdapterSummary, DeviceSession, SessionConfig, SessionStats, enumerate_adapters};

use thiserror::Error;

/// GPU pipeline errors.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("No compute-capable GPU device available: {0}")]
    DeviceUnavailable(String),

    #[error("Failed to allocate {label} buffer ({size} bytes): {reason}")]
    AllocationFailure {
        label: &'static str,
        size: u64,
        reason: String,
    },

    #[error("Failed to compile compute kernel: {0}")]
    KernelCompileFailure(String),

    #[error("Invalid image: {0}")]
    InvalidImage(#[from] gpugray_core::Error),

    #[error("Image too large: {width}x{height} needs more than {limit} workgroups per dimension")]
    ImageTooLarge { width: u32, height: u32, limit: u32 },

    #[error("Readback failed: {0}")]
    Readback(String),
}

impl ComputeError {
    /// `true` when no device could be acquired; callers report this distinctly.
    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, Self::DeviceUnavailable(_))
    }

    pub(crate) fn allocation(label: &'static str, size: u64, reason: impl Into<String>) -> Self {
        Self::AllocationFailure { label, size, reason: reason.into() }
    }
}

pub type ComputeResult<T> = Result<T, ComputeError>;
