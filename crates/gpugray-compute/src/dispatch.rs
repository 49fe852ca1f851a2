//! Dispatch grid and command submission.

use gpugray_core::WORKGROUP_SIZE;
use tracing::debug;

use crate::buffers::BufferSet;
use crate::kernel::ComputeJob;
use crate::session::DeviceSession;
use crate::{ComputeError, ComputeResult};

/// Workgroup counts for a 2D dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGrid {
    pub x: u32,
    pub y: u32,
}

impl DispatchGrid {
    /// `(ceil(width / 16), ceil(height / 16))`.
    pub fn for_image(width: u32, height: u32) -> Self {
        Self {
            x: width.div_ceil(WORKGROUP_SIZE),
            y: height.div_ceil(WORKGROUP_SIZE),
        }
    }

    /// Grid for the image, rejected if either axis exceeds the device limit.
    pub fn checked(width: u32, height: u32, limits: &wgpu::Limits) -> ComputeResult<Self> {
        let grid = Self::for_image(width, height);
        let limit = limits.max_compute_workgroups_per_dimension;
        if grid.x > limit || grid.y > limit {
            return Err(ComputeError::ImageTooLarge { width, height, limit });
        }
        Ok(grid)
    }

    /// Total invocations launched, including the out-of-range ones.
    pub fn invocations(&self) -> u64 {
        self.x as u64 * self.y as u64 * (WORKGROUP_SIZE * WORKGROUP_SIZE) as u64
    }
}

/// Record one dispatch and the output-to-readback copy, then submit once.
pub fn submit(
    session: &DeviceSession,
    job: &ComputeJob<'_>,
    buffers: &BufferSet,
) -> wgpu::SubmissionIndex {
    let grid = job.grid();
    let mut encoder = session.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("grayscale_encoder"),
    });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("grayscale_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(job.pipeline());
        pass.set_bind_group(0, job.bind_group(), &[]);
        pass.dispatch_workgroups(grid.x, grid.y, 1);
    }

    encoder.copy_buffer_to_buffer(
        buffers.output().buffer(),
        0,
        buffers.readback().buffer(),
        0,
        buffers.size(),
    );

    let index = session.queue().submit(std::iter::once(encoder.finish()));
    debug!(groups_x = grid.x, groups_y = grid.y, bytes = buffers.size(), "submitted");
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rounds_up() {
        assert_eq!(DispatchGrid::for_image(10, 10), DispatchGrid { x: 1, y: 1 });
        assert_eq!(DispatchGrid::for_image(16, 16), DispatchGrid { x: 1, y: 1 });
        assert_eq!(DispatchGrid::for_image(17, 33), DispatchGrid { x: 2, y: 3 });
        assert_eq!(DispatchGrid::for_image(1, 1), DispatchGrid { x: 1, y: 1 });
        assert_eq!(DispatchGrid::for_image(500, 375), DispatchGrid { x: 32, y: 24 });
    }

    #[test]
    fn test_grid_covers_image() {
        for (w, h) in [(1, 1), (15, 17), (31, 2), (640, 480)] {
            let grid = DispatchGrid::for_image(w, h);
            assert!(grid.x * WORKGROUP_SIZE >= w);
            assert!(grid.y * WORKGROUP_SIZE >= h);
            assert!((grid.x - 1) * WORKGROUP_SIZE < w);
            assert!((grid.y - 1) * WORKGROUP_SIZE < h);
        }
    }

    #[test]
    fn test_invocations() {
        assert_eq!(DispatchGrid::for_image(10, 10).invocations(), 256);
        assert_eq!(DispatchGrid::for_image(17, 1).invocations(), 512);
    }

    #[test]
    fn test_checked_respects_limit() {
        let limits = wgpu::Limits {
            max_compute_workgroups_per_dimension: 4,
            ..wgpu::Limits::downlevel_defaults()
        };
        assert!(DispatchGrid::checked(64, 64, &limits).is_ok());
        let err = DispatchGrid::checked(65, 1, &limits).unwrap_err();
        assert!(matches!(err, ComputeError::ImageTooLarge { width: 65, height: 1, limit: 4 }));
    }
}
