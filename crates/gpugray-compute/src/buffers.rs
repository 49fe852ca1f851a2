//! Per-job device buffers.
//!
//! Three buffers of identical byte length back one job:
//!
//! - **input**: `STORAGE | COPY_DST`, filled through a mapping at creation and
//!   unmapped before anything is submitted
//! - **output**: `STORAGE | COPY_SRC`, written by the kernel; its two header
//!   words are seeded at creation and never touched afterwards
//! - **readback**: `COPY_DST | MAP_READ`, the copy target the host maps
//!
//! Buffers are destroyed when dropped. If creating the second or third
//! buffer fails, the ones already created drop before the error returns.

use std::sync::Arc;

use gpugray_core::{HEADER_WORDS, PackedBuffer};
use tracing::{debug, trace};

use crate::session::{DeviceSession, SessionStats};
use crate::{ComputeError, ComputeResult};

/// A wgpu buffer that is destroyed and counted as released on drop.
pub struct DeviceBuffer {
    buffer: wgpu::Buffer,
    label: &'static str,
    stats: Arc<SessionStats>,
}

impl DeviceBuffer {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
        self.stats.record_release();
        trace!(label = self.label, size = self.buffer.size(), "buffer released");
    }
}

impl std::fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("label", &self.label)
            .field("size", &self.buffer.size())
            .finish()
    }
}

/// Input, output and readback buffers for one job.
#[derive(Debug)]
pub struct BufferSet {
    input: DeviceBuffer,
    output: DeviceBuffer,
    readback: DeviceBuffer,
}

impl BufferSet {
    /// Allocate all three buffers sized to `packed`, uploading it into the input.
    pub fn allocate(session: &DeviceSession, packed: &PackedBuffer) -> ComputeResult<Self> {
        let size = packed.byte_len();
        let input = Self::create_input(session, packed.as_bytes())?;
        let output = Self::create_output(session, size, packed.header())?;
        let readback = Self::create_readback(session, size)?;
        debug!(size, "buffer set allocated");
        Ok(Self { input, output, readback })
    }

    /// Storage buffer written through a mapping at creation, then unmapped.
    pub fn create_input(session: &DeviceSession, bytes: &[u8]) -> ComputeResult<DeviceBuffer> {
        let size = bytes.len() as u64;
        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        let buffer = create_buffer(session, "input", size, usage, true)?;
        buffer.slice(..).get_mapped_range_mut().copy_from_slice(bytes);
        buffer.unmap();
        Ok(wrap(session, buffer, "input"))
    }

    /// Storage buffer the kernel writes; header words seeded with `header`.
    pub fn create_output(
        session: &DeviceSession,
        size: u64,
        header: [u32; HEADER_WORDS],
    ) -> ComputeResult<DeviceBuffer> {
        let usage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;
        let buffer = create_buffer(session, "output", size, usage, true)?;
        let header_bytes: &[u8] = bytemuck::cast_slice(&header);
        buffer
            .slice(..header_bytes.len() as u64)
            .get_mapped_range_mut()
            .copy_from_slice(header_bytes);
        buffer.unmap();
        Ok(wrap(session, buffer, "output"))
    }

    /// Host-mappable copy destination.
    pub fn create_readback(session: &DeviceSession, size: u64) -> ComputeResult<DeviceBuffer> {
        let usage = wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ;
        let buffer = create_buffer(session, "readback", size, usage, false)?;
        Ok(wrap(session, buffer, "readback"))
    }

    pub fn input(&self) -> &DeviceBuffer {
        &self.input
    }

    pub fn output(&self) -> &DeviceBuffer {
        &self.output
    }

    pub fn readback(&self) -> &DeviceBuffer {
        &self.readback
    }

    /// Byte length shared by all three buffers.
    pub fn size(&self) -> u64 {
        self.input.size()
    }
}

fn wrap(session: &DeviceSession, buffer: wgpu::Buffer, label: &'static str) -> DeviceBuffer {
    session.stats().record_allocation();
    trace!(label, size = buffer.size(), "buffer allocated");
    DeviceBuffer { buffer, label, stats: session.stats_handle() }
}

/// Create a buffer, turning limit violations and out-of-memory into `AllocationFailure`.
fn create_buffer(
    session: &DeviceSession,
    label: &'static str,
    size: u64,
    usage: wgpu::BufferUsages,
    mapped_at_creation: bool,
) -> ComputeResult<wgpu::Buffer> {
    check_size(&session.limits(), label, size, usage)?;

    let device = session.device();
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation,
    });
    let validation = pollster::block_on(device.pop_error_scope());
    let oom = pollster::block_on(device.pop_error_scope());

    if let Some(err) = oom.or(validation) {
        buffer.destroy();
        return Err(ComputeError::allocation(label, size, err.to_string()));
    }
    Ok(buffer)
}

/// Reject sizes the device cannot hold before asking it to allocate.
fn check_size(
    limits: &wgpu::Limits,
    label: &'static str,
    size: u64,
    usage: wgpu::BufferUsages,
) -> ComputeResult<()> {
    if size == 0 || size % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
        return Err(ComputeError::allocation(label, size, "size must be a non-zero multiple of 4"));
    }
    if size > limits.max_buffer_size {
        return Err(ComputeError::allocation(
            label,
            size,
            format!("exceeds max_buffer_size {}", limits.max_buffer_size),
        ));
    }
    if usage.contains(wgpu::BufferUsages::STORAGE)
        && size > limits.max_storage_buffer_binding_size as u64
    {
        return Err(ComputeError::allocation(
            label,
            size,
            format!(
                "exceeds max_storage_buffer_binding_size {}",
                limits.max_storage_buffer_binding_size
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> wgpu::Limits {
        wgpu::Limits {
            max_buffer_size: 1024,
            max_storage_buffer_binding_size: 512,
            ..wgpu::Limits::downlevel_defaults()
        }
    }

    #[test]
    fn test_check_size_accepts_aligned() {
        assert!(check_size(&limits(), "input", 512, wgpu::BufferUsages::STORAGE).is_ok());
        assert!(check_size(&limits(), "readback", 1024, wgpu::BufferUsages::MAP_READ).is_ok());
    }

    #[test]
    fn test_check_size_rejects_storage_over_binding_limit() {
        let err = check_size(&limits(), "output", 516, wgpu::BufferUsages::STORAGE).unwrap_err();
        assert!(matches!(err, ComputeError::AllocationFailure { label: "output", size: 516, .. }));
    }

    #[test]
    fn test_check_size_rejects_over_max_buffer() {
        let err = check_size(&limits(), "readback", 2048, wgpu::BufferUsages::COPY_DST).unwrap_err();
        assert!(err.to_string().contains("max_buffer_size"));
    }

    #[test]
    fn test_check_size_rejects_unaligned_and_zero() {
        assert!(check_size(&limits(), "input", 0, wgpu::BufferUsages::STORAGE).is_err());
        assert!(check_size(&limits(), "input", 6, wgpu::BufferUsages::STORAGE).is_err());
    }
}
