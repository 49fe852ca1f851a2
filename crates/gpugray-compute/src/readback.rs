//! Result decoding: map the readback buffer, copy it out, unpack.

use gpugray_core::{PackedBuffer, PixelSurface, unpack_payload};
use tracing::debug;

use crate::buffers::BufferSet;
use crate::session::DeviceSession;
use crate::{ComputeError, ComputeResult};

/// Wait for `submission`, then decode the readback buffer into a surface.
///
/// The map request completes only after all submitted work touching the
/// readback buffer has finished, so no extra fence is needed.
pub fn decode(
    session: &DeviceSession,
    buffers: &BufferSet,
    submission: wgpu::SubmissionIndex,
    width: u32,
    height: u32,
) -> ComputeResult<PixelSurface> {
    let packed = read_packed(session, buffers, submission)?;

    if packed.header() != [width, height] {
        return Err(ComputeError::Readback(format!(
            "header echo {:?} does not match {width}x{height}",
            packed.header()
        )));
    }
    Ok(unpack_payload(width, height, packed.payload())?)
}

/// Map the readback buffer and copy its contents into an owned [`PackedBuffer`].
pub fn read_packed(
    session: &DeviceSession,
    buffers: &BufferSet,
    submission: wgpu::SubmissionIndex,
) -> ComputeResult<PackedBuffer> {
    let readback = buffers.readback().buffer();
    let slice = readback.slice(..);

    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |r| {
        let _ = tx.send(r);
    });
    let _ = session.device().poll(wgpu::Maintain::wait_for(submission));

    rx.recv()
        .map_err(|_| ComputeError::Readback("map channel closed".into()))?
        .map_err(|e| ComputeError::Readback(format!("map failed: {e}")))?;

    let packed = {
        let data = slice.get_mapped_range();
        PackedBuffer::from_bytes(&data)
    };
    readback.unmap();
    debug!(bytes = readback.size(), "readback mapped and copied");

    packed.map_err(|e| ComputeError::Readback(e.to_string()))
}
