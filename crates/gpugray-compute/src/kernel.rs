//! Grayscale compute kernel.

use tracing::debug;

use crate::buffers::BufferSet;
use crate::dispatch::DispatchGrid;
use crate::session::DeviceSession;
use crate::{ComputeError, ComputeResult};

/// Entry point name in [`GRAYSCALE_WGSL`].
pub const ENTRY_POINT: &str = "main";

/// Packed RGBA to packed gray, one invocation per pixel.
///
/// Width and height are read from input words 0 and 1. Invocations past the
/// image edge return before touching memory; the output header is never
/// written.
pub const GRAYSCALE_WGSL: &str = r#"
@group(0) @binding(0) var<storage, read> input_pixels: array<u32>;
@group(0) @binding(1) var<storage, read_write> output_pixels: array<u32>;

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let width = input_pixels[0];
    let height = input_pixels[1];
    let x = id.x;
    let y = id.y;

    if x >= width || y >= height {
        return;
    }

    let idx = y * width + x + 2u;
    let pixel = input_pixels[idx];

    let r = f32(pixel & 0xFFu);
    let g = f32((pixel >> 8u) & 0xFFu);
    let b = f32((pixel >> 16u) & 0xFFu);
    let a = (pixel >> 24u) & 0xFFu;

    let gray = u32((r + g + b) / 3.0);

    output_pixels[idx] = (a << 24u) | (gray << 16u) | (gray << 8u) | gray;
}
"#;

/// Compiled grayscale pipeline.
///
/// Compiled fresh for every job; nothing is cached on the session.
pub struct ComputeKernel {
    pipeline: wgpu::ComputePipeline,
}

impl ComputeKernel {
    /// Compile the WGSL module and build the pipeline with an auto layout.
    pub fn compile(session: &DeviceSession) -> ComputeResult<Self> {
        Self::compile_source(session, GRAYSCALE_WGSL)
    }

    pub(crate) fn compile_source(session: &DeviceSession, source: &str) -> ComputeResult<Self> {
        let device = session.device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grayscale_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("grayscale_pipeline"),
            layout: None,
            module: &module,
            entry_point: Some(ENTRY_POINT),
            compilation_options: Default::default(),
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ComputeError::KernelCompileFailure(err.to_string()));
        }
        debug!("grayscale kernel compiled");
        Ok(Self { pipeline })
    }

    pub fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    /// Bind input to slot 0 and output to slot 1.
    pub fn bind<'k>(
        &'k self,
        session: &DeviceSession,
        buffers: &BufferSet,
        grid: DispatchGrid,
    ) -> ComputeJob<'k> {
        let layout = self.pipeline.get_bind_group_layout(0);
        let bind_group = session.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grayscale_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: buffers.input().buffer().as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: buffers.output().buffer().as_entire_binding() },
            ],
        });
        ComputeJob { pipeline: &self.pipeline, bind_group, grid }
    }
}

/// A compiled kernel with its resources bound and its grid fixed.
pub struct ComputeJob<'k> {
    pipeline: &'k wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    grid: DispatchGrid,
}

impl ComputeJob<'_> {
    pub fn pipeline(&self) -> &wgpu::ComputePipeline {
        self.pipeline
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn grid(&self) -> DispatchGrid {
        self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpugray_core::WORKGROUP_SIZE;

    #[test]
    fn test_shader_workgroup_matches_grid() {
        let decl = format!("@workgroup_size({WORKGROUP_SIZE}, {WORKGROUP_SIZE})");
        assert!(GRAYSCALE_WGSL.contains(&decl));
    }

    #[test]
    fn test_shader_bindings() {
        assert!(GRAYSCALE_WGSL.contains("@binding(0) var<storage, read> input_pixels"));
        assert!(GRAYSCALE_WGSL.contains("@binding(1) var<storage, read_write> output_pixels"));
        assert!(GRAYSCALE_WGSL.contains(&format!("fn {ENTRY_POINT}(")));
    }

    #[test]
    fn test_broken_source_is_compile_failure() {
        let Ok(session) = DeviceSession::acquire(&crate::SessionConfig::default()) else {
            eprintln!("no GPU adapter, skipping");
            return;
        };
        let err = ComputeKernel::compile_source(&session, "fn main( {").err().unwrap();
        assert!(matches!(err, ComputeError::KernelCompileFailure(_)));
        assert!(ComputeKernel::compile(&session).is_ok());
    }
}
