//! Device acquisition.
//!
//! A [`DeviceSession`] wraps the adapter, device and queue for one caller.
//! Acquiring it is the first of the two suspension points in a job; the
//! async variant is exposed for callers that already run an executor and
//! the blocking variant drives it with `pollster`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::{ComputeError, ComputeResult};

/// Environment variable selecting backends (`vulkan,metal,dx12,gl`, `primary`, `all`).
pub const BACKEND_ENV: &str = "GPUGRAY_BACKEND";
/// Environment variable selecting the power preference (`low` or `high`).
pub const POWER_ENV: &str = "GPUGRAY_POWER";

/// Device selection settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backends the instance may use.
    pub backends: wgpu::Backends,
    /// Adapter power preference.
    pub power_preference: wgpu::PowerPreference,
    /// Accept only a software (fallback) adapter.
    pub force_fallback_adapter: bool,
    /// Debug label for the device.
    pub label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            label: "gpugray_device".to_string(),
        }
    }
}

impl SessionConfig {
    /// Default config with `GPUGRAY_BACKEND` / `GPUGRAY_POWER` overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(BACKEND_ENV) {
            match parse_backends(&value) {
                Some(backends) => config.backends = backends,
                None => warn!(%value, "ignoring unrecognized {BACKEND_ENV}"),
            }
        }
        if let Ok(value) = std::env::var(POWER_ENV) {
            match parse_power(&value) {
                Some(power) => config.power_preference = power,
                None => warn!(%value, "ignoring unrecognized {POWER_ENV}"),
            }
        }
        config
    }

    pub fn with_backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_power_preference(mut self, power: wgpu::PowerPreference) -> Self {
        self.power_preference = power;
        self
    }

    pub fn with_fallback_adapter(mut self, force: bool) -> Self {
        self.force_fallback_adapter = force;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    fn instance(&self) -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: self.backends,
            ..Default::default()
        })
    }
}

/// Parses a comma-separated backend list. Returns `None` if any entry is unknown.
pub fn parse_backends(value: &str) -> Option<wgpu::Backends> {
    let mut backends = wgpu::Backends::empty();
    for name in value.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        backends |= match name.as_str() {
            "vulkan" | "vk" => wgpu::Backends::VULKAN,
            "metal" | "mtl" => wgpu::Backends::METAL,
            "dx12" | "d3d12" => wgpu::Backends::DX12,
            "gl" | "gles" | "opengl" => wgpu::Backends::GL,
            "primary" => wgpu::Backends::PRIMARY,
            "secondary" => wgpu::Backends::SECONDARY,
            "all" => wgpu::Backends::all(),
            "none" => wgpu::Backends::empty(),
            _ => return None,
        };
    }
    Some(backends)
}

/// Parses `low` / `high` (and a few aliases).
pub fn parse_power(value: &str) -> Option<wgpu::PowerPreference> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Some(wgpu::PowerPreference::LowPower),
        "high" | "high-performance" | "discrete" => Some(wgpu::PowerPreference::HighPerformance),
        "none" => Some(wgpu::PowerPreference::None),
        _ => None,
    }
}

/// Buffer allocation counters for one session.
///
/// Every [`crate::DeviceBuffer`] bumps `allocated` when created and
/// `released` when dropped.
#[derive(Debug, Default)]
pub struct SessionStats {
    allocated: AtomicU64,
    released: AtomicU64,
}

impl SessionStats {
    pub fn buffers_allocated(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }

    pub fn buffers_released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Buffers created and not yet dropped.
    pub fn buffers_live(&self) -> u64 {
        self.buffers_allocated().saturating_sub(self.buffers_released())
    }

    pub(crate) fn record_allocation(&self) {
        self.allocated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }
}

/// Caller-owned handle to a compute device and its queue.
pub struct DeviceSession {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
    stats: Arc<SessionStats>,
}

impl DeviceSession {
    /// Acquire a device, blocking the current thread.
    pub fn acquire(config: &SessionConfig) -> ComputeResult<Self> {
        pollster::block_on(Self::acquire_async(config))
    }

    /// Acquire a device asynchronously.
    pub async fn acquire_async(config: &SessionConfig) -> ComputeResult<Self> {
        if config.backends.is_empty() {
            return Err(ComputeError::DeviceUnavailable("no backends enabled".into()));
        }

        let instance = config.instance();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await
            .ok_or_else(|| {
                ComputeError::DeviceUnavailable(format!(
                    "no adapter for backends {:?}",
                    config.backends
                ))
            })?;

        let adapter_info = adapter.get_info();
        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
            return Err(ComputeError::DeviceUnavailable(format!(
                "adapter {} does not support compute shaders",
                adapter_info.name
            )));
        }
        debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "adapter selected"
        );

        // Storage-buffer size is what bounds the largest image; ask for what the adapter has.
        let adapter_limits = adapter.limits();
        let required_limits = wgpu::Limits {
            max_buffer_size: adapter_limits.max_buffer_size,
            max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
            ..wgpu::Limits::downlevel_defaults()
        };

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some(config.label.as_str()),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::DeviceUnavailable(e.to_string()))?;

        info!(device = %adapter_info.name, backend = ?adapter_info.backend, "device acquired");

        Ok(Self {
            device,
            queue,
            adapter_info,
            stats: Arc::new(SessionStats::default()),
        })
    }

    /// `true` if any adapter is reachable with `config`.
    pub fn is_available(config: &SessionConfig) -> bool {
        if config.backends.is_empty() {
            return false;
        }
        pollster::block_on(async {
            config
                .instance()
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: config.power_preference,
                    compatible_surface: None,
                    force_fallback_adapter: config.force_fallback_adapter,
                })
                .await
                .is_some()
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Adapter info (GPU name, vendor, backend).
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Limits the device was created with.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub(crate) fn stats_handle(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }

    /// One-line description, e.g. `NVIDIA GeForce RTX 3080 (Vulkan, DiscreteGpu)`.
    pub fn describe(&self) -> String {
        format!(
            "{} ({:?}, {:?})",
            self.adapter_info.name, self.adapter_info.backend, self.adapter_info.device_type
        )
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device", &self.adapter_info.name)
            .field("backend", &self.adapter_info.backend)
            .field("buffers_live", &self.stats.buffers_live())
            .finish()
    }
}

/// Summary of one adapter, for listing.
#[derive(Debug, Clone)]
pub struct AdapterSummary {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub driver: String,
    pub max_buffer_size: u64,
    pub max_workgroups_per_dimension: u32,
}

impl std::fmt::Display for AdapterSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{:?}, {:?}]", self.name, self.backend, self.device_type)?;
        if !self.driver.is_empty() {
            write!(f, " driver {}", self.driver)?;
        }
        Ok(())
    }
}

/// List every adapter reachable with the configured backends.
pub fn enumerate_adapters(config: &SessionConfig) -> Vec<AdapterSummary> {
    if config.backends.is_empty() {
        return Vec::new();
    }
    config
        .instance()
        .enumerate_adapters(config.backends)
        .into_iter()
        .map(|adapter| {
            let info = adapter.get_info();
            let limits = adapter.limits();
            AdapterSummary {
                name: info.name,
                backend: info.backend,
                device_type: info.device_type,
                driver: info.driver,
                max_buffer_size: limits.max_buffer_size,
                max_workgroups_per_dimension: limits.max_compute_workgroups_per_dimension,
            }
        })
        .collect()
}
