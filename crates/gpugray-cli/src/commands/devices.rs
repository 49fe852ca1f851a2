//! Adapter listing.

use crate::DevicesArgs;
use anyhow::Result;
use gpugray_compute::{ComputeError, DeviceSession, SessionConfig, enumerate_adapters};
use tracing::{info, trace};

use super::format_size;

/// Runs the devices command.
///
/// Lists every adapter the configured backends expose, then reports which
/// one a conversion would pick. Finding none is a device-unavailable error.
pub fn run(args: DevicesArgs, config: &SessionConfig, verbose: u8) -> Result<()> {
    trace!(backends = ?config.backends, "devices::run");

    let adapters = enumerate_adapters(config);
    info!(count = adapters.len(), "Enumerated adapters");
    if adapters.is_empty() {
        return Err(ComputeError::DeviceUnavailable(format!(
            "no adapters found for backends {:?}",
            config.backends
        ))
        .into());
    }

    for (i, adapter) in adapters.iter().enumerate() {
        println!("[{i}] {adapter}");
        if args.limits || verbose > 0 {
            println!("      max buffer size:        {}", format_size(adapter.max_buffer_size));
            println!("      max workgroups per dim: {}", adapter.max_workgroups_per_dimension);
        }
    }

    match DeviceSession::acquire(config) {
        Ok(session) => println!("Selected: {}", session.describe()),
        Err(e) => println!("Selected: none ({e})"),
    }
    Ok(())
}
