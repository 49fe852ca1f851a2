//! gpugray - convert images to grayscale on the GPU
//!
//! Decodes an image, pre-scales it for display, runs the wgpu grayscale
//! kernel and writes the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gpugray_compute::session::{parse_backends, parse_power};
use gpugray_compute::{ComputeError, SessionConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod logging;

/// Exit code used when no compute-capable device exists.
const EXIT_DEVICE_UNAVAILABLE: u8 = 2;

#[derive(Parser)]
#[command(name = "gpugray")]
#[command(author, version, about = "Convert images to grayscale with a GPU compute shader")]
#[command(long_about = "
Converts images to grayscale using a wgpu compute pipeline.

Examples:
  gpugray convert photo.jpg -o photo_gray.png      # Pre-scaled to 500px, then converted
  gpugray convert scan.png -o out.png --no-scale   # Keep full resolution
  gpugray convert a.png -o b.png --verify          # Check GPU output against the CPU reference
  gpugray devices                                  # List usable adapters
  GPUGRAY_BACKEND=vulkan gpugray convert a.png -o b.png
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    gpu: GpuArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image to grayscale
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// List compute adapters
    #[command(visible_alias = "d")]
    Devices(DevicesArgs),
}

/// Device selection flags shared by all commands.
#[derive(Args, Clone, Debug)]
struct GpuArgs {
    /// Backends to use: vulkan, metal, dx12, gl, primary, all (comma-separated)
    #[arg(long, global = true, env = "GPUGRAY_BACKEND")]
    backend: Option<String>,

    /// Power preference: low, high
    #[arg(long, global = true, env = "GPUGRAY_POWER")]
    power: Option<String>,

    /// Only accept a software fallback adapter
    #[arg(long, global = true)]
    fallback_adapter: bool,
}

impl GpuArgs {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = SessionConfig::default().with_fallback_adapter(self.fallback_adapter);
        if let Some(name) = &self.backend {
            let backends = parse_backends(name)
                .with_context(|| format!("Unknown backend '{name}'"))?;
            config = config.with_backends(backends);
        }
        if let Some(name) = &self.power {
            let power = parse_power(name)
                .with_context(|| format!("Unknown power preference '{name}'"))?;
            config = config.with_power_preference(power);
        }
        Ok(config)
    }
}

#[derive(Args)]
struct ConvertArgs {
    /// Input image
    input: PathBuf,

    /// Output image (format from extension, PNG if none)
    #[arg(short, long)]
    output: PathBuf,

    /// Shrink so neither side exceeds this many pixels
    #[arg(short = 's', long, default_value_t = gpugray_io::DEFAULT_MAX_DIMENSION)]
    max_size: u32,

    /// Keep the decoded size
    #[arg(long, conflicts_with = "max_size")]
    no_scale: bool,

    /// Also save the pre-scaled color input here
    #[arg(long)]
    original: Option<PathBuf>,

    /// Compare the GPU result with the CPU reference
    #[arg(long)]
    verify: bool,
}

#[derive(Args)]
struct DevicesArgs {
    /// Show limits for each adapter
    #[arg(short, long)]
    limits: bool,
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.gpu.session_config()?;
    match cli.command {
        Commands::Convert(args) => commands::convert::run(args, &config, cli.verbose),
        Commands::Devices(args) => commands::devices::run(args, &config, cli.verbose),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = match logging::init(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let device_unavailable = e
                .chain()
                .filter_map(|cause| cause.downcast_ref::<ComputeError>())
                .any(ComputeError::is_device_unavailable);
            if device_unavailable {
                eprintln!("error: no compute-capable GPU is available on this system.");
                eprintln!("       {e:#}");
                eprintln!("       Try --backend all, --fallback-adapter, or check your GPU drivers.");
                ExitCode::from(EXIT_DEVICE_UNAVAILABLE)
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
