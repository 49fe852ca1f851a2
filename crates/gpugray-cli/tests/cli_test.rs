//! Exit-code and output tests for the `gpugray` binary.

use std::path::Path;
use std::process::{Command, Output};

use gpugray_core::{PixelSurface, Rgba8};

fn gpugray(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gpugray"))
        .args(args)
        .env_remove("GPUGRAY_BACKEND")
        .env_remove("GPUGRAY_POWER")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn write_input(path: &Path) {
    let surface = PixelSurface::filled(8, 4, Rgba8::new(90, 120, 30, 200)).unwrap();
    gpugray_io::save(path, &surface).unwrap();
}

#[test]
fn test_missing_input_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.png");
    let input = dir.path().join("missing.png");

    let result = gpugray(&["convert", input.to_str().unwrap(), "-o", out.to_str().unwrap()]);
    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("Failed to load"));
    assert!(!out.exists());
}

#[test]
fn test_no_backends_is_device_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let out = dir.path().join("out.png");
    write_input(&input);

    let result = gpugray(&[
        "convert",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--backend",
        "none",
    ]);
    assert_eq!(result.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&result.stderr).contains("no compute-capable GPU"));
    assert!(!out.exists());
}

#[test]
fn test_devices_without_backends() {
    let result = gpugray(&["devices", "--backend", "none"]);
    assert_eq!(result.status.code(), Some(2));
}

#[test]
fn test_unknown_backend_is_usage_error() {
    let result = gpugray(&["devices", "--backend", "glide"]);
    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("Unknown backend"));
}

#[test]
fn test_convert_end_to_end() {
    if !gpugray_compute::DeviceSession::is_available(&Default::default()) {
        eprintln!("skipping: no GPU adapter");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let out = dir.path().join("out.png");
    write_input(&input);

    let result = gpugray(&[
        "convert",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--verify",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let gray = gpugray_io::load(&out, &gpugray_io::LoadOptions::default()).unwrap();
    assert_eq!(gray.dimensions(), (8, 4));
    assert!(gray.pixels().iter().all(|p| *p == Rgba8::gray(80, 200)));
}
