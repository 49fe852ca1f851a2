//! Benchmarks for the grayscale pipeline.
//!
//! Run with: `cargo bench -p gpugray-bench`
//!
//! The `gpu` group is skipped when no adapter is available.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use gpugray_compute::{DeviceSession, SessionConfig, grayscale};
use gpugray_core::{PixelSurface, Rgba8, pack, reference_grayscale, unpack};

const SIZES: [u32; 3] = [64, 500, 2048];

fn noise(size: u32) -> PixelSurface {
    let mut state = 0x2545_f491_u32;
    let pixels = (0..size * size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, a] = state.to_le_bytes();
            Rgba8::new(r, g, b, a)
        })
        .collect();
    PixelSurface::new(size, size, pixels).unwrap()
}

/// Benchmark host-side packing and unpacking.
fn bench_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("packing");

    for size in SIZES {
        let surface = noise(size);
        let packed = pack(&surface);
        group.throughput(Throughput::Elements(u64::from(size) * u64::from(size)));

        group.bench_with_input(BenchmarkId::new("pack", size), &surface, |b, s| {
            b.iter(|| pack(black_box(s)))
        });

        group.bench_with_input(BenchmarkId::new("unpack", size), &packed, |b, p| {
            b.iter(|| unpack(black_box(p)))
        });
    }

    group.finish();
}

/// Benchmark the CPU reference conversion.
fn bench_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference");

    for size in SIZES {
        let surface = noise(size);
        group.throughput(Throughput::Elements(u64::from(size) * u64::from(size)));
        group.bench_with_input(BenchmarkId::new("grayscale", size), &surface, |b, s| {
            b.iter(|| reference_grayscale(black_box(s)))
        });
    }

    group.finish();
}

/// Benchmark a full GPU job (allocate, compile, dispatch, readback) on one session.
fn bench_gpu(c: &mut Criterion) {
    let session = match DeviceSession::acquire(&SessionConfig::from_env()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("skipping gpu benchmarks: {e}");
            return;
        }
    };

    let mut group = c.benchmark_group("gpu");
    group.sample_size(20);

    for size in SIZES {
        let surface = noise(size);
        group.throughput(Throughput::Elements(u64::from(size) * u64::from(size)));
        group.bench_with_input(BenchmarkId::new("grayscale", size), &surface, |b, s| {
            b.iter(|| grayscale(&session, black_box(s)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_packing, bench_reference, bench_gpu);
criterion_main!(benches);
