//! Benchmarks for padding and depthwise correlation
//!
//! These benchmarks cover the two primitives underneath every gradient
//! operator, across image sizes and batch × channel counts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use imgrad_core::{DenseND, PaddingMode};

fn test_image(shape: &[usize]) -> DenseND<f64> {
    DenseND::from_fn(shape, |idx| {
        ((idx.iter().sum::<usize>() * 2654435761) % 1000) as f64 / 1000.0
    })
}

fn sobel_x() -> DenseND<f64> {
    DenseND::from_vec(
        vec![-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0],
        &[3, 3],
    )
    .unwrap()
}

/// Benchmark correlation over growing image sizes
fn bench_correlate_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("depthwise_correlate2d_by_size");
    let kernel = sobel_x();

    for size in [32usize, 64, 128, 256] {
        let input = test_image(&[1, 1, size + 2, size + 2]);
        group.bench_with_input(
            BenchmarkId::new("correlate", format!("{}x{}", size, size)),
            &input,
            |b, input| {
                b.iter(|| {
                    let output = input.depthwise_correlate2d(&kernel).unwrap();
                    std::hint::black_box(output);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark correlation over batch × channel planes (parallel axis)
fn bench_correlate_planes(c: &mut Criterion) {
    let mut group = c.benchmark_group("depthwise_correlate2d_by_planes");
    let kernel = sobel_x();

    for (batch, channels) in [(1usize, 1usize), (1, 3), (8, 3), (16, 16)] {
        let input = test_image(&[batch, channels, 66, 66]);
        group.bench_with_input(
            BenchmarkId::new("planes", batch * channels),
            &input,
            |b, input| {
                b.iter(|| {
                    let output = input.depthwise_correlate2d(&kernel).unwrap();
                    std::hint::black_box(output);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark padding modes
fn bench_pad_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pad2d");
    let input = test_image(&[4, 3, 128, 128]);

    for mode in [PaddingMode::Zeros, PaddingMode::Replicate, PaddingMode::Reflect] {
        group.bench_with_input(
            BenchmarkId::new("mode", format!("{:?}", mode)),
            &mode,
            |b, &mode| {
                b.iter(|| {
                    let output = input.pad2d(1, mode).unwrap();
                    std::hint::black_box(output);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_correlate_sizes,
    bench_correlate_planes,
    bench_pad_modes
);
criterion_main!(benches);
