//! Benchmarks for the distance kernel.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sable_vector::{cosine_distance, inner_product, l2_distance};

fn generate_vectors(dims: usize) -> (Vec<f64>, Vec<f64>) {
    let a: Vec<f64> = (0..dims).map(|i| (i as f64) * 0.1).collect();
    let b: Vec<f64> = (0..dims).map(|i| (i as f64) * 0.2 + 0.5).collect();
    (a, b)
}

fn bench_l2(c: &mut Criterion) {
    let mut group = c.benchmark_group("l2_distance");

    for dims in [8, 64, 128, 512, 1024].iter() {
        let (a, b) = generate_vectors(*dims);
        group.bench_with_input(BenchmarkId::from_parameter(dims), dims, |bencher, _| {
            bencher.iter(|| l2_distance(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

fn bench_inner_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("inner_product");

    for dims in [8, 64, 128, 512, 1024].iter() {
        let (a, b) = generate_vectors(*dims);
        group.bench_with_input(BenchmarkId::from_parameter(dims), dims, |bencher, _| {
            bencher.iter(|| inner_product(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

fn bench_cosine(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine_distance");

    for dims in [8, 64, 128, 512, 1024].iter() {
        let (a, b) = generate_vectors(*dims);
        group.bench_with_input(BenchmarkId::from_parameter(dims), dims, |bencher, _| {
            bencher.iter(|| cosine_distance(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_l2, bench_inner_product, bench_cosine);
criterion_main!(benches);
