//! HNSW benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sable_hnsw::{HnswIndex, HnswOptions};
use sable_vector::{Metric, Rid, VectorIndex};

fn generate_vectors(n: usize, dims: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..dims).map(|j| ((i * j) % 100) as f64 / 100.0).collect())
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_insert");
    let options = HnswOptions { m: 16, ef_construction: 100, ef_search: 50 };

    for n in [100, 1000].iter() {
        let vectors = generate_vectors(*n, 64);

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bencher, _| {
            bencher.iter(|| {
                let mut index = HnswIndex::with_seed(Metric::L2, &options, 1);
                for (i, vector) in vectors.iter().enumerate() {
                    index
                        .insert(black_box(vector.clone()), Rid::new(0, i as u32))
                        .unwrap();
                }
            })
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("hnsw_scan");
    let options = HnswOptions { m: 16, ef_construction: 100, ef_search: 50 };

    for n in [1000, 10000].iter() {
        let vectors = generate_vectors(*n, 64);
        let mut index = HnswIndex::with_seed(Metric::L2, &options, 1);
        for (i, vector) in vectors.iter().enumerate() {
            index.insert(vector.clone(), Rid::new(0, i as u32)).unwrap();
        }

        let query: Vec<f64> = (0..64).map(|i| i as f64 / 64.0).collect();

        group.bench_with_input(BenchmarkId::from_parameter(n), n, |bencher, _| {
            bencher.iter(|| index.scan(black_box(&query), 10).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_scan);
criterion_main!(benches);
