//! Similarity search benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vidmatch_core::FeatureVector;
use vidmatch_search::{compare, SimilarityIndex};

/// Deterministic pseudo-random vector.
fn make_vector(dim: usize, seed: u64) -> FeatureVector {
    let mut state = seed.wrapping_mul(0x9e3779b97f4a7c15).max(1);
    let values = (0..dim)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect();
    FeatureVector::new(values)
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    for dim in [128usize, 512, 2048] {
        let a = make_vector(dim, 1);
        let b = make_vector(dim, 2);

        group.throughput(Throughput::Elements(dim as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |bench, _| {
            bench.iter(|| compare(black_box(&a), black_box(&b)).unwrap());
        });
    }

    group.finish();
}

fn bench_index_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_search");

    for count in [100usize, 1_000, 10_000] {
        let mut index = SimilarityIndex::new();
        for i in 0..count {
            index
                .insert(format!("item_{i}"), make_vector(512, i as u64 + 10))
                .unwrap();
        }
        let query = make_vector(512, 3);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, _| {
            bench.iter(|| index.search(black_box(&query), 0.5, 20).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compare, bench_index_search);
criterion_main!(benches);
