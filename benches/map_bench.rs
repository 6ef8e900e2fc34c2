//! Benchmark for Map vs standard HashMap.
//!
//! Compares perennial's Map against Rust's standard HashMap for common
//! operations.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use perennial::Map;
use std::collections::HashMap;
use std::hint::black_box;

fn build_map(size: i64) -> Map<i64, i64> {
    let mut map = Map::new();
    for key in 0..size {
        map = map.insert(key, key);
    }
    map
}

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("insert");

    for size in [100i64, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("Map", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut map = Map::new();
                for key in 0..size {
                    map = map.insert(black_box(key), key);
                }
                black_box(map)
            });
        });

        group.bench_with_input(
            BenchmarkId::new("HashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = HashMap::new();
                    for key in 0..size {
                        map.insert(black_box(key), key);
                    }
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// get Benchmark
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get");

    for size in [100i64, 1000, 10000] {
        let map = build_map(size);
        let standard: HashMap<i64, i64> = (0..size).map(|key| (key, key)).collect();

        group.bench_with_input(BenchmarkId::new("Map", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut sum = 0;
                for key in 0..size {
                    if let Some(value) = map.get(black_box(&key)) {
                        sum += value;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(
            BenchmarkId::new("HashMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut sum = 0;
                    for key in 0..size {
                        if let Some(value) = standard.get(black_box(&key)) {
                            sum += value;
                        }
                    }
                    black_box(sum)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// remove Benchmark
// =============================================================================

fn benchmark_remove(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("remove");

    for size in [100i64, 1000, 10000] {
        let map = build_map(size);

        group.bench_with_input(BenchmarkId::new("Map", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let removed = map.remove(black_box(&(size / 2)));
                black_box(removed)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Iteration Benchmark
// =============================================================================

fn benchmark_iteration(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("iteration");

    for size in [100i64, 1000, 10000] {
        let map = build_map(size);

        group.bench_with_input(BenchmarkId::new("Map", size), &size, |bencher, _| {
            bencher.iter(|| {
                let sum: i64 = map.iter().map(|(_, value)| *value).sum();
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Group and Main
// =============================================================================

criterion_group!(
    benches,
    benchmark_insert,
    benchmark_get,
    benchmark_remove,
    benchmark_iteration
);

criterion_main!(benches);
