//! Benchmark for List vs standard Vec.
//!
//! Compares perennial's List against Rust's standard Vec for common
//! operations.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use perennial::List;
use std::hint::black_box;

fn build_list(size: i64) -> List<i64> {
    let mut list = List::new();
    for value in 0..size {
        list = list.push_back(value);
    }
    list
}

// =============================================================================
// push_back Benchmark
// =============================================================================

fn benchmark_push_back(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("push_back");

    for size in [100i64, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("List", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut list = List::new();
                for value in 0..size {
                    list = list.push_back(black_box(value));
                }
                black_box(list)
            });
        });

        group.bench_with_input(BenchmarkId::new("Vec", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut vector = Vec::new();
                for value in 0..size {
                    vector.push(black_box(value));
                }
                black_box(vector)
            });
        });
    }

    group.finish();
}

// =============================================================================
// push_front Benchmark
// =============================================================================

fn benchmark_push_front(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("push_front");

    for size in [100i64, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("List", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut list = List::new();
                for value in 0..size {
                    list = list.push_front(black_box(value));
                }
                black_box(list)
            });
        });
    }

    group.finish();
}

// =============================================================================
// get Benchmark (Random Access)
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get");

    for size in [100i64, 1000, 10000] {
        let list = build_list(size);
        let vector: Vec<i64> = (0..size).collect();

        group.bench_with_input(BenchmarkId::new("List", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut sum = 0;
                for index in 0..size as usize {
                    if let Some(&value) = list.get(black_box(index)) {
                        sum += value;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("Vec", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut sum = 0;
                for index in 0..size as usize {
                    if let Some(&value) = vector.get(black_box(index)) {
                        sum += value;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// update Benchmark
// =============================================================================

fn benchmark_update(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("update");

    for size in [100i64, 1000, 10000] {
        let list = build_list(size);

        group.bench_with_input(BenchmarkId::new("List", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let updated = list.update(black_box((size / 2) as usize), -1).unwrap();
                black_box(updated)
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
        let list = build_list(size);

        group.bench_with_input(BenchmarkId::new("List", size), &size, |bencher, _| {
            bencher.iter(|| {
                let sum: i64 = list.iter().map(|(_, value)| *value).sum();
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// slice Benchmark
// =============================================================================

fn benchmark_slice(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("slice");

    for size in [1000i64, 10000] {
        let list = build_list(size);

        group.bench_with_input(BenchmarkId::new("List", size), &size, |bencher, &size| {
            bencher.iter(|| {
                let quarter = (size / 4) as usize;
                let sliced = list.slice(quarter, 3 * quarter).unwrap();
                black_box(sliced)
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
    benchmark_push_back,
    benchmark_push_front,
    benchmark_get,
    benchmark_update,
    benchmark_iteration,
    benchmark_slice
);

criterion_main!(benches);
