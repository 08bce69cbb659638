//! Match throughput benchmarks for arena_core.
//!
//! Run with: `cargo bench -p arena_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use arena_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Full matches between two fixed builds.
pub fn simulation_benchmark(c: &mut Criterion) {
    let config = ArenaConfig::default();
    let bear: Build = "bear 3 14 2 1".parse().expect("valid build");
    let buffalo: Build = "buffalo 8 6 4 2".parse().expect("valid build");

    let mut seed = 0u64;
    c.bench_function("bear_vs_buffalo_match", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(simulate(&config, &bear, &buffalo, Some(seed)).expect("match runs"))
        })
    });

    c.bench_function("recorded_match", |b| {
        b.iter(|| {
            black_box(simulate_recorded(&config, &bear, &buffalo, Some(42)).expect("match runs"))
        })
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
