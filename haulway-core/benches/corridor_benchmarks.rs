//! Criterion benchmarks for corridor filtering and restriction checks.
//!
//! Measures layer sizes of 1 000, 10 000 and 50 000 frames against a
//! 2 000-vertex route, plus a restriction check over the same route.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package haulway-core
//! ```

#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use haulway_core::test_support::{bbox_ring, point_feature, polygon_feature};
use haulway_core::{
    Coordinate, CorridorFilter, FeatureCollection, FeatureIndex, RestrictionChecker,
    VehicleProfile,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed for deterministic feature generation.
const BENCHMARK_SEED: u64 = 42;

/// Layer sizes to benchmark.
const LAYER_SIZES: &[usize] = &[1_000, 10_000, 50_000];

/// Vertices in the benchmark route.
const ROUTE_VERTICES: usize = 2_000;

fn route() -> Vec<Coordinate> {
    let steps = (ROUTE_VERTICES - 1) as f64;
    (0..ROUTE_VERTICES)
        .map(|i| {
            let t = i as f64 / steps;
            Coordinate::new(55.0 + 0.5 * t, 37.0 + 0.8 * t + 0.01 * (t * 40.0).sin())
        })
        .collect()
}

/// Frames scattered over a one-degree box around the route.
fn frames(count: usize) -> FeatureCollection {
    let mut rng = ChaCha8Rng::seed_from_u64(BENCHMARK_SEED);
    (0..count)
        .map(|i| {
            point_feature(
                &format!("frame-{i}"),
                rng.gen_range(54.8..55.7),
                rng.gen_range(36.8..38.0),
            )
        })
        .collect()
}

fn bench_corridor(c: &mut Criterion) {
    let mut group = c.benchmark_group("corridor");
    group.measurement_time(Duration::from_secs(10));
    let route = route();
    let filter = CorridorFilter::default();

    for &size in LAYER_SIZES {
        let index = FeatureIndex::new(&frames(size));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("frames", size), &index, |b, index| {
            b.iter(|| filter.apply(Some(&route), VehicleProfile::TruckLight, index));
        });
    }
    group.finish();
}

fn bench_restrictions(c: &mut Criterion) {
    let route = route();
    let allowed = FeatureIndex::new(&FeatureCollection::from_features([polygon_feature(
        "allowed-1",
        &bbox_ring(55.0, 37.0, 55.3, 37.4),
    )]));
    let conditional = FeatureIndex::new(&frames(1_000));
    let checker = RestrictionChecker::default();
    c.bench_function("restrictions/light_truck", |b| {
        b.iter(|| checker.check(&route, VehicleProfile::TruckLight, &allowed, &conditional));
    });
}

criterion_group!(benches, bench_corridor, bench_restrictions);
criterion_main!(benches);
