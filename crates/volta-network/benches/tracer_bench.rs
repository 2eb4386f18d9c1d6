//! Criterion benchmarks for the network tracer.
//!
//! Two benchmark groups:
//! - `trace_cold`: raw breadth-first search, no cache involved
//! - `trace_warm`: repeated `find_path` on an unchanged topology (cache hits)

use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use volta_cache::PathCache;
use volta_core::clock::MonotonicClock;
use volta_core::id::NodePos;
use volta_core::test_utils::{MapWorld, pos, sheet_world};
use volta_network::{NetworkTracer, trace_path};

// ===========================================================================
// World builders
// ===========================================================================

/// A 64x64 sheet with every fourth column cut except for one gap, so paths
/// have to zig-zag through the gaps.
fn build_maze() -> MapWorld {
    let mut world = sheet_world(64, 64);
    for x in (4..64).step_by(4) {
        let gap = if (x / 4) % 2 == 0 { 0 } else { 63 };
        for z in 0..64 {
            if z != gap {
                world.remove(pos(x, 0, z));
            }
        }
    }
    world
}

fn endpoints() -> Vec<(NodePos, NodePos)> {
    (0..16)
        .map(|i| (pos(0, 0, i * 4), pos(63, 0, 63 - i * 4)))
        .collect()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_cold");
    group.sample_size(20);

    let world = build_maze();
    let pairs = endpoints();

    group.bench_function("maze_64x64_16_pairs", |b| {
        b.iter(|| {
            for &(origin, destination) in &pairs {
                trace_path(&world, origin, destination);
            }
        });
    });

    group.finish();
}

fn bench_warm(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_warm");
    group.sample_size(50);

    let world = build_maze();
    let pairs = endpoints();
    let cache = Arc::new(PathCache::new(
        Duration::from_secs(300),
        Arc::new(MonotonicClock::new()),
    ));
    let tracer = NetworkTracer::new(cache);
    for &(origin, destination) in &pairs {
        tracer.find_path(&world, origin, destination, 1);
    }

    group.bench_function("maze_64x64_16_pairs", |b| {
        b.iter(|| {
            for &(origin, destination) in &pairs {
                tracer.find_path(&world, origin, destination, 1);
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_cold, bench_warm);
criterion_main!(benches);
