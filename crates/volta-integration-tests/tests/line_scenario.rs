//! Integration test: a three-node cable line.
//!
//! Traces across a 128 V / 5 A line, cuts it by removing a face from the
//! middle node, and checks that the version bump makes the cached path
//! stale so the next search sees the cut.

use std::sync::Arc;
use std::time::Duration;

use volta_cache::PathCache;
use volta_core::clock::ManualClock;
use volta_core::facing::{BlockFacing, Facing};
use volta_core::test_utils::{cable, line_world, pos};
use volta_core::world::NodeConnection;
use volta_network::NetworkTracer;
use volta_spatial::VoxelGrid;

fn tracer() -> NetworkTracer {
    let cache = PathCache::new(Duration::from_secs(300), Arc::new(ManualClock::new()));
    NetworkTracer::new(Arc::new(cache))
}

#[test]
fn cutting_the_middle_face_breaks_the_path() {
    let mut world = line_world(3);
    let tracer = tracer();
    let (origin, destination) = (pos(0, 0, 0), pos(2, 0, 0));

    let path = tracer.find_path(&world, origin, destination, 1);
    assert_eq!(path.path, vec![pos(0, 0, 0), pos(1, 0, 0), pos(2, 0, 0)]);
    assert_eq!(path.used_connections, vec![Facing::EAST, Facing::EAST]);
    assert_eq!(
        path.entered_from,
        vec![None, Some(BlockFacing::West), Some(BlockFacing::West)]
    );
    assert!(tracer.cache().contains(origin, destination));

    // Same version: served from the cache even after the world changed.
    world
        .node_mut(pos(1, 0, 0))
        .unwrap()
        .connection
        .remove(BlockFacing::East);
    let cached = tracer.find_path(&world, origin, destination, 1);
    assert_eq!(cached.path.len(), 3);
    assert_eq!(tracer.stats().hits, 1);

    // The owner bumps the version: the search reruns and finds nothing.
    let cut = tracer.find_path(&world, origin, destination, 2);
    assert!(cut.is_empty());
    assert!(!tracer.cache().contains(origin, destination));
    assert_eq!(tracer.stats().stale, 1);
    assert_eq!(tracer.stats().unreachable, 1);
}

#[test]
fn voxel_grid_versions_drive_invalidation() {
    let mut grid = VoxelGrid::new();
    for x in 0..3 {
        grid.place(
            pos(x, 0, 0),
            NodeConnection::uniform(Facing::EAST | Facing::WEST, cable()),
        )
        .unwrap();
    }
    let tracer = tracer();

    let before = tracer.find_path(&grid, pos(0, 0, 0), pos(2, 0, 0), grid.version());
    assert_eq!(before.hop_count(), 2);

    let version = grid.set_connection(pos(1, 0, 0), Facing::WEST).unwrap();
    assert_eq!(version, grid.version());
    let after = tracer.find_path(&grid, pos(0, 0, 0), pos(2, 0, 0), version);
    assert!(after.is_empty());

    // Restoring the face is another topology change.
    let version = grid
        .set_connection(pos(1, 0, 0), Facing::EAST | Facing::WEST)
        .unwrap();
    let restored = tracer.find_path(&grid, pos(0, 0, 0), pos(2, 0, 0), version);
    assert_eq!(restored.hop_count(), 2);
}

#[test]
fn reverse_direction_is_cached_separately() {
    let world = line_world(3);
    let tracer = tracer();

    let forward = tracer.find_path(&world, pos(0, 0, 0), pos(2, 0, 0), 1);
    let backward = tracer.find_path(&world, pos(2, 0, 0), pos(0, 0, 0), 1);

    assert_eq!(backward.used_connections, vec![Facing::WEST, Facing::WEST]);
    assert_eq!(
        forward.path.iter().rev().copied().collect::<Vec<_>>(),
        backward.path
    );
    assert_eq!(tracer.cache().len(), 2);
    assert_eq!(tracer.stats().misses, 2);
}
