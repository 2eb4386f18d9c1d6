//! Integration test: negotiation against a live voxel grid.
//!
//! Exercises the loop a host runs each tick: negotiate, apply the burnout
//! reports to the grid, and pass the grid's version into the next tick.

use std::sync::Arc;

use volta_cache::PathCache;
use volta_core::clock::ManualClock;
use volta_core::config::VoltaConfig;
use volta_core::facing::{BlockFacing, Facing};
use volta_core::fixed::Fixed64;
use volta_core::id::NodePos;
use volta_core::test_utils::{cable, fixed, pos};
use volta_core::world::NodeConnection;
use volta_network::NetworkTracer;
use volta_power::{
    ConsumerState, Generator, MachineConsumer, PowerEvent, PowerModule,
};
use volta_spatial::VoxelGrid;

fn line_grid(len: i32) -> VoxelGrid {
    let mut grid = VoxelGrid::new();
    for x in 0..len {
        grid.place(
            pos(x, 0, 0),
            NodeConnection::uniform(Facing::EAST | Facing::WEST, cable()),
        )
        .unwrap();
    }
    grid
}

fn module(config: &VoltaConfig) -> PowerModule {
    let cache = PathCache::with_config(config, Arc::new(ManualClock::new()));
    PowerModule::new(NetworkTracer::new(Arc::new(cache)), config)
}

fn run_tick(power: &mut PowerModule, grid: &mut VoxelGrid, tick: u64) -> Vec<PowerEvent> {
    let events = power.tick(&*grid, grid.version(), tick);
    let reports = power.take_burnout_reports();
    grid.apply_burnout_reports(&reports);
    events
}

// ===========================================================================
// Re-routing
// ===========================================================================

#[test]
fn consumer_fails_over_to_the_far_producer() {
    let mut grid = line_grid(7);
    let mut power = module(&VoltaConfig::default());
    let near = power.add_producer(Box::new(Generator::new(pos(0, 0, 0), fixed(500.0))));
    let far = power.add_producer(Box::new(Generator::new(pos(6, 0, 0), fixed(500.0))));
    let lamp = power.add_consumer(Box::new(MachineConsumer::new(pos(2, 0, 0), fixed(100.0))));

    run_tick(&mut power, &mut grid, 1);
    let alloc = power.allocation(lamp).unwrap();
    assert_eq!(alloc.producer, Some(near));
    assert_eq!(alloc.hops, 2);
    assert_eq!(alloc.granted, fixed(100.0));

    // Pull the cable between the near producer and the lamp.
    grid.remove(pos(1, 0, 0)).unwrap();
    let events = run_tick(&mut power, &mut grid, 2);
    assert!(events.is_empty());

    let alloc = power.allocation(lamp).unwrap();
    assert_eq!(alloc.producer, Some(far));
    assert_eq!(alloc.hops, 4);
    assert_eq!(alloc.granted, fixed(100.0));
    assert_eq!(power.producer(near).unwrap().power_ordered(), Fixed64::ZERO);
    assert_eq!(power.producer(far).unwrap().power_ordered(), fixed(100.0));
}

#[test]
fn isolated_consumer_goes_dark_and_recovers() {
    let mut grid = line_grid(3);
    let mut power = module(&VoltaConfig::default());
    power.add_producer(Box::new(Generator::new(pos(0, 0, 0), fixed(500.0))));
    let lamp = power.add_consumer(Box::new(MachineConsumer::new(pos(2, 0, 0), fixed(100.0))));

    run_tick(&mut power, &mut grid, 1);
    assert_eq!(power.consumer_state(lamp), Some(ConsumerState::Consuming));

    let sealed = cable().with_isolated(true);
    grid.set_eparams(pos(1, 0, 0), BlockFacing::East, sealed).unwrap();
    let events = run_tick(&mut power, &mut grid, 2);
    assert_eq!(
        events,
        vec![PowerEvent::ConsumerUnpowered {
            consumer: lamp,
            requested: fixed(100.0),
            tick: 2,
        }]
    );
    assert_eq!(power.consumer_state(lamp), Some(ConsumerState::Requesting));

    grid.set_eparams(pos(1, 0, 0), BlockFacing::East, cable()).unwrap();
    let events = run_tick(&mut power, &mut grid, 3);
    assert_eq!(
        events,
        vec![PowerEvent::ConsumerRestored {
            consumer: lamp,
            tick: 3
        }]
    );
}

#[test]
fn removing_a_producer_purges_its_cached_paths() {
    let mut grid = line_grid(3);
    let mut power = module(&VoltaConfig::default());
    let gen_id = power.add_producer(Box::new(Generator::new(pos(0, 0, 0), fixed(500.0))));
    power.add_consumer(Box::new(MachineConsumer::new(pos(2, 0, 0), fixed(100.0))));

    run_tick(&mut power, &mut grid, 1);
    assert!(power.tracer().cache().contains(pos(0, 0, 0), pos(2, 0, 0)));

    power.remove_producer(gen_id).unwrap();
    assert!(!power.tracer().cache().contains(pos(0, 0, 0), pos(2, 0, 0)));
}

// ===========================================================================
// Burnout
// ===========================================================================

fn east_face(grid: &VoxelGrid, at: NodePos) -> volta_core::eparams::EParams {
    grid.node(at).unwrap().eparams(BlockFacing::East)
}

#[test]
fn sustained_overload_burns_the_line() {
    let config = VoltaConfig {
        burnout_ticks: 3,
        ..Default::default()
    };
    let mut grid = line_grid(3);
    let mut power = module(&config);
    power.add_producer(Box::new(Generator::new(pos(0, 0, 0), fixed(10_000.0))));
    let heater = power.add_consumer(Box::new(MachineConsumer::new(pos(2, 0, 0), fixed(1000.0))));

    // 128 V * 5 A = 640 W per connection.
    let events = run_tick(&mut power, &mut grid, 1);
    assert_eq!(power.allocation(heater).unwrap().granted, fixed(640.0));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, PowerEvent::Overcurrent { ticks_before_burnout: 2, .. }))
            .count(),
        2
    );
    assert_eq!(east_face(&grid, pos(0, 0, 0)).ticks_before_burnout, 2);
    assert!(east_face(&grid, pos(1, 0, 0)).is_overloaded());
    let version_before = grid.version();

    run_tick(&mut power, &mut grid, 2);
    assert_eq!(east_face(&grid, pos(0, 0, 0)).ticks_before_burnout, 1);
    // Countdown updates do not change the topology.
    assert_eq!(grid.version(), version_before);

    let events = run_tick(&mut power, &mut grid, 3);
    assert!(events.contains(&PowerEvent::Burnout {
        pos: pos(0, 0, 0),
        face: BlockFacing::East,
        tick: 3,
    }));
    assert!(events.contains(&PowerEvent::Burnout {
        pos: pos(1, 0, 0),
        face: BlockFacing::East,
        tick: 3,
    }));
    assert!(east_face(&grid, pos(0, 0, 0)).burnout);
    assert!(grid.node(pos(0, 0, 0)).unwrap().has_burnout());
    assert_eq!(grid.version(), version_before + 1);

    // The next tick retraces against the new version and finds no route.
    let events = run_tick(&mut power, &mut grid, 4);
    assert_eq!(
        events,
        vec![PowerEvent::ConsumerUnpowered {
            consumer: heater,
            requested: fixed(1000.0),
            tick: 4,
        }]
    );
    assert_eq!(power.allocation(heater).unwrap().producer, None);
}

#[test]
fn overload_that_stops_clears_the_countdown() {
    let config = VoltaConfig {
        burnout_ticks: 3,
        ..Default::default()
    };
    let mut grid = line_grid(2);
    let mut power = module(&config);
    power.add_producer(Box::new(Generator::new(pos(0, 0, 0), fixed(10_000.0))));
    let heater = power.add_consumer(Box::new(MachineConsumer::new(pos(1, 0, 0), fixed(1000.0))));

    run_tick(&mut power, &mut grid, 1);
    run_tick(&mut power, &mut grid, 2);
    assert_eq!(east_face(&grid, pos(0, 0, 0)).ticks_before_burnout, 1);

    // Dropping the heater ends the overload.
    power.remove_consumer(heater).unwrap();
    let events = run_tick(&mut power, &mut grid, 3);
    assert!(events.is_empty());
    let face = east_face(&grid, pos(0, 0, 0));
    assert_eq!(face.ticks_before_burnout, 0);
    assert!(!face.burnout);
}
