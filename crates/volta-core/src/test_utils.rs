//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::collections::BTreeMap;

use crate::eparams::EParams;
use crate::facing::{BlockFacing, Facing};
use crate::fixed::Fixed64;
use crate::id::NodePos;
use crate::world::{NodeConnection, WorldAccess};

// ===========================================================================
// Value helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn pos(x: i32, y: i32, z: i32) -> NodePos {
    NodePos::new(x, y, z)
}

/// The reference cable: 128 V, 5 A, unisolated.
pub fn cable() -> EParams {
    EParams::new(128, fixed(5.0))
}

// ===========================================================================
// MapWorld
// ===========================================================================

/// Minimal [`WorldAccess`] over an ordered map. Good enough for unit tests
/// that do not need the full voxel grid.
#[derive(Debug, Clone, Default)]
pub struct MapWorld {
    pub nodes: BTreeMap<NodePos, NodeConnection>,
}

impl MapWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, at: NodePos, node: NodeConnection) {
        self.nodes.insert(at, node);
    }

    /// Insert a node exposing `connection` with [`cable`] parameters.
    pub fn insert_cable(&mut self, at: NodePos, connection: Facing) {
        self.insert(at, NodeConnection::uniform(connection, cable()));
    }

    pub fn remove(&mut self, at: NodePos) -> Option<NodeConnection> {
        self.nodes.remove(&at)
    }

    pub fn node_mut(&mut self, at: NodePos) -> Option<&mut NodeConnection> {
        self.nodes.get_mut(&at)
    }
}

impl WorldAccess for MapWorld {
    fn connection(&self, pos: NodePos) -> Facing {
        self.nodes
            .get(&pos)
            .map(|n| n.connection)
            .unwrap_or(Facing::NONE)
    }

    fn eparams(&self, pos: NodePos, face: BlockFacing) -> EParams {
        self.nodes
            .get(&pos)
            .map(|n| n.eparams(face))
            .unwrap_or(EParams::NONE)
    }
}

// ===========================================================================
// Canned topologies
// ===========================================================================

/// Two cable nodes at (0,0,0) and (1,0,0) with the given connections.
pub fn two_node_world(first: Facing, second: Facing) -> MapWorld {
    let mut world = MapWorld::new();
    world.insert_cable(pos(0, 0, 0), first);
    world.insert_cable(pos(1, 0, 0), second);
    world
}

/// A straight east-west cable of `len` nodes starting at the origin.
pub fn line_world(len: i32) -> MapWorld {
    let mut world = MapWorld::new();
    for x in 0..len {
        world.insert_cable(pos(x, 0, 0), Facing::EAST | Facing::WEST);
    }
    world
}

/// A flat `width` x `depth` sheet of horizontally connected cable at y = 0.
pub fn sheet_world(width: i32, depth: i32) -> MapWorld {
    let mut world = MapWorld::new();
    for x in 0..width {
        for z in 0..depth {
            world.insert_cable(pos(x, 0, z), Facing::HORIZONTAL);
        }
    }
    world
}
