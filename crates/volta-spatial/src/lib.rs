//! Voxel grid holding the electrical part of the world.
//!
//! [`VoxelGrid`] maps voxel positions to their [`NodeConnection`] and owns
//! the [`TopologyVersion`]. Every edit that can change which faces conduct
//! bumps the version, which is what lets cached paths notice they are stale.
//! The grid implements [`WorldAccess`], so the tracer and the power module
//! read it directly.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use volta_core::eparams::{BurnoutReport, EParams};
use volta_core::facing::{BlockFacing, Facing};
use volta_core::id::NodePos;
use volta_core::version::TopologyVersion;
use volta_core::world::{NodeConnection, WorldAccess};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from grid edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("position {0} is occupied")]
    Occupied(NodePos),
    #[error("no node is placed at {0}")]
    NotPlaced(NodePos),
}

// ---------------------------------------------------------------------------
// VoxelGrid
// ---------------------------------------------------------------------------

/// In-memory voxel world.
#[derive(Debug, Clone, Default)]
pub struct VoxelGrid {
    nodes: BTreeMap<NodePos, NodeConnection>,
    version: TopologyVersion,
}

impl VoxelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current topology version.
    pub fn version(&self) -> u64 {
        self.version.current()
    }

    pub fn topology(&self) -> &TopologyVersion {
        &self.version
    }

    // -- Placement --

    /// Place a node. Returns the new topology version.
    pub fn place(&mut self, pos: NodePos, node: NodeConnection) -> Result<u64, GridError> {
        if self.nodes.contains_key(&pos) {
            return Err(GridError::Occupied(pos));
        }
        self.nodes.insert(pos, node);
        Ok(self.changed(pos, "node placed"))
    }

    /// Remove a node, returning it.
    pub fn remove(&mut self, pos: NodePos) -> Result<NodeConnection, GridError> {
        let node = self.nodes.remove(&pos).ok_or(GridError::NotPlaced(pos))?;
        self.changed(pos, "node removed");
        Ok(node)
    }

    /// Replace the set of faces a node exposes. Returns the new topology
    /// version.
    pub fn set_connection(&mut self, pos: NodePos, connection: Facing) -> Result<u64, GridError> {
        let node = self.nodes.get_mut(&pos).ok_or(GridError::NotPlaced(pos))?;
        node.connection = connection;
        Ok(self.changed(pos, "connection changed"))
    }

    /// Replace the parameters of one face. Returns the new topology version.
    pub fn set_eparams(
        &mut self,
        pos: NodePos,
        face: BlockFacing,
        params: EParams,
    ) -> Result<u64, GridError> {
        let node = self.nodes.get_mut(&pos).ok_or(GridError::NotPlaced(pos))?;
        node.set_eparams(face, params);
        Ok(self.changed(pos, "eparams changed"))
    }

    fn changed(&self, pos: NodePos, what: &'static str) -> u64 {
        let version = self.version.bump();
        debug!(%pos, version, "{what}");
        version
    }

    // -- Burnout --

    /// Write burnout countdowns into the affected faces.
    ///
    /// Reports for positions without a node are ignored. Countdown updates
    /// do not change conductivity and leave the version alone; the version
    /// is bumped once if any face burned out. Returns `true` in that case.
    pub fn apply_burnout_reports(&mut self, reports: &[BurnoutReport]) -> bool {
        let mut burned = false;
        for report in reports {
            let Some(node) = self.nodes.get_mut(&report.pos) else {
                continue;
            };
            let mut params = node.eparams(report.face);
            if report.apply_to(&mut params) {
                warn!(pos = %report.pos, face = %report.face, "connection burned out");
                burned = true;
            }
            node.set_eparams(report.face, params);
        }
        if burned {
            self.version.bump();
        }
        burned
    }

    // -- Point queries --

    pub fn node(&self, pos: NodePos) -> Option<&NodeConnection> {
        self.nodes.get(&pos)
    }

    pub fn is_occupied(&self, pos: NodePos) -> bool {
        self.nodes.contains_key(&pos)
    }

    // -- Adjacency --

    /// Neighbours current can reach from `pos`, in face enumeration order.
    pub fn linked_neighbors(&self, pos: NodePos) -> Vec<(BlockFacing, NodePos)> {
        BlockFacing::ALL
            .into_iter()
            .filter_map(|face| self.neighbor(pos, face).map(|(next, _)| (face, next)))
            .collect()
    }

    // -- Stats --

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodePos, &NodeConnection)> {
        self.nodes.iter().map(|(pos, node)| (*pos, node))
    }
}

impl WorldAccess for VoxelGrid {
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
