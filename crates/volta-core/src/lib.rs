//! Volta Core -- shared vocabulary for the voxel electrical network.
//!
//! Every other Volta crate builds on the types defined here: voxel positions,
//! the six-direction facing algebra, per-face electrical parameters, the
//! read-only world accessor, traced conduction paths, the topology version
//! counter, clocks, and configuration.
//!
//! # Data Flow
//!
//! 1. A topology edit (block placed, removed, or reconfigured) bumps the
//!    [`version::TopologyVersion`].
//! 2. The network tracer compares the version stamped on a cached
//!    [`path::TracedPath`] with the current one and re-traces on mismatch.
//! 3. The power module consumes the fresh path every negotiation tick.
//!
//! # Key Types
//!
//! - [`id::NodePos`] -- integer voxel coordinate of a network node.
//! - [`facing::BlockFacing`] / [`facing::Facing`] -- single direction and
//!   direction set.
//! - [`eparams::EParams`] -- per-face voltage, current rating, isolation and
//!   burnout bookkeeping.
//! - [`world::WorldAccess`] -- the read-only topology oracle.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for wattage.

pub mod clock;
pub mod config;
pub mod eparams;
pub mod facing;
pub mod fixed;
pub mod id;
pub mod path;
pub mod version;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
