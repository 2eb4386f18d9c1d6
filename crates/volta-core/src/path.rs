//! The result of a conduction-path search.

use crate::facing::{BlockFacing, Facing};
use crate::id::NodePos;

/// A conduction path from an origin to a destination, as produced by the
/// network tracer and stored in the path cache.
///
/// All per-node vectors run parallel to `path`. An empty `path` means the
/// destination was unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TracedPath {
    /// Nodes from origin to destination, inclusive.
    pub path: Vec<NodePos>,
    /// For each node, the face through which the search entered it. `None`
    /// for the origin.
    pub entered_from: Vec<Option<BlockFacing>>,
    /// For each node, the faces already expanded by the search that produced
    /// this path.
    pub processed: Vec<Facing>,
    /// For each hop, the single-direction facing travelled from `path[i]`
    /// to `path[i + 1]`.
    pub used_connections: Vec<Facing>,
}

/// One step along a [`TracedPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub from: NodePos,
    pub to: NodePos,
    /// Face of `from` that touches `to`.
    pub face: BlockFacing,
}

impl TracedPath {
    /// The unreachable result.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// The trivial path for an origin that is its own destination.
    pub fn zero_length(origin: NodePos) -> Self {
        Self {
            path: vec![origin],
            entered_from: vec![None],
            processed: vec![Facing::NONE],
            used_connections: Vec::new(),
        }
    }

    /// `true` if no path was found.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Number of hops; zero for both the trivial and the unreachable path.
    pub fn hop_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn origin(&self) -> Option<NodePos> {
        self.path.first().copied()
    }

    pub fn destination(&self) -> Option<NodePos> {
        self.path.last().copied()
    }

    /// Walk the path hop by hop.
    pub fn hops(&self) -> impl Iterator<Item = Hop> + '_ {
        self.path
            .windows(2)
            .zip(&self.used_connections)
            .filter_map(|(pair, used)| {
                Some(Hop {
                    from: pair[0],
                    to: pair[1],
                    face: used.first()?,
                })
            })
    }
}
