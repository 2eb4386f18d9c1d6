//! Read-only view of the voxel world used by path tracing and negotiation.

use serde::{Deserialize, Serialize};

use crate::eparams::EParams;
use crate::facing::{BlockFacing, Facing};
use crate::id::NodePos;

// ---------------------------------------------------------------------------
// NodeConnection
// ---------------------------------------------------------------------------

/// The electrical part of a single voxel: which faces it exposes and the
/// parameters of each face.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeConnection {
    pub connection: Facing,
    pub eparams: [EParams; 6],
}

impl NodeConnection {
    /// Expose `connection` with the same parameters on every exposed face.
    pub fn uniform(connection: Facing, params: EParams) -> Self {
        let mut eparams = [EParams::NONE; 6];
        for face in connection.iter() {
            eparams[face.index()] = params;
        }
        Self {
            connection,
            eparams,
        }
    }

    /// A block mounted on `side`: exposes the full face of that side.
    pub fn mounted(side: BlockFacing, params: EParams) -> Self {
        Self::uniform(Facing::from(side).full_face(), params)
    }

    pub fn eparams(&self, face: BlockFacing) -> EParams {
        self.eparams[face.index()]
    }

    pub fn set_eparams(&mut self, face: BlockFacing, params: EParams) {
        self.eparams[face.index()] = params;
    }

    /// Faces that are both exposed and currently able to conduct.
    pub fn live_faces(&self) -> Facing {
        self.connection
            .iter()
            .filter(|face| self.eparams(*face).is_conducting())
            .collect()
    }

    /// `true` if any exposed face has burned out.
    pub fn has_burnout(&self) -> bool {
        self.connection.iter().any(|face| self.eparams(face).burnout)
    }
}

// ---------------------------------------------------------------------------
// WorldAccess
// ---------------------------------------------------------------------------

/// Topology oracle consulted by the tracer and the power module.
///
/// Implementors never need to be mutated by a search. A position that holds
/// no electrical node returns [`Facing::NONE`] and [`EParams::NONE`].
pub trait WorldAccess {
    /// Faces the node at `pos` exposes to the network.
    fn connection(&self, pos: NodePos) -> Facing;

    /// Parameters of the face `face` of the node at `pos`.
    fn eparams(&self, pos: NodePos, face: BlockFacing) -> EParams;

    /// The neighbour across `face` together with the parameters of its
    /// touching face, if current can flow between the two.
    ///
    /// Both nodes must expose the shared boundary and the two faces must be
    /// able to mate (see [`EParams::can_mate`]).
    fn neighbor(&self, pos: NodePos, face: BlockFacing) -> Option<(NodePos, EParams)> {
        if !self.connection(pos).contains(face) {
            return None;
        }
        let next = pos.offset(face);
        let back = face.opposite();
        if !self.connection(next).contains(back) {
            return None;
        }
        let here = self.eparams(pos, face);
        let there = self.eparams(next, back);
        here.can_mate(&there).then_some((next, there))
    }
}

impl<W: WorldAccess + ?Sized> WorldAccess for &W {
    fn connection(&self, pos: NodePos) -> Facing {
        (**self).connection(pos)
    }

    fn eparams(&self, pos: NodePos, face: BlockFacing) -> EParams {
        (**self).eparams(pos, face)
    }

    fn neighbor(&self, pos: NodePos, face: BlockFacing) -> Option<(NodePos, EParams)> {
        (**self).neighbor(pos, face)
    }
}
