//! Per-face electrical parameters.
//!
//! Each of a node's six faces carries its own [`EParams`]. A face whose
//! parameters equal [`EParams::NONE`] has no electrical part at all. The
//! tracer and the power module only read these values; the node that owns
//! them is the only writer.

use serde::{Deserialize, Serialize};

use crate::facing::BlockFacing;
use crate::fixed::{Fixed64, watts};
use crate::id::NodePos;

/// Electrical parameters of one connection face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EParams {
    /// Rated voltage. Zero means the face carries nothing.
    pub voltage: u32,
    /// Maximum sustained current in amperes.
    pub max_current: Fixed64,
    /// The face is an insulated terminal and does not conduct across the
    /// block boundary.
    pub isolated: bool,
    /// The face is sealed against the environment. Sealed faces only mate
    /// with other sealed faces.
    pub isolated_environment: bool,
    /// Remaining overloaded ticks before the face burns out. Zero while the
    /// connection is healthy.
    #[serde(default)]
    pub ticks_before_burnout: u32,
    /// Terminal state: the face has burned out and no longer conducts.
    #[serde(default)]
    pub burnout: bool,
}

impl Default for EParams {
    fn default() -> Self {
        Self::NONE
    }
}

impl EParams {
    /// A face with no electrical part.
    pub const NONE: EParams = EParams {
        voltage: 0,
        max_current: Fixed64::ZERO,
        isolated: false,
        isolated_environment: false,
        ticks_before_burnout: 0,
        burnout: false,
    };

    /// An unisolated face rated at `voltage` volts and `max_current` amperes.
    pub fn new(voltage: u32, max_current: Fixed64) -> Self {
        Self {
            voltage,
            max_current,
            ..Self::NONE
        }
    }

    pub fn with_isolated(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    pub fn with_isolated_environment(mut self, sealed: bool) -> Self {
        self.isolated_environment = sealed;
        self
    }

    /// `true` if this face can carry current across the block boundary.
    pub fn is_conducting(&self) -> bool {
        self.voltage > 0 && !self.burnout && !self.isolated
    }

    /// `true` while the face is counting down towards burnout.
    pub fn is_overloaded(&self) -> bool {
        self.ticks_before_burnout > 0 && !self.burnout
    }

    /// Rated power of the face in watts: voltage times maximum current.
    pub fn rated_power(&self) -> Fixed64 {
        watts(self.voltage, self.max_current)
    }

    /// Whether current may cross between this face and `other`, the face of
    /// the neighbour that touches it.
    pub fn can_mate(&self, other: &EParams) -> bool {
        self.is_conducting()
            && other.is_conducting()
            && self.isolated_environment == other.isolated_environment
    }

    /// Rating of the connection formed by this face and `other`: the weaker
    /// of the two.
    pub fn connection_rating(&self, other: &EParams) -> Fixed64 {
        self.rated_power().min(other.rated_power())
    }
}

// ---------------------------------------------------------------------------
// Burnout reports
// ---------------------------------------------------------------------------

/// A change to one face's burnout bookkeeping.
///
/// Produced by the power module after a negotiation tick and applied by
/// whoever owns the world. `ticks_before_burnout == 0` with `burnout == false`
/// means the countdown was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnoutReport {
    pub pos: NodePos,
    pub face: BlockFacing,
    pub ticks_before_burnout: u32,
    pub burnout: bool,
}

impl BurnoutReport {
    /// Write the report into `params`. Returns `true` if this burned the
    /// face out (it was conducting before and no longer is).
    pub fn apply_to(&self, params: &mut EParams) -> bool {
        if params.burnout {
            return false;
        }
        params.ticks_before_burnout = self.ticks_before_burnout;
        params.burnout = self.burnout;
        self.burnout
    }
}
