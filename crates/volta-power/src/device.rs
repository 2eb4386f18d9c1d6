//! Endpoint behaviours: what consumers and producers tell the negotiation,
//! and what they are told back.

use std::fmt::Debug;

use volta_core::fixed::Fixed64;
use volta_core::id::NodePos;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A block that draws power.
///
/// Each negotiation tick calls [`consume_request`](Self::consume_request)
/// once, then [`consume_receive`](Self::consume_receive) once with the
/// amount granted.
pub trait ElectricConsumer: Debug + Send {
    fn position(&self) -> NodePos;

    /// Upper bound on any single request.
    fn max_consumption(&self) -> Fixed64;

    /// Wattage wanted this tick. Zero declines power.
    fn consume_request(&mut self) -> Fixed64;

    /// Wattage granted this tick. An implementation that has stopped
    /// working since its request should store zero instead.
    fn consume_receive(&mut self, amount: Fixed64);

    /// Last value returned by `consume_request`.
    fn power_requested(&self) -> Fixed64;

    /// Last amount accepted by `consume_receive`.
    fn power_received(&self) -> Fixed64;

    fn is_working(&self) -> bool;

    /// A burned consumer is skipped by the negotiation.
    fn is_burned(&self) -> bool {
        false
    }
}

/// A block that supplies power.
pub trait ElectricProducer: Debug + Send {
    fn position(&self) -> NodePos;

    /// Wattage available this tick.
    fn produce_give(&mut self) -> Fixed64;

    /// Total wattage actually drawn this tick.
    fn produce_order(&mut self, amount: Fixed64);

    /// Last value returned by `produce_give`.
    fn power_given(&self) -> Fixed64;

    /// Last amount passed to `produce_order`.
    fn power_ordered(&self) -> Fixed64;
}

// ---------------------------------------------------------------------------
// MachineConsumer
// ---------------------------------------------------------------------------

/// A machine that wants its full rating while it has work and nothing
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConsumer {
    pos: NodePos,
    max_consumption: Fixed64,
    working: bool,
    burned: bool,
    requested: Fixed64,
    received: Fixed64,
}

impl MachineConsumer {
    /// A working machine at `pos` rated at `max_consumption` watts.
    pub fn new(pos: NodePos, max_consumption: Fixed64) -> Self {
        Self {
            pos,
            max_consumption,
            working: true,
            burned: false,
            requested: Fixed64::ZERO,
            received: Fixed64::ZERO,
        }
    }

    pub fn set_working(&mut self, working: bool) {
        self.working = working;
    }

    pub fn set_burned(&mut self, burned: bool) {
        self.burned = burned;
    }
}

impl ElectricConsumer for MachineConsumer {
    fn position(&self) -> NodePos {
        self.pos
    }

    fn max_consumption(&self) -> Fixed64 {
        self.max_consumption
    }

    fn consume_request(&mut self) -> Fixed64 {
        if self.working && !self.burned {
            self.requested = self.max_consumption;
        } else {
            self.requested = Fixed64::ZERO;
            self.received = Fixed64::ZERO;
        }
        self.requested
    }

    fn consume_receive(&mut self, amount: Fixed64) {
        self.received = if self.working { amount } else { Fixed64::ZERO };
    }

    fn power_requested(&self) -> Fixed64 {
        self.requested
    }

    fn power_received(&self) -> Fixed64 {
        self.received
    }

    fn is_working(&self) -> bool {
        self.working
    }

    fn is_burned(&self) -> bool {
        self.burned
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// A producer with a fixed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pos: NodePos,
    output: Fixed64,
    given: Fixed64,
    ordered: Fixed64,
}

impl Generator {
    pub fn new(pos: NodePos, output: Fixed64) -> Self {
        Self {
            pos,
            output,
            given: Fixed64::ZERO,
            ordered: Fixed64::ZERO,
        }
    }
}

impl ElectricProducer for Generator {
    fn position(&self) -> NodePos {
        self.pos
    }

    fn produce_give(&mut self) -> Fixed64 {
        self.given = self.output;
        self.given
    }

    fn produce_order(&mut self, amount: Fixed64) {
        self.ordered = amount;
    }

    fn power_given(&self) -> Fixed64 {
        self.given
    }

    fn power_ordered(&self) -> Fixed64 {
        self.ordered
    }
}
