//! Consumers whose behaviour tests can steer after registration.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use volta_core::fixed::Fixed64;
use volta_core::id::NodePos;

use crate::device::{ElectricConsumer, MachineConsumer};

/// A [`MachineConsumer`] whose working flag is shared with the test.
#[derive(Debug)]
pub struct SwitchableConsumer {
    inner: MachineConsumer,
    working: Arc<AtomicBool>,
}

impl SwitchableConsumer {
    /// Returns the consumer and the handle that switches it.
    pub fn new(pos: NodePos, max_consumption: Fixed64) -> (Self, Arc<AtomicBool>) {
        let working = Arc::new(AtomicBool::new(true));
        let consumer = Self {
            inner: MachineConsumer::new(pos, max_consumption),
            working: Arc::clone(&working),
        };
        (consumer, working)
    }

    fn sync(&mut self) {
        self.inner.set_working(self.working.load(Ordering::Acquire));
    }
}

impl ElectricConsumer for SwitchableConsumer {
    fn position(&self) -> NodePos {
        self.inner.position()
    }

    fn max_consumption(&self) -> Fixed64 {
        self.inner.max_consumption()
    }

    fn consume_request(&mut self) -> Fixed64 {
        self.sync();
        self.inner.consume_request()
    }

    fn consume_receive(&mut self, amount: Fixed64) {
        self.sync();
        self.inner.consume_receive(amount);
    }

    fn power_requested(&self) -> Fixed64 {
        self.inner.power_requested()
    }

    fn power_received(&self) -> Fixed64 {
        self.inner.power_received()
    }

    fn is_working(&self) -> bool {
        self.working.load(Ordering::Acquire)
    }
}

/// Requests power, then stops working before the grant arrives.
#[derive(Debug)]
pub struct FlakyConsumer {
    inner: MachineConsumer,
}

impl FlakyConsumer {
    pub fn new(pos: NodePos, max_consumption: Fixed64) -> Self {
        Self {
            inner: MachineConsumer::new(pos, max_consumption),
        }
    }
}

impl ElectricConsumer for FlakyConsumer {
    fn position(&self) -> NodePos {
        self.inner.position()
    }

    fn max_consumption(&self) -> Fixed64 {
        self.inner.max_consumption()
    }

    fn consume_request(&mut self) -> Fixed64 {
        self.inner.set_working(true);
        let requested = self.inner.consume_request();
        self.inner.set_working(false);
        requested
    }

    fn consume_receive(&mut self, amount: Fixed64) {
        self.inner.consume_receive(amount);
    }

    fn power_requested(&self) -> Fixed64 {
        self.inner.power_requested()
    }

    fn power_received(&self) -> Fixed64 {
        self.inner.power_received()
    }

    fn is_working(&self) -> bool {
        self.inner.is_working()
    }
}

/// A consumer that asks for more than its own rating.
#[derive(Debug)]
pub struct GreedyConsumer {
    pub pos: NodePos,
    pub max: Fixed64,
    pub ask: Fixed64,
    pub received: Fixed64,
}

impl ElectricConsumer for GreedyConsumer {
    fn position(&self) -> NodePos {
        self.pos
    }

    fn max_consumption(&self) -> Fixed64 {
        self.max
    }

    fn consume_request(&mut self) -> Fixed64 {
        self.ask
    }

    fn consume_receive(&mut self, amount: Fixed64) {
        self.received = amount;
    }

    fn power_requested(&self) -> Fixed64 {
        self.ask
    }

    fn power_received(&self) -> Fixed64 {
        self.received
    }

    fn is_working(&self) -> bool {
        true
    }
}
