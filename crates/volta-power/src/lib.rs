//! Power negotiation for the Volta electrical network.
//!
//! Every negotiation tick the [`PowerModule`] asks each consumer what it
//! wants, routes each request through the [`NetworkTracer`] to the nearest
//! reachable producer that still has power to spare, grants what that
//! producer and every connection on the path can carry, and hands the grants
//! back. Connections asked to carry more than their rating count down
//! towards burnout.
//!
//! # Design
//!
//! - Producers and consumers are registered as trait objects keyed by
//!   slotmap ids, so iteration follows registration order.
//! - Grants are made in that order. Earlier consumers are never starved by
//!   later ones.
//! - A connection's rating is shared: grants crossing the same connection
//!   add up and never exceed it.
//! - A consumer is served by one producer per tick. When the nearest one is
//!   drained, or its path is saturated, the next reachable one is tried.
//! - Overcurrent compares the load consumers tried to push across a
//!   connection with its rating. Each request counts up to what its
//!   producer could still supply; throttling by the connection itself does
//!   not stop the countdown.
//! - Events fire on transitions, except overcurrent, which fires every
//!   overloaded tick with the remaining countdown.
//! - The module never writes to the world. Burnout countdowns are returned
//!   as [`BurnoutReport`]s for the world owner to apply.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, trace, warn};
use volta_core::config::VoltaConfig;
use volta_core::eparams::BurnoutReport;
use volta_core::facing::BlockFacing;
use volta_core::fixed::{Fixed64, Ticks};
use volta_core::id::NodePos;
use volta_core::path::{Hop, TracedPath};
use volta_core::world::WorldAccess;
use volta_network::{NetworkTracer, hop_rating};

pub mod device;
pub use device::{ElectricConsumer, ElectricProducer, Generator, MachineConsumer};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// A world the negotiation can read.
///
/// With the `parallel` feature, routes are traced from rayon workers that
/// share the world, so it must also be `Sync`.
#[cfg(feature = "parallel")]
pub trait PowerWorld: WorldAccess + Sync {}

#[cfg(feature = "parallel")]
impl<T: WorldAccess + Sync + ?Sized> PowerWorld for T {}

/// A world the negotiation can read.
#[cfg(not(feature = "parallel"))]
pub trait PowerWorld: WorldAccess {}

#[cfg(not(feature = "parallel"))]
impl<T: WorldAccess + ?Sized> PowerWorld for T {}

slotmap::new_key_type! {
    /// Handle of a registered producer.
    pub struct ProducerId;
    /// Handle of a registered consumer.
    pub struct ConsumerId;
}

// ---------------------------------------------------------------------------
// Consumer lifecycle
// ---------------------------------------------------------------------------

/// Where a consumer stands in the negotiation.
///
/// Within a tick a consumer moves `Idle | Requesting -> Allocated ->
/// Consuming`. After the tick it rests in `Idle` (declined), `Requesting`
/// (asked but received nothing) or `Consuming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConsumerState {
    #[default]
    Idle,
    Requesting,
    Allocated,
    Consuming,
}

/// Outcome of the last negotiation for one consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Allocation {
    /// Producer the consumer was routed to, if any was reachable.
    pub producer: Option<ProducerId>,
    /// Request after clamping to `[0, max_consumption]`.
    pub requested: Fixed64,
    pub granted: Fixed64,
    /// Length of the route in hops.
    pub hops: usize,
}

// ---------------------------------------------------------------------------
// Power events
// ---------------------------------------------------------------------------

/// Events emitted by [`PowerModule::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerEvent {
    /// A consumer that asked for power received none, after having been
    /// served (or never having asked) before.
    ConsumerUnpowered {
        consumer: ConsumerId,
        requested: Fixed64,
        tick: Ticks,
    },
    /// A previously unpowered consumer is receiving power again.
    ConsumerRestored { consumer: ConsumerId, tick: Ticks },
    /// A connection was asked to carry more than its rating.
    Overcurrent {
        pos: NodePos,
        face: BlockFacing,
        load: Fixed64,
        rating: Fixed64,
        ticks_before_burnout: u32,
        tick: Ticks,
    },
    /// A connection stayed overloaded long enough to burn out.
    Burnout {
        pos: NodePos,
        face: BlockFacing,
        tick: Ticks,
    },
}

// ---------------------------------------------------------------------------
// Internal bookkeeping
// ---------------------------------------------------------------------------

/// A connection between two adjacent nodes, named from the side that sorts
/// first so both travel directions map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Connection {
    pos: NodePos,
    face: BlockFacing,
}

impl Connection {
    fn of(hop: &Hop) -> Self {
        if hop.from <= hop.to {
            Self {
                pos: hop.from,
                face: hop.face,
            }
        } else {
            Self {
                pos: hop.to,
                face: hop.face.opposite(),
            }
        }
    }

    /// The side with the lower rated power; ties go to the first side.
    fn weaker_side<W: WorldAccess + ?Sized>(&self, world: &W) -> (NodePos, BlockFacing) {
        let other = (self.pos.offset(self.face), self.face.opposite());
        let here = world.eparams(self.pos, self.face).rated_power();
        let there = world.eparams(other.0, other.1).rated_power();
        if there < here {
            other
        } else {
            (self.pos, self.face)
        }
    }
}

#[derive(Debug)]
struct ConsumerSlot {
    device: Box<dyn ElectricConsumer>,
    state: ConsumerState,
    allocation: Allocation,
    starved: bool,
}

#[derive(Debug, Clone, Copy)]
struct Source {
    id: ProducerId,
    pos: NodePos,
    available: Fixed64,
}

#[derive(Debug, Clone, Copy)]
struct Demand {
    id: ConsumerId,
    pos: NodePos,
    requested: Fixed64,
}

/// A reachable producer for one demand.
#[derive(Debug, Clone)]
struct Route {
    /// Index into the tick's source list.
    source: usize,
    path: Arc<TracedPath>,
}

// ---------------------------------------------------------------------------
// Power module
// ---------------------------------------------------------------------------

/// Registry of producers and consumers plus the per-tick negotiation.
#[derive(Debug)]
pub struct PowerModule {
    tracer: NetworkTracer,
    producers: SlotMap<ProducerId, Box<dyn ElectricProducer>>,
    consumers: SlotMap<ConsumerId, ConsumerSlot>,
    /// Consecutive overloaded ticks per connection.
    overloads: BTreeMap<Connection, u32>,
    burnout_ticks: u32,
    reports: Vec<BurnoutReport>,
}

impl PowerModule {
    pub fn new(tracer: NetworkTracer, config: &VoltaConfig) -> Self {
        Self {
            tracer,
            producers: SlotMap::with_key(),
            consumers: SlotMap::with_key(),
            overloads: BTreeMap::new(),
            burnout_ticks: config.burnout_ticks.max(1),
            reports: Vec::new(),
        }
    }

    pub fn tracer(&self) -> &NetworkTracer {
        &self.tracer
    }

    // -- Registration --

    pub fn add_producer(&mut self, producer: Box<dyn ElectricProducer>) -> ProducerId {
        let pos = producer.position();
        let id = self.producers.insert(producer);
        debug!(%pos, ?id, "producer registered");
        id
    }

    pub fn add_consumer(&mut self, consumer: Box<dyn ElectricConsumer>) -> ConsumerId {
        let pos = consumer.position();
        let id = self.consumers.insert(ConsumerSlot {
            device: consumer,
            state: ConsumerState::Idle,
            allocation: Allocation::default(),
            starved: false,
        });
        debug!(%pos, ?id, "consumer registered");
        id
    }

    /// Unregister a producer and purge every cached path from it.
    pub fn remove_producer(&mut self, id: ProducerId) -> Option<Box<dyn ElectricProducer>> {
        let producer = self.producers.remove(id)?;
        let origin = producer.position();
        for slot in self.consumers.values() {
            self.tracer.forget(origin, slot.device.position());
        }
        Some(producer)
    }

    /// Unregister a consumer and purge every cached path to it.
    pub fn remove_consumer(&mut self, id: ConsumerId) -> Option<Box<dyn ElectricConsumer>> {
        let slot = self.consumers.remove(id)?;
        let target = slot.device.position();
        for producer in self.producers.values() {
            self.tracer.forget(producer.position(), target);
        }
        Some(slot.device)
    }

    // -- Queries --

    pub fn producer(&self, id: ProducerId) -> Option<&dyn ElectricProducer> {
        self.producers.get(id).map(|p| p.as_ref())
    }

    pub fn consumer(&self, id: ConsumerId) -> Option<&dyn ElectricConsumer> {
        self.consumers.get(id).map(|s| s.device.as_ref())
    }

    pub fn consumer_state(&self, id: ConsumerId) -> Option<ConsumerState> {
        self.consumers.get(id).map(|s| s.state)
    }

    pub fn allocation(&self, id: ConsumerId) -> Option<Allocation> {
        self.consumers.get(id).map(|s| s.allocation)
    }

    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Burnout countdown changes from the last tick.
    pub fn burnout_reports(&self) -> &[BurnoutReport] {
        &self.reports
    }

    pub fn take_burnout_reports(&mut self) -> Vec<BurnoutReport> {
        std::mem::take(&mut self.reports)
    }

    // -- Negotiation --

    /// Run one negotiation tick against `world`, whose topology is at
    /// `version`.
    ///
    /// 1. Collect each consumer's request, clamped to its rating.
    /// 2. Find every producer with power to give that can reach each
    ///    consumer, nearest first (fewest hops, ties by producer
    ///    registration order).
    /// 3. Grant in consumer order from the first of those producers that
    ///    can still deliver: the minimum of the request, what the producer
    ///    has left, and the headroom of every connection on the route.
    /// 4. Deliver the grants, then tell each producer its total draw.
    /// 5. Advance or clear the overcurrent countdown of every connection.
    ///
    /// Returns the events emitted this tick.
    pub fn tick<W>(&mut self, world: &W, version: u64, current_tick: Ticks) -> Vec<PowerEvent>
    where
        W: PowerWorld + ?Sized,
    {
        let zero = Fixed64::ZERO;
        let mut events = Vec::new();
        self.reports.clear();

        // Step 1: requests.
        let sources: Vec<Source> = self
            .producers
            .iter_mut()
            .map(|(id, producer)| Source {
                id,
                pos: producer.position(),
                available: producer.produce_give().max(zero),
            })
            .collect();

        let mut demands = Vec::new();
        for (id, slot) in self.consumers.iter_mut() {
            let requested = if slot.device.is_burned() {
                zero
            } else {
                let max = slot.device.max_consumption().max(zero);
                slot.device.consume_request().clamp(zero, max)
            };
            slot.allocation = Allocation {
                requested,
                ..Allocation::default()
            };
            if requested > zero {
                slot.state = ConsumerState::Requesting;
                demands.push(Demand {
                    id,
                    pos: slot.device.position(),
                    requested,
                });
            } else {
                slot.state = ConsumerState::Idle;
            }
        }

        // Step 2: routing.
        let candidates = route_all(&self.tracer, world, version, &sources, &demands);

        // Step 3: allocation.
        let mut ledger = Ledger::new(&sources);
        // connection -> (load asked across it, rating)
        let mut asked: BTreeMap<Connection, (Fixed64, Fixed64)> = BTreeMap::new();

        for (demand, routes) in demands.iter().zip(&candidates) {
            let Some(nearest) = routes.first() else {
                continue;
            };

            let (route, grant) = routes
                .iter()
                .find_map(|route| {
                    let grant = ledger.headroom(world, route, demand.requested);
                    (grant > zero).then_some((route, grant))
                })
                .unwrap_or((nearest, zero));

            let servable = demand.requested.min(ledger.remaining[route.source]);
            for hop in route.path.hops() {
                let conn = Connection::of(&hop);
                let rating = ledger.rating(world, conn, &hop);
                let entry = asked.entry(conn).or_insert((zero, rating));
                entry.0 = entry.0.saturating_add(servable);
            }
            ledger.commit(route, grant);

            if let Some(slot) = self.consumers.get_mut(demand.id) {
                slot.allocation.producer = Some(sources[route.source].id);
                slot.allocation.granted = grant;
                slot.allocation.hops = route.path.hop_count();
                if grant > zero {
                    slot.state = ConsumerState::Allocated;
                }
            }
            trace!(
                consumer = ?demand.id,
                requested = %demand.requested,
                granted = %grant,
                hops = route.path.hop_count(),
                fallbacks = routes.iter().position(|r| r.source == route.source).unwrap_or(0),
                "allocation"
            );
        }

        // Step 4: delivery.
        for (id, slot) in self.consumers.iter_mut() {
            slot.device.consume_receive(slot.allocation.granted);
            let received = slot.device.power_received();
            slot.state = if received > zero {
                ConsumerState::Consuming
            } else if slot.allocation.requested > zero && slot.device.is_working() {
                ConsumerState::Requesting
            } else {
                ConsumerState::Idle
            };

            let starved = slot.state == ConsumerState::Requesting;
            if starved && !slot.starved {
                events.push(PowerEvent::ConsumerUnpowered {
                    consumer: id,
                    requested: slot.allocation.requested,
                    tick: current_tick,
                });
            } else if !starved && slot.starved && slot.state == ConsumerState::Consuming {
                events.push(PowerEvent::ConsumerRestored {
                    consumer: id,
                    tick: current_tick,
                });
            }
            slot.starved = starved;
        }

        for (source, left) in sources.iter().zip(&ledger.remaining) {
            if let Some(producer) = self.producers.get_mut(source.id) {
                producer.produce_order(source.available.saturating_sub(*left));
            }
        }

        // Step 5: overcurrent.
        self.advance_overloads(world, &asked, current_tick, &mut events);

        debug!(
            tick = current_tick,
            version,
            consumers = self.consumers.len(),
            routed = candidates.iter().filter(|r| !r.is_empty()).count(),
            events = events.len(),
            "negotiation tick"
        );
        events
    }

    fn advance_overloads<W: WorldAccess + ?Sized>(
        &mut self,
        world: &W,
        asked: &BTreeMap<Connection, (Fixed64, Fixed64)>,
        current_tick: Ticks,
        events: &mut Vec<PowerEvent>,
    ) {
        let mut recovered: BTreeSet<Connection> = self.overloads.keys().copied().collect();

        for (conn, &(load, rating)) in asked {
            if load <= rating {
                continue;
            }
            recovered.remove(conn);

            let count = {
                let count = self.overloads.entry(*conn).or_insert(0);
                *count += 1;
                *count
            };
            let (pos, face) = conn.weaker_side(world);

            if count >= self.burnout_ticks {
                self.overloads.remove(conn);
                warn!(%pos, %face, load = %load, rating = %rating, "connection burned out");
                events.push(PowerEvent::Burnout {
                    pos,
                    face,
                    tick: current_tick,
                });
                self.reports.push(BurnoutReport {
                    pos,
                    face,
                    ticks_before_burnout: 0,
                    burnout: true,
                });
            } else {
                let left = self.burnout_ticks - count;
                events.push(PowerEvent::Overcurrent {
                    pos,
                    face,
                    load,
                    rating,
                    ticks_before_burnout: left,
                    tick: current_tick,
                });
                self.reports.push(BurnoutReport {
                    pos,
                    face,
                    ticks_before_burnout: left,
                    burnout: false,
                });
            }
        }

        for conn in recovered {
            self.overloads.remove(&conn);
            let (pos, face) = conn.weaker_side(world);
            self.reports.push(BurnoutReport {
                pos,
                face,
                ticks_before_burnout: 0,
                burnout: false,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Every producer with power to give that reaches `target`, nearest first.
/// Ties keep the source order, which is producer registration order.
fn reachable_sources<W: WorldAccess + ?Sized>(
    tracer: &NetworkTracer,
    world: &W,
    version: u64,
    sources: &[Source],
    target: NodePos,
) -> Vec<Route> {
    let mut routes: Vec<Route> = sources
        .iter()
        .enumerate()
        .filter(|(_, source)| source.available > Fixed64::ZERO)
        .filter_map(|(index, source)| {
            let path = tracer.find_path(world, source.pos, target, version);
            (!path.is_empty()).then_some(Route {
                source: index,
                path,
            })
        })
        .collect();
    routes.sort_by_key(|route| route.path.hop_count());
    routes
}

fn route_all<W: PowerWorld + ?Sized>(
    tracer: &NetworkTracer,
    world: &W,
    version: u64,
    sources: &[Source],
    demands: &[Demand],
) -> Vec<Vec<Route>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        demands
            .par_iter()
            .map(|d| reachable_sources(tracer, world, version, sources, d.pos))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        demands
            .iter()
            .map(|d| reachable_sources(tracer, world, version, sources, d.pos))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Allocation ledger
// ---------------------------------------------------------------------------

/// What is left to hand out during one tick.
#[derive(Debug)]
struct Ledger {
    /// Unallocated power per source, parallel to the tick's source list.
    remaining: Vec<Fixed64>,
    carried: HashMap<Connection, Fixed64>,
    ratings: HashMap<Connection, Fixed64>,
}

impl Ledger {
    fn new(sources: &[Source]) -> Self {
        Self {
            remaining: sources.iter().map(|s| s.available).collect(),
            carried: HashMap::new(),
            ratings: HashMap::new(),
        }
    }

    fn rating<W: WorldAccess + ?Sized>(&mut self, world: &W, conn: Connection, hop: &Hop) -> Fixed64 {
        *self
            .ratings
            .entry(conn)
            .or_insert_with(|| hop_rating(world, hop))
    }

    /// The most `route` can deliver towards `requested` right now.
    fn headroom<W: WorldAccess + ?Sized>(
        &mut self,
        world: &W,
        route: &Route,
        requested: Fixed64,
    ) -> Fixed64 {
        let zero = Fixed64::ZERO;
        let mut grant = requested.min(self.remaining[route.source]);
        for hop in route.path.hops() {
            let conn = Connection::of(&hop);
            let rating = self.rating(world, conn, &hop);
            let used = self.carried.get(&conn).copied().unwrap_or(zero);
            grant = grant.min(rating.saturating_sub(used).max(zero));
        }
        grant.max(zero)
    }

    fn commit(&mut self, route: &Route, grant: Fixed64) {
        for hop in route.path.hops() {
            let used = self
                .carried
                .entry(Connection::of(&hop))
                .or_insert(Fixed64::ZERO);
            *used = used.saturating_add(grant);
        }
        self.remaining[route.source] = self.remaining[route.source].saturating_sub(grant);
    }
}
