//! Uncached face-aware breadth-first search.

use std::collections::{HashMap, VecDeque};

use volta_core::facing::{BlockFacing, Facing};
use volta_core::fixed::Fixed64;
use volta_core::id::NodePos;
use volta_core::path::{Hop, TracedPath};
use volta_core::world::WorldAccess;

/// Search `world` for the shortest conduction path from `origin` to
/// `destination`.
///
/// Faces of each node are expanded in [`BlockFacing::ALL`] order, and a face
/// is expanded at most once per search. Crossing a connection marks both
/// touching faces as processed, so the search never walks a link backwards.
/// Returns [`TracedPath::unreachable`] when the destination cannot be
/// reached and [`TracedPath::zero_length`] when it is the origin.
pub fn trace_path<W: WorldAccess + ?Sized>(
    world: &W,
    origin: NodePos,
    destination: NodePos,
) -> TracedPath {
    if origin == destination {
        return TracedPath::zero_length(origin);
    }

    let mut processed: HashMap<NodePos, Facing> = HashMap::new();
    // node -> (previous node, face of the previous node that was crossed)
    let mut came_from: HashMap<NodePos, (NodePos, BlockFacing)> = HashMap::new();
    let mut queue = VecDeque::from([origin]);
    processed.insert(origin, Facing::NONE);

    let mut found = false;
    'search: while let Some(current) = queue.pop_front() {
        let done = processed.get(&current).copied().unwrap_or(Facing::NONE);
        let pending = world.connection(current) - done;

        for face in pending.iter() {
            processed.entry(current).or_insert(Facing::NONE).insert(face);

            let Some((next, _)) = world.neighbor(current, face) else {
                continue;
            };
            processed
                .entry(next)
                .or_insert(Facing::NONE)
                .insert(face.opposite());

            if next == origin || came_from.contains_key(&next) {
                continue;
            }
            came_from.insert(next, (current, face));
            if next == destination {
                found = true;
                break 'search;
            }
            queue.push_back(next);
        }
    }

    if !found {
        return TracedPath::unreachable();
    }

    // Walk back from the destination, then flip.
    let mut path = vec![destination];
    let mut entered_from = Vec::new();
    let mut used_connections = Vec::new();
    let mut node = destination;
    while let Some(&(previous, face)) = came_from.get(&node) {
        entered_from.push(Some(face.opposite()));
        used_connections.push(Facing::from(face));
        path.push(previous);
        node = previous;
    }
    entered_from.push(None);

    path.reverse();
    entered_from.reverse();
    used_connections.reverse();

    let processed = path
        .iter()
        .map(|p| processed.get(p).copied().unwrap_or(Facing::NONE))
        .collect();

    TracedPath {
        path,
        entered_from,
        processed,
        used_connections,
    }
}

/// Wattage the connection crossed by `hop` can carry: the weaker of the two
/// touching faces.
pub fn hop_rating<W: WorldAccess + ?Sized>(world: &W, hop: &Hop) -> Fixed64 {
    let here = world.eparams(hop.from, hop.face);
    let there = world.eparams(hop.to, hop.face.opposite());
    here.connection_rating(&there)
}

/// The most restrictive connection rating along `path`, or `None` for a
/// path with no hops (nothing on the path limits the flow).
pub fn path_rating<W: WorldAccess + ?Sized>(world: &W, path: &TracedPath) -> Option<Fixed64> {
    path.hops().map(|hop| hop_rating(world, &hop)).min()
}
