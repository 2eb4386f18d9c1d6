//! Cached conduction-path tracing over the voxel network.
//!
//! [`NetworkTracer::find_path`] answers "how does current get from here to
//! there" for the power module. It consults the shared [`PathCache`] first
//! and only runs the breadth-first search in [`search`] when the cached
//! entry is missing or was traced against an older topology version.
//!
//! # Cache policy
//!
//! - Hit with the current version: returned as is.
//! - Hit with an older version, or miss: re-traced, then stored with the
//!   current version.
//! - No path found: nothing is stored and any stale entry for the pair is
//!   purged, so the cache never holds a negative result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};
use volta_cache::PathCache;
use volta_core::id::NodePos;
use volta_core::path::TracedPath;
use volta_core::world::WorldAccess;

pub mod search;
pub use search::{hop_rating, path_rating, trace_path};

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Snapshot of how [`NetworkTracer::find_path`] calls were resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TracerStats {
    /// Served from the cache with a current version.
    pub hits: u64,
    /// Found in the cache with an older version and re-traced.
    pub stale: u64,
    /// Not in the cache at all.
    pub misses: u64,
    /// Searches that found no path.
    pub unreachable: u64,
}

impl TracerStats {
    /// Number of searches actually run.
    pub fn searches(&self) -> u64 {
        self.stale + self.misses
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    stale: AtomicU64,
    misses: AtomicU64,
    unreachable: AtomicU64,
}

// ---------------------------------------------------------------------------
// NetworkTracer
// ---------------------------------------------------------------------------

/// Path finder backed by a shared [`PathCache`].
///
/// Cheap to share across threads; every method takes `&self`.
#[derive(Debug)]
pub struct NetworkTracer {
    cache: Arc<PathCache>,
    counters: Counters,
}

impl NetworkTracer {
    pub fn new(cache: Arc<PathCache>) -> Self {
        Self {
            cache,
            counters: Counters::default(),
        }
    }

    pub fn cache(&self) -> &Arc<PathCache> {
        &self.cache
    }

    /// Find the conduction path from `origin` to `destination` in `world`,
    /// whose topology is at `version`.
    ///
    /// An empty path means the destination is unreachable.
    pub fn find_path<W: WorldAccess + ?Sized>(
        &self,
        world: &W,
        origin: NodePos,
        destination: NodePos,
        version: u64,
    ) -> Arc<TracedPath> {
        match self.cache.try_get(origin, destination) {
            Some(hit) if hit.is_current(version) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return hit.path;
            }
            Some(hit) => {
                self.counters.stale.fetch_add(1, Ordering::Relaxed);
                debug!(%origin, %destination, cached = hit.version, version, "cached path is stale");
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        let path = Arc::new(trace_path(world, origin, destination));
        if path.is_empty() {
            self.counters.unreachable.fetch_add(1, Ordering::Relaxed);
            self.cache.remove_all(origin, destination);
            debug!(%origin, %destination, version, "no conduction path");
        } else {
            trace!(%origin, %destination, version, hops = path.hop_count(), "path traced");
            self.cache
                .add_or_update(origin, destination, version, Arc::clone(&path));
        }
        path
    }

    /// Drop the cached path for one directed pair.
    pub fn forget(&self, origin: NodePos, destination: NodePos) -> bool {
        self.cache.remove_all(origin, destination)
    }

    pub fn stats(&self) -> TracerStats {
        TracerStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            stale: self.counters.stale.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            unreachable: self.counters.unreachable.load(Ordering::Relaxed),
        }
    }
}
