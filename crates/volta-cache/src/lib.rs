//! Path cache for the Volta electrical network.
//!
//! Memoizes the most recent conduction path computed for each directed
//! (origin, destination) pair, stamped with the topology version it was
//! traced against. The cache has no electrical knowledge: it stores what it
//! is given and leaves the staleness decision to the caller, who compares
//! the stamp with the current topology version.
//!
//! # Design
//!
//! - One slot per directed pair. A->B and B->A are unrelated entries.
//! - Entries expire after a TTL without reads. Reads refresh the timestamp,
//!   updates do not, so a pair that is only ever rewritten still ages out.
//! - The map is split into independently locked shards. Last-accessed
//!   stamps are atomics, so a hit only takes a shard read lock.
//! - [`PathCache::cleanup`] snapshots stale keys under a read lock and then
//!   removes them shard by shard, rechecking each stamp, so the sweep never
//!   holds more than one shard lock at a time.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::{BuildHasher, RandomState};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, trace};
use volta_core::clock::Clock;
use volta_core::config::VoltaConfig;
use volta_core::id::NodePos;
use volta_core::path::TracedPath;

pub mod janitor;
pub use janitor::CacheJanitor;

/// Shard count used by [`PathCache::new`].
pub const DEFAULT_SHARDS: usize = 16;

// ---------------------------------------------------------------------------
// Keys and entries
// ---------------------------------------------------------------------------

/// Directed cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey {
    pub origin: NodePos,
    pub destination: NodePos,
}

impl PathKey {
    pub fn new(origin: NodePos, destination: NodePos) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    path: Arc<TracedPath>,
    version: u64,
    /// Nanoseconds on the cache clock.
    last_accessed: AtomicU64,
}

impl CacheEntry {
    fn last_accessed(&self) -> u64 {
        self.last_accessed.load(Ordering::Acquire)
    }

    fn touch(&self, now: u64) {
        self.last_accessed.fetch_max(now, Ordering::AcqRel);
    }
}

/// A successful lookup: a shared view of the stored path and its stamp.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub path: Arc<TracedPath>,
    pub version: u64,
}

impl CacheHit {
    /// `true` if the entry was traced against `version`.
    pub fn is_current(&self, version: u64) -> bool {
        self.version == version
    }
}

type Shard = RwLock<HashMap<PathKey, CacheEntry>>;

// ---------------------------------------------------------------------------
// PathCache
// ---------------------------------------------------------------------------

/// Concurrent, TTL-evicted store of traced paths.
///
/// Shared between the tick loop and the maintenance sweep through an
/// [`Arc`]; every method takes `&self`.
#[derive(Debug)]
pub struct PathCache {
    shards: Box<[Shard]>,
    hasher: RandomState,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PathCache {
    /// Create a cache whose entries expire after `ttl` without reads.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::with_shards(ttl, DEFAULT_SHARDS, clock)
    }

    /// Like [`PathCache::new`] with an explicit shard count (at least one).
    pub fn with_shards(ttl: Duration, shards: usize, clock: Arc<dyn Clock>) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            hasher: RandomState::new(),
            ttl,
            clock,
        }
    }

    /// Build from the TTL and shard count in `config`.
    pub fn with_config(config: &VoltaConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_shards(config.ttl(), config.cache_shards, clock)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn shard(&self, key: &PathKey) -> &Shard {
        let index = self.hasher.hash_one(key) as usize % self.shards.len();
        &self.shards[index]
    }

    fn now_nanos(&self) -> u64 {
        u64::try_from(self.clock.now().as_nanos()).unwrap_or(u64::MAX)
    }

    // -- Lookup --

    /// Look up the entry for `origin -> destination`.
    ///
    /// A hit refreshes the entry's last-accessed time whatever its version.
    pub fn try_get(&self, origin: NodePos, destination: NodePos) -> Option<CacheHit> {
        let key = PathKey::new(origin, destination);
        let shard = self.shard(&key).read();
        let entry = shard.get(&key)?;
        entry.touch(self.now_nanos());
        trace!(%origin, %destination, version = entry.version, "path cache hit");
        Some(CacheHit {
            path: Arc::clone(&entry.path),
            version: entry.version,
        })
    }

    /// Last-accessed time of an entry, without refreshing it.
    pub fn last_accessed(&self, origin: NodePos, destination: NodePos) -> Option<Duration> {
        let key = PathKey::new(origin, destination);
        self.shard(&key)
            .read()
            .get(&key)
            .map(|e| Duration::from_nanos(e.last_accessed()))
    }

    /// `true` if an entry exists, without refreshing it.
    pub fn contains(&self, origin: NodePos, destination: NodePos) -> bool {
        let key = PathKey::new(origin, destination);
        self.shard(&key).read().contains_key(&key)
    }

    // -- Mutation --

    /// Store `path` for `origin -> destination`, stamped with `version`.
    ///
    /// An existing entry is overwritten in place except for its
    /// last-accessed time.
    pub fn add_or_update(
        &self,
        origin: NodePos,
        destination: NodePos,
        version: u64,
        path: impl Into<Arc<TracedPath>>,
    ) {
        let key = PathKey::new(origin, destination);
        let path = path.into();
        let mut shard = self.shard(&key).write();
        match shard.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.path = path;
                entry.version = version;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    path,
                    version,
                    last_accessed: AtomicU64::new(self.now_nanos()),
                });
            }
        }
    }

    /// Delete the entry for exactly this pair, whatever its version.
    /// Returns `true` if an entry was removed.
    pub fn remove_all(&self, origin: NodePos, destination: NodePos) -> bool {
        let key = PathKey::new(origin, destination);
        let removed = self.shard(&key).write().remove(&key).is_some();
        if removed {
            debug!(%origin, %destination, "path cache entry purged");
        }
        removed
    }

    /// Remove every entry not read within the TTL. Returns the number of
    /// entries removed.
    pub fn cleanup(&self) -> usize {
        let Some(cutoff) = self.clock.now().checked_sub(self.ttl) else {
            return 0;
        };
        let cutoff = u64::try_from(cutoff.as_nanos()).unwrap_or(u64::MAX);

        let mut removed = 0;
        for shard in self.shards.iter() {
            let stale: Vec<PathKey> = shard
                .read()
                .iter()
                .filter(|(_, entry)| entry.last_accessed() < cutoff)
                .map(|(key, _)| *key)
                .collect();
            if stale.is_empty() {
                continue;
            }

            // A reader may have refreshed an entry since the snapshot.
            let mut guard = shard.write();
            for key in stale {
                if guard
                    .get(&key)
                    .is_some_and(|entry| entry.last_accessed() < cutoff)
                {
                    guard.remove(&key);
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            debug!(removed, "path cache sweep");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }

    // -- Stats --

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.read().is_empty())
    }
}
