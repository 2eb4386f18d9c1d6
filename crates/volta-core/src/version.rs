use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter bumped on every connectivity-affecting change.
///
/// Cached paths are stamped with the version they were traced against; a
/// path whose stamp differs from [`TopologyVersion::current`] is stale.
/// Starts at 1 so that a zeroed stamp never looks current.
#[derive(Debug)]
pub struct TopologyVersion(AtomicU64);

impl Default for TopologyVersion {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyVersion {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Resume counting from a known value.
    pub fn starting_at(version: u64) -> Self {
        Self(AtomicU64::new(version))
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Record a topology change. Returns the new version.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

impl Clone for TopologyVersion {
    fn clone(&self) -> Self {
        Self::starting_at(self.current())
    }
}
