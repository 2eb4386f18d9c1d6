//! Tunables for the cache, the maintenance sweep and the negotiation loop.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors raised by [`VoltaConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("cache_ttl_minutes must be greater than zero")]
    ZeroTtl,
    #[error("cleanup_interval_secs must be greater than zero when set")]
    ZeroCleanupInterval,
    #[error("tick_interval_ms must be greater than zero")]
    ZeroTickInterval,
    #[error("burnout_ticks must be greater than zero")]
    ZeroBurnoutTicks,
    #[error("cache_shards must be greater than zero")]
    ZeroShards,
}

/// Runtime configuration. Every field has a default, so a config file only
/// needs to name the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoltaConfig {
    /// How long an unread path cache entry survives, in minutes.
    pub cache_ttl_minutes: u64,
    /// Period of the cache sweep. Derived from the TTL when absent.
    pub cleanup_interval_secs: Option<u64>,
    /// Cadence of the power negotiation, in milliseconds.
    pub tick_interval_ms: u64,
    /// Consecutive overloaded negotiation ticks before a connection burns.
    pub burnout_ticks: u32,
    /// Number of independently locked cache shards.
    pub cache_shards: usize,
}

impl Default for VoltaConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 5,
            cleanup_interval_secs: None,
            tick_interval_ms: 500,
            burnout_ticks: 5,
            cache_shards: 16,
        }
    }
}

impl VoltaConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    /// The sweep period: the configured value, or one sixtieth of the TTL
    /// (never less than one second).
    pub fn cleanup_interval(&self) -> Duration {
        match self.cleanup_interval_secs {
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs((self.ttl().as_secs() / 60).max(1)),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_minutes == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        if self.cleanup_interval_secs == Some(0) {
            return Err(ConfigError::ZeroCleanupInterval);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.burnout_ticks == 0 {
            return Err(ConfigError::ZeroBurnoutTicks);
        }
        if self.cache_shards == 0 {
            return Err(ConfigError::ZeroShards);
        }
        Ok(())
    }
}
