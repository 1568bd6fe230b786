//! Configuration for the cache engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the result cache
///
/// Capacity is enforced by eviction, not admission control: a `put`
/// always succeeds and the engine evicts least-recently-used entries
/// until usage is back under `max_memory_bytes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Memory budget for cached data in bytes
    pub max_memory_bytes: u64,

    /// Secondary bound on the number of entries
    pub max_entries: usize,

    /// Optional time-to-live for entries; `None` disables expiry
    pub default_ttl: Option<Duration>,

    /// TTL jitter factor (0.0 - 1.0), applied only when a TTL is set.
    /// Adds random variation to prevent synchronized expiry.
    pub ttl_jitter: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 256 MB default budget
            max_memory_bytes: 256 * 1024 * 1024,
            max_entries: 100_000,
            // No expiry by default; recency pressure reclaims memory
            default_ttl: None,
            ttl_jitter: 0.1,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_memory_bytes == 0 {
            return Err("max_memory_bytes must be greater than 0".to_string());
        }

        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err("ttl_jitter must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }

    /// Calculate the effective TTL with jitter applied; `None` when
    /// expiry is disabled
    pub fn ttl_with_jitter(&self) -> Option<Duration> {
        let ttl = self.default_ttl?;
        if self.ttl_jitter == 0.0 {
            return Some(ttl);
        }

        let base_secs = ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(1.0);

        Some(Duration::from_secs_f64(final_secs))
    }

    /// Configuration for memory-constrained deployments
    pub fn small() -> Self {
        Self {
            max_memory_bytes: 16 * 1024 * 1024, // 16 MB
            max_entries: 4_000,
            ..Default::default()
        }
    }

    /// Configuration for large deployments with heavy retrieval traffic
    pub fn large() -> Self {
        Self {
            max_memory_bytes: 2 * 1024 * 1024 * 1024, // 2 GB
            max_entries: 1_000_000,
            ..Default::default()
        }
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    max_memory_bytes: Option<u64>,
    max_entries: Option<usize>,
    default_ttl: Option<Option<Duration>>,
    ttl_jitter: Option<f64>,
}

impl CacheConfigBuilder {
    /// Set the memory budget in bytes
    pub fn max_memory_bytes(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Set the maximum number of entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set a time-to-live for entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(Some(ttl));
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            max_memory_bytes: self.max_memory_bytes.unwrap_or(defaults.max_memory_bytes),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
        }
    }
}
