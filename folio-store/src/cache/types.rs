//! Core type definitions for the cache engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Cache key type - unique within a cache type
pub type CacheKey = String;

/// Cache value type - stores serialized payloads (embeddings, retrieval
/// results, rendered previews)
pub type CacheValue = String;

/// Per-type statistics, keyed by the open cache-type tag
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheTypeStats {
    /// Number of entries currently cached under this type
    pub count: usize,

    /// Estimated memory usage of this type's entries in bytes
    pub memory_usage: u64,

    /// Cache hits recorded for this type
    pub hits: u64,

    /// Cache misses recorded for this type
    pub misses: u64,
}

/// Snapshot of cache performance, recomputed on demand from the live
/// entry set and counters - never persisted independently
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Total cache hits across all types
    pub hits: u64,

    /// Total cache misses across all types
    pub misses: u64,

    /// Fraction of accesses served from cache, in [0, 1]; 0 when no
    /// accesses have occurred
    pub hit_rate: f64,

    /// Fraction of accesses that missed, in [0, 1]; 0 when no accesses
    /// have occurred
    pub miss_rate: f64,

    /// Number of entries currently in the cache
    pub item_count: usize,

    /// Estimated total memory usage in bytes
    pub memory_usage: u64,

    /// Per-type breakdown
    pub types: HashMap<String, CacheTypeStats>,
}

impl CacheStats {
    /// Compute hit/miss fractions from raw counters. Both are 0 when no
    /// accesses occurred; otherwise they sum to 1.
    pub fn rates(hits: u64, misses: u64) -> (f64, f64) {
        let total = hits + misses;
        if total == 0 {
            (0.0, 0.0)
        } else {
            let hit_rate = hits as f64 / total as f64;
            (hit_rate, 1.0 - hit_rate)
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.3}, items: {}, memory: {} bytes, types: {} }}",
            self.hits,
            self.misses,
            self.hit_rate,
            self.item_count,
            self.memory_usage,
            self.types.len()
        )
    }
}
