//! Cache engine with global LRU eviction and memory accounting
//!
//! Entries are partitioned by an open cache-type tag (embeddings,
//! retrieval results, previews, ...) but compete for one shared memory
//! budget, so a hot type reclaims space from a cold one instead of each
//! type starving behind its own quota. Eviction order is maintained in a
//! recency index beside the entry map, keeping eviction O(log n) rather
//! than a full scan.

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    types::{CacheStats, CacheTypeStats, CacheValue},
};
use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Typed result cache with hit/miss accounting and LRU eviction
///
/// Counters and entries are owned by the instance; instantiate one per
/// deployment (or per test) rather than sharing process-wide state.
pub struct ResultCache {
    config: CacheConfig,

    /// Entry map and recency index, mutated together under one lock.
    /// Critical sections are short and never span external I/O.
    shard: Arc<RwLock<CacheShard>>,

    /// Per-type hit/miss counters. Increments are atomic so concurrent
    /// accesses never lose updates; global totals are the sums over
    /// types, which lets `clear(type)` retire exactly that type's
    /// contribution.
    counters: Arc<RwLock<HashMap<String, Arc<TypeCounters>>>>,
}

#[derive(Default)]
struct TypeCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Ordering key for the recency index: least-recently-used first, ties
/// broken by earliest creation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RecencyKey {
    last_accessed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    cache_type: String,
    key: String,
}

impl RecencyKey {
    fn of(entry: &CacheEntry) -> Self {
        Self {
            last_accessed_at: entry.last_accessed_at,
            created_at: entry.created_at,
            cache_type: entry.cache_type.clone(),
            key: entry.key.clone(),
        }
    }
}

/// Internal cache storage
struct CacheShard {
    /// Entries nested by cache type, then key
    entries: HashMap<String, HashMap<String, CacheEntry>>,

    /// Recency index mirroring `entries` exactly
    recency: BTreeSet<RecencyKey>,

    /// Sum of entry size estimates in bytes
    memory_usage: u64,
}

impl CacheShard {
    fn get(&self, cache_type: &str, key: &str) -> Option<&CacheEntry> {
        self.entries.get(cache_type)?.get(key)
    }

    fn insert_entry(&mut self, entry: CacheEntry) {
        self.memory_usage += entry.size_bytes;
        self.recency.insert(RecencyKey::of(&entry));
        self.entries
            .entry(entry.cache_type.clone())
            .or_default()
            .insert(entry.key.clone(), entry);
    }

    fn remove_entry(&mut self, cache_type: &str, key: &str) -> Option<CacheEntry> {
        let type_map = self.entries.get_mut(cache_type)?;
        let entry = type_map.remove(key)?;
        if type_map.is_empty() {
            self.entries.remove(cache_type);
        }
        self.recency.remove(&RecencyKey::of(&entry));
        self.memory_usage = self.memory_usage.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    /// Record an access: refresh the recency index and return the value
    fn touch(&mut self, cache_type: &str, key: &str) -> Option<CacheValue> {
        let entry = self.entries.get_mut(cache_type)?.get_mut(key)?;
        self.recency.remove(&RecencyKey::of(entry));
        entry.mark_accessed();
        self.recency.insert(RecencyKey::of(entry));
        Some(entry.value.clone())
    }

    fn len(&self) -> usize {
        self.recency.len()
    }
}

impl ResultCache {
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!("Initializing result cache with config: {:?}", config);

        Self {
            config,
            shard: Arc::new(RwLock::new(CacheShard {
                entries: HashMap::new(),
                recency: BTreeSet::new(),
                memory_usage: 0,
            })),
            counters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Look up a value, recording a hit or a miss for the type.
    ///
    /// A hit refreshes the entry's recency; a TTL-expired entry is
    /// removed and counted as a miss. Fails only on an empty cache type
    /// or key.
    pub async fn get(&self, cache_type: &str, key: &str) -> Result<Option<CacheValue>> {
        validate_key(cache_type, key)?;
        let counters = self.counters_for(cache_type).await;

        let mut shard = self.shard.write().await;
        let expired = match shard.get(cache_type, key) {
            Some(entry) => entry.is_expired(),
            None => {
                counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!("cache miss: {}/{}", cache_type, key);
                return Ok(None);
            }
        };

        if expired {
            debug!("cache entry expired: {}/{}", cache_type, key);
            shard.remove_entry(cache_type, key);
            counters.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        let value = shard.touch(cache_type, key);
        counters.hits.fetch_add(1, Ordering::Relaxed);
        debug!("cache hit: {}/{}", cache_type, key);
        Ok(value)
    }

    /// Insert or overwrite an entry (last-write-wins), then evict
    /// least-recently-used entries until usage is back under budget.
    ///
    /// Never fails for capacity: an entry larger than the whole budget
    /// is accepted and immediately becomes the eviction victim.
    pub async fn put(
        &self,
        cache_type: &str,
        key: &str,
        value: CacheValue,
        size_estimate: u64,
    ) -> Result<()> {
        self.put_with_tags(cache_type, key, value, size_estimate, Vec::new())
            .await
    }

    /// Same as [`put`](Self::put), attaching invalidation tags
    pub async fn put_with_tags(
        &self,
        cache_type: &str,
        key: &str,
        value: CacheValue,
        size_estimate: u64,
        tags: Vec<String>,
    ) -> Result<()> {
        validate_key(cache_type, key)?;

        let mut entry = CacheEntry::new(
            cache_type,
            key.to_string(),
            value,
            size_estimate,
            self.config.ttl_with_jitter(),
        );
        for tag in tags {
            entry.add_tag(tag);
        }

        let mut shard = self.shard.write().await;
        if shard.remove_entry(cache_type, key).is_some() {
            debug!("overwriting cache entry: {}/{}", cache_type, key);
        }
        shard.insert_entry(entry);
        self.evict_over_budget(&mut shard);

        Ok(())
    }

    /// Snapshot of counters and usage, recomputed from the live sets
    pub async fn stats(&self) -> CacheStats {
        let shard = self.shard.read().await;
        let counters = self.counters.read().await;

        let mut types: HashMap<String, CacheTypeStats> = HashMap::new();
        for (tag, type_map) in &shard.entries {
            let type_stats = types.entry(tag.clone()).or_default();
            type_stats.count = type_map.len();
            type_stats.memory_usage = type_map.values().map(|e| e.size_bytes).sum();
        }

        let mut hits = 0;
        let mut misses = 0;
        for (tag, c) in counters.iter() {
            let h = c.hits.load(Ordering::Relaxed);
            let m = c.misses.load(Ordering::Relaxed);
            hits += h;
            misses += m;
            let type_stats = types.entry(tag.clone()).or_default();
            type_stats.hits = h;
            type_stats.misses = m;
        }

        let (hit_rate, miss_rate) = CacheStats::rates(hits, misses);
        CacheStats {
            hits,
            misses,
            hit_rate,
            miss_rate,
            item_count: shard.len(),
            memory_usage: shard.memory_usage,
            types,
        }
    }

    /// Remove all entries of the given type (resetting that type's
    /// counters), or everything with all counters when no type is given.
    /// This is the only operation that resets hit/miss counters.
    pub async fn clear(&self, cache_type: Option<&str>) -> Result<()> {
        match cache_type {
            None => {
                let mut shard = self.shard.write().await;
                let count = shard.len();
                shard.entries.clear();
                shard.recency.clear();
                shard.memory_usage = 0;
                self.counters.write().await.clear();
                info!("Cleared {} entries from cache, counters reset", count);
            }
            Some(tag) => {
                if tag.is_empty() {
                    return Err(StoreError::InvalidKey(
                        "cache type must not be empty".to_string(),
                    ));
                }
                let mut shard = self.shard.write().await;
                if let Some(type_map) = shard.entries.remove(tag) {
                    for entry in type_map.values() {
                        shard.recency.remove(&RecencyKey::of(entry));
                        shard.memory_usage =
                            shard.memory_usage.saturating_sub(entry.size_bytes);
                    }
                    info!("Cleared {} entries of cache type {}", type_map.len(), tag);
                }
                self.counters.write().await.remove(tag);
            }
        }
        Ok(())
    }

    /// Remove a single entry without touching the counters
    pub async fn remove(&self, cache_type: &str, key: &str) -> Result<Option<CacheValue>> {
        validate_key(cache_type, key)?;
        let mut shard = self.shard.write().await;
        Ok(shard.remove_entry(cache_type, key).map(|e| e.value))
    }

    /// Remove every entry carrying the given tag, across all types
    pub async fn invalidate_by_tag(&self, tag: &str) -> Result<usize> {
        let mut shard = self.shard.write().await;

        let matching: Vec<(String, String)> = shard
            .entries
            .iter()
            .flat_map(|(cache_type, type_map)| {
                type_map
                    .values()
                    .filter(|e| e.has_tag(tag))
                    .map(|e| (cache_type.clone(), e.key.clone()))
            })
            .collect();

        for (cache_type, key) in &matching {
            shard.remove_entry(cache_type, key);
        }

        if !matching.is_empty() {
            info!("Invalidated {} entries with tag: {}", matching.len(), tag);
        }
        Ok(matching.len())
    }

    /// Remove all TTL-expired entries, returning how many were dropped
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let mut shard = self.shard.write().await;

        let expired: Vec<(String, String)> = shard
            .entries
            .iter()
            .flat_map(|(cache_type, type_map)| {
                type_map
                    .values()
                    .filter(|e| e.is_expired())
                    .map(|e| (cache_type.clone(), e.key.clone()))
            })
            .collect();

        for (cache_type, key) in &expired {
            shard.remove_entry(cache_type, key);
        }

        if !expired.is_empty() {
            debug!("Cleaned up {} expired cache entries", expired.len());
        }
        Ok(expired.len())
    }

    /// Number of entries across all types
    pub async fn len(&self) -> usize {
        self.shard.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Check for a key without recording an access
    pub async fn contains_key(&self, cache_type: &str, key: &str) -> bool {
        self.shard.read().await.get(cache_type, key).is_some()
    }

    /// Internal: evict LRU entries until memory and entry count are
    /// within budget
    fn evict_over_budget(&self, shard: &mut CacheShard) {
        while shard.memory_usage > self.config.max_memory_bytes
            || shard.len() > self.config.max_entries
        {
            let Some(victim) = shard.recency.pop_first() else {
                break;
            };
            debug!("evicting LRU entry: {}/{}", victim.cache_type, victim.key);
            shard.remove_entry(&victim.cache_type, &victim.key);
        }
    }

    /// Internal: fetch or create the counter pair for a type
    async fn counters_for(&self, cache_type: &str) -> Arc<TypeCounters> {
        if let Some(c) = self.counters.read().await.get(cache_type) {
            return c.clone();
        }
        self.counters
            .write()
            .await
            .entry(cache_type.to_string())
            .or_default()
            .clone()
    }
}

fn validate_key(cache_type: &str, key: &str) -> Result<()> {
    if cache_type.is_empty() {
        return Err(StoreError::InvalidKey(
            "cache type must not be empty".to_string(),
        ));
    }
    if key.is_empty() {
        return Err(StoreError::InvalidKey(
            "cache key must not be empty".to_string(),
        ));
    }
    Ok(())
}
