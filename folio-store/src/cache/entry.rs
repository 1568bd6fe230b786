//! Cache entry management

use crate::cache::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cache entry with access tracking and optional expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache type tag this entry belongs to
    pub cache_type: String,

    /// The cache key, unique within the type
    pub key: CacheKey,

    /// The cached value (serialized payload)
    pub value: CacheValue,

    /// Caller-supplied memory footprint estimate in bytes
    pub size_bytes: u64,

    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// Last access time (drives LRU eviction)
    pub last_accessed_at: DateTime<Utc>,

    /// Optional expiry; entries without one never expire
    pub expires_at: Option<DateTime<Utc>>,

    /// Number of times this entry has been read
    pub access_count: u64,

    /// Tags for selective invalidation (e.g. `artifact:<id>`)
    pub tags: Vec<String>,
}

impl CacheEntry {
    /// Create a new entry; `ttl` of `None` means the entry never expires
    pub fn new(
        cache_type: impl Into<String>,
        key: CacheKey,
        value: CacheValue,
        size_bytes: u64,
        ttl: Option<Duration>,
    ) -> Self {
        let now = Utc::now();
        let expires_at = ttl.map(|t| {
            now + chrono::Duration::from_std(t).unwrap_or(chrono::Duration::seconds(3600))
        });

        Self {
            cache_type: cache_type.into(),
            key,
            value,
            size_bytes,
            created_at: now,
            last_accessed_at: now,
            expires_at,
            access_count: 0,
            tags: Vec::new(),
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.last_accessed_at = Utc::now();
        self.access_count += 1;
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Add a tag to the entry
    pub fn add_tag(&mut self, tag: String) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Check if the entry carries a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(
            "embedding",
            "docA".to_string(),
            "[0.1, 0.2]".to_string(),
            50,
            None,
        );

        assert_eq!(entry.cache_type, "embedding");
        assert_eq!(entry.key, "docA");
        assert_eq!(entry.size_bytes, 50);
        assert_eq!(entry.access_count, 0);
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = CacheEntry::new("retrieval", "q1".to_string(), "r".to_string(), 1, None);
        sleep(Duration::from_millis(10));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(
            "retrieval",
            "q1".to_string(),
            "r".to_string(),
            1,
            Some(Duration::from_millis(20)),
        );

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(50));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_mark_accessed() {
        let mut entry =
            CacheEntry::new("preview", "docA:1".to_string(), "<p/>".to_string(), 4, None);

        let initial_time = entry.last_accessed_at;
        sleep(Duration::from_millis(10));
        entry.mark_accessed();

        assert_eq!(entry.access_count, 1);
        assert!(entry.last_accessed_at > initial_time);
    }

    #[test]
    fn test_tags() {
        let mut entry =
            CacheEntry::new("embedding", "docA".to_string(), "[]".to_string(), 2, None);

        entry.add_tag("artifact:doc-1".to_string());
        entry.add_tag("artifact:doc-1".to_string());

        assert_eq!(entry.tags.len(), 1);
        assert!(entry.has_tag("artifact:doc-1"));
        assert!(!entry.has_tag("artifact:doc-2"));
    }
}
