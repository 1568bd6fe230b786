//! Resource administration facade
//!
//! Gives operators one consistent read over both engines plus the two
//! mutating operations, without coupling the engines to each other.

use crate::cache::{CacheStats, ResultCache};
use crate::error::Result;
use crate::storage::{ArtifactCatalog, CleanupReport, StorageStats};
use std::sync::Arc;

/// Aggregation/dispatch facade over the catalog and the cache.
/// Holds no state of its own.
pub struct ResourceAdmin {
    catalog: Arc<ArtifactCatalog>,
    cache: Arc<ResultCache>,
}

impl ResourceAdmin {
    pub fn new(catalog: Arc<ArtifactCatalog>, cache: Arc<ResultCache>) -> Self {
        Self { catalog, cache }
    }

    /// Current storage statistics (Active artifacts only)
    pub async fn storage_stats(&self) -> StorageStats {
        self.catalog.stats().await
    }

    /// Current cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Purge eligible soft-deleted artifacts, reclaiming space
    pub async fn cleanup_storage(&self) -> Result<CleanupReport> {
        self.catalog.cleanup().await
    }

    /// Clear one cache type, or everything when no type is given
    pub async fn clear_cache(&self, cache_type: Option<&str>) -> Result<()> {
        self.cache.clear(cache_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::storage::{ArtifactRecord, MemoryBlobStore};

    fn admin() -> ResourceAdmin {
        let catalog = Arc::new(ArtifactCatalog::new(Arc::new(MemoryBlobStore::new())));
        let cache = Arc::new(ResultCache::new(CacheConfig::default()));
        ResourceAdmin::new(catalog, cache)
    }

    #[tokio::test]
    async fn test_facade_reads_both_engines() {
        let admin = admin();

        let storage = admin.storage_stats().await;
        assert_eq!(storage.file_count, 0);

        let cache = admin.cache_stats().await;
        assert_eq!(cache.item_count, 0);
        assert_eq!(cache.hit_rate, 0.0);
    }

    #[tokio::test]
    async fn test_facade_dispatches_mutations() {
        let catalog = Arc::new(ArtifactCatalog::new(Arc::new(MemoryBlobStore::new())));
        let cache = Arc::new(ResultCache::new(CacheConfig::default()));
        let admin = ResourceAdmin::new(catalog.clone(), cache.clone());

        catalog
            .register(ArtifactRecord::new("g", "a.pdf", 64).with_id("a"))
            .await
            .unwrap();
        catalog.soft_delete("a").await.unwrap();
        cache.put("embedding", "k", "v".to_string(), 8).await.unwrap();

        let report = admin.cleanup_storage().await.unwrap();
        assert_eq!(report.freed_space, 64);

        admin.clear_cache(None).await.unwrap();
        assert_eq!(admin.cache_stats().await.item_count, 0);
    }
}
