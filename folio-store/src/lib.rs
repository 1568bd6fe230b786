//! # Folio Store (folio-store)
//!
//! Resource management core for the Folio shared literature repository:
//! a typed result cache with hit/miss/memory accounting, and a storage
//! lifecycle manager with soft-delete, restore, and space-reclaiming
//! cleanup. Both engines support concurrent callers and back the
//! admin-facing statistics and cleanup operations.
//!
//! ## Cache
//!
//! ```no_run
//! use folio_store::cache::{CacheConfig, ResultCache};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ResultCache::new(CacheConfig::default());
//!
//!     cache.put("embedding", "doc-1", "[0.1, 0.2]".to_string(), 50).await?;
//!     let hit = cache.get("embedding", "doc-1").await?;
//!     println!("cached: {:?}", hit);
//!
//!     let stats = cache.stats().await;
//!     println!("hit rate: {:.2}, memory: {} bytes", stats.hit_rate, stats.memory_usage);
//!     Ok(())
//! }
//! ```
//!
//! ## Storage lifecycle
//!
//! ```no_run
//! use std::sync::Arc;
//! use folio_store::storage::{ArtifactCatalog, ArtifactRecord, FsBlobStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let blobs = Arc::new(FsBlobStore::new("./data/blobs").await?);
//!     let catalog = ArtifactCatalog::new(blobs);
//!
//!     let record = catalog
//!         .register(ArtifactRecord::new("group-1", "paper.pdf", 1024))
//!         .await?;
//!
//!     catalog.soft_delete(&record.id).await?;
//!     catalog.restore(&record.id).await?;
//!
//!     let stats = catalog.stats().await;
//!     println!("{} files, {} bytes", stats.file_count, stats.total_size);
//!     Ok(())
//! }
//! ```
//!
//! ## Admin facade
//!
//! [`admin::ResourceAdmin`] aggregates both engines for operators:
//! storage stats, cache stats, storage cleanup, and cache clear.

pub mod admin;
pub mod cache;
pub mod error;
pub mod storage;

// Re-export main types for convenience
pub use admin::ResourceAdmin;
pub use cache::{
    CacheConfig, CacheConfigBuilder, CachedEmbedding, CachedPreview, CachedRetrieval, CacheEntry,
    CacheKey, CacheKeyBuilder, CacheKind, CacheStats, CacheTypeStats, CacheValue, PipelineCache,
    ResultCache,
};
pub use error::{Result, StoreError};
pub use storage::{
    ArtifactCatalog, ArtifactRecord, ArtifactState, BlobStore, CleanupReport, FsBlobStore,
    LargestFile, MediaType, MemoryBlobStore, StorageStats, StorageTypeStats,
};
