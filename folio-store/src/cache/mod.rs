//! # Typed Result Cache
//!
//! This module implements the caching layer that spares the retrieval
//! pipeline from recomputing expensive results (embeddings, similarity
//! searches, rendered previews).
//!
//! ## Features
//!
//! - **Typed partitions**: entries carry an open cache-type tag with
//!   independent hit/miss statistics per type
//! - **Single memory budget**: one ceiling shared across all types,
//!   enforced by eviction rather than admission control
//! - **LRU Eviction**: globally least-recently-used entries go first,
//!   ties broken by earliest creation
//! - **Optional TTL**: expiry is off by default and can be enabled with
//!   jitter to avoid synchronized expiration
//!
//! ## Example
//!
//! ```rust
//! use folio_store::cache::{CacheConfig, ResultCache};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CacheConfig::builder()
//!     .max_memory_bytes(64 * 1024 * 1024) // 64 MB
//!     .build();
//!
//! let cache = ResultCache::new(config);
//!
//! cache.put("embedding", "doc-1", "[0.1, 0.2]".to_string(), 50).await?;
//!
//! if let Some(value) = cache.get("embedding", "doc-1").await? {
//!     println!("Cache hit: {}", value);
//! }
//!
//! let stats = cache.stats().await;
//! println!("hit rate: {:.2}", stats.hit_rate);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod entry;
pub mod integration;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use engine::ResultCache;
pub use entry::CacheEntry;
pub use integration::{
    CachedEmbedding, CachedPreview, CachedRetrieval, CacheKeyBuilder, CacheKind, PipelineCache,
};
pub use types::{CacheKey, CacheStats, CacheTypeStats, CacheValue};
