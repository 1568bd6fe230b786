//! Integration points for the retrieval pipeline
//!
//! This module provides the typed layer between the cache engine and
//! the pipeline that computes things worth caching:
//! - Embedding vectors per artifact
//! - Retrieval (similarity search) results per query
//! - Rendered document previews

use crate::cache::{
    config::CacheConfig,
    engine::ResultCache,
    types::{CacheKey, CacheStats, CacheValue},
};
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Well-known cache type tags
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheKind {
    /// Embedding vector for an artifact
    Embedding,

    /// Similarity-search result set for a query
    Retrieval,

    /// Rendered document preview
    Preview,

    /// Open tag for categories this module does not know about
    Custom(String),
}

impl CacheKind {
    /// The open string tag the engine partitions by
    pub fn tag(&self) -> &str {
        match self {
            CacheKind::Embedding => "embedding",
            CacheKind::Retrieval => "retrieval",
            CacheKind::Preview => "preview",
            CacheKind::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Cache key builder for keys within a type
pub struct CacheKeyBuilder {
    identifier: String,
    params: Vec<(String, String)>,
}

impl CacheKeyBuilder {
    /// Create a builder with the primary identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter to the key
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        let mut key = self.identifier;

        if !self.params.is_empty() {
            let params_str: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            key.push_str(&format!("?{}", params_str.join("&")));
        }

        key
    }
}

/// Cached embedding vector for an artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEmbedding {
    /// Source artifact id
    pub artifact_id: String,

    /// Embedding model identifier
    pub model: String,

    /// The vector itself
    pub vector: Vec<f32>,
}

impl CachedEmbedding {
    /// Memory footprint estimate: four bytes per dimension plus key text
    pub fn size_estimate(&self) -> u64 {
        (self.vector.len() * 4 + self.artifact_id.len() + self.model.len()) as u64
    }

    /// Serialize to cache value
    pub fn to_cache_value(&self) -> Result<CacheValue> {
        serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Deserialize from cache value
    pub fn from_cache_value(value: &str) -> Result<Self> {
        serde_json::from_str(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Cached similarity-search result set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRetrieval {
    /// The original query text
    pub query: String,

    /// Serialized result data
    pub results_json: String,

    /// Number of results
    pub result_count: usize,

    /// Original search execution time (for metrics)
    pub execution_time_ms: u64,
}

impl CachedRetrieval {
    /// Create a new cached retrieval result
    pub fn new(
        query: String,
        results_json: String,
        result_count: usize,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            query,
            results_json,
            result_count,
            execution_time_ms,
        }
    }

    pub fn size_estimate(&self) -> u64 {
        (self.query.len() + self.results_json.len()) as u64
    }

    /// Serialize to cache value
    pub fn to_cache_value(&self) -> Result<CacheValue> {
        serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Deserialize from cache value
    pub fn from_cache_value(value: &str) -> Result<Self> {
        serde_json::from_str(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Cached rendered preview of an artifact page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPreview {
    /// Source artifact id
    pub artifact_id: String,

    /// Page number within the document
    pub page: u32,

    /// Rendered HTML fragment
    pub html: String,
}

impl CachedPreview {
    pub fn size_estimate(&self) -> u64 {
        (self.html.len() + self.artifact_id.len()) as u64
    }

    /// Serialize to cache value
    pub fn to_cache_value(&self) -> Result<CacheValue> {
        serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Deserialize from cache value
    pub fn from_cache_value(value: &str) -> Result<Self> {
        serde_json::from_str(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// High-level cache wrapper for the retrieval pipeline
///
/// Entries derived from an artifact are tagged `artifact:<id>` so an
/// operator can invalidate everything computed from one document.
/// Purging an artifact from storage does NOT invalidate here; stale
/// entries age out under normal LRU pressure unless explicitly removed.
pub struct PipelineCache {
    cache: Arc<ResultCache>,
}

impl PipelineCache {
    /// Create a new pipeline cache
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: Arc::new(ResultCache::new(config)),
        }
    }

    /// Create from an existing cache instance
    pub fn from_cache(cache: Arc<ResultCache>) -> Self {
        Self { cache }
    }

    /// Get the underlying cache instance
    pub fn inner(&self) -> Arc<ResultCache> {
        self.cache.clone()
    }

    /// Cache an embedding vector
    pub async fn cache_embedding(&self, embedding: CachedEmbedding) -> Result<()> {
        let key = CacheKeyBuilder::new(&embedding.artifact_id)
            .param("model", &embedding.model)
            .build();
        let size = embedding.size_estimate();
        let tag = format!("artifact:{}", embedding.artifact_id);
        let value = embedding.to_cache_value()?;

        self.cache
            .put_with_tags(CacheKind::Embedding.tag(), &key, value, size, vec![tag])
            .await
    }

    /// Get a cached embedding vector
    pub async fn get_embedding(
        &self,
        artifact_id: &str,
        model: &str,
    ) -> Result<Option<CachedEmbedding>> {
        let key = CacheKeyBuilder::new(artifact_id).param("model", model).build();

        match self.cache.get(CacheKind::Embedding.tag(), &key).await? {
            Some(value) => Ok(Some(CachedEmbedding::from_cache_value(&value)?)),
            None => Ok(None),
        }
    }

    /// Cache a similarity-search result set
    pub async fn cache_retrieval(&self, retrieval: CachedRetrieval) -> Result<()> {
        let key = CacheKeyBuilder::new(Self::hash_query(&retrieval.query)).build();
        let size = retrieval.size_estimate();
        let value = retrieval.to_cache_value()?;

        self.cache
            .put(CacheKind::Retrieval.tag(), &key, value, size)
            .await
    }

    /// Get a cached similarity-search result set
    pub async fn get_retrieval(&self, query: &str) -> Result<Option<CachedRetrieval>> {
        let key = CacheKeyBuilder::new(Self::hash_query(query)).build();

        match self.cache.get(CacheKind::Retrieval.tag(), &key).await? {
            Some(value) => Ok(Some(CachedRetrieval::from_cache_value(&value)?)),
            None => Ok(None),
        }
    }

    /// Cache a rendered preview page
    pub async fn cache_preview(&self, preview: CachedPreview) -> Result<()> {
        let key = CacheKeyBuilder::new(&preview.artifact_id)
            .param("page", preview.page.to_string())
            .build();
        let size = preview.size_estimate();
        let tag = format!("artifact:{}", preview.artifact_id);
        let value = preview.to_cache_value()?;

        self.cache
            .put_with_tags(CacheKind::Preview.tag(), &key, value, size, vec![tag])
            .await
    }

    /// Get a cached preview page
    pub async fn get_preview(
        &self,
        artifact_id: &str,
        page: u32,
    ) -> Result<Option<CachedPreview>> {
        let key = CacheKeyBuilder::new(artifact_id)
            .param("page", page.to_string())
            .build();

        match self.cache.get(CacheKind::Preview.tag(), &key).await? {
            Some(value) => Ok(Some(CachedPreview::from_cache_value(&value)?)),
            None => Ok(None),
        }
    }

    /// Drop every cached value derived from an artifact
    pub async fn invalidate_artifact(&self, artifact_id: &str) -> Result<usize> {
        let tag = format!("artifact:{}", artifact_id);
        self.cache.invalidate_by_tag(&tag).await
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Clear the entire cache
    pub async fn clear(&self) -> Result<()> {
        self.cache.clear(None).await
    }

    /// Internal: hash a query string into a bounded key
    fn hash_query(query: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        query.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_kind_tags() {
        assert_eq!(CacheKind::Embedding.tag(), "embedding");
        assert_eq!(CacheKind::Retrieval.tag(), "retrieval");
        assert_eq!(CacheKind::Preview.tag(), "preview");
        assert_eq!(CacheKind::Custom("ocr".to_string()).tag(), "ocr");
    }

    #[test]
    fn test_cache_key_builder() {
        let key = CacheKeyBuilder::new("doc-1").build();
        assert_eq!(key, "doc-1");

        let key = CacheKeyBuilder::new("doc-1")
            .param("model", "mini-lm")
            .param("page", "3")
            .build();
        assert!(key.starts_with("doc-1?"));
        assert!(key.contains("model=mini-lm"));
        assert!(key.contains("page=3"));
    }

    #[test]
    fn test_cached_retrieval_serialization() {
        let retrieval = CachedRetrieval::new(
            "neural cache design".to_string(),
            r#"[{"id": "doc-1"}]"#.to_string(),
            1,
            120,
        );

        let value = retrieval.to_cache_value().unwrap();
        let deserialized = CachedRetrieval::from_cache_value(&value).unwrap();

        assert_eq!(retrieval.query, deserialized.query);
        assert_eq!(retrieval.result_count, deserialized.result_count);
    }

    #[tokio::test]
    async fn test_embedding_roundtrip() {
        let pipeline = PipelineCache::new(CacheConfig::default());

        let embedding = CachedEmbedding {
            artifact_id: "doc-1".to_string(),
            model: "mini-lm".to_string(),
            vector: vec![0.1, 0.2, 0.3],
        };

        pipeline.cache_embedding(embedding).await.unwrap();

        let cached = pipeline.get_embedding("doc-1", "mini-lm").await.unwrap();
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().vector.len(), 3);

        // Different model misses
        let other = pipeline.get_embedding("doc-1", "other-model").await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_retrieval_roundtrip() {
        let pipeline = PipelineCache::new(CacheConfig::default());

        let retrieval = CachedRetrieval::new(
            "soft deletes".to_string(),
            r#"[{"id": "doc-9"}]"#.to_string(),
            1,
            50,
        );
        pipeline.cache_retrieval(retrieval).await.unwrap();

        let cached = pipeline.get_retrieval("soft deletes").await.unwrap();
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().result_count, 1);
    }

    #[tokio::test]
    async fn test_invalidate_artifact() {
        let pipeline = PipelineCache::new(CacheConfig::default());

        pipeline
            .cache_embedding(CachedEmbedding {
                artifact_id: "doc-1".to_string(),
                model: "mini-lm".to_string(),
                vector: vec![0.5],
            })
            .await
            .unwrap();
        pipeline
            .cache_preview(CachedPreview {
                artifact_id: "doc-1".to_string(),
                page: 1,
                html: "<p>hi</p>".to_string(),
            })
            .await
            .unwrap();

        let removed = pipeline.invalidate_artifact("doc-1").await.unwrap();
        assert_eq!(removed, 2);

        assert!(pipeline
            .get_embedding("doc-1", "mini-lm")
            .await
            .unwrap()
            .is_none());
    }
}
