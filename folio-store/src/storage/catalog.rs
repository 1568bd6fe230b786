//! Artifact catalog and storage lifecycle manager
//!
//! Tracks uploaded-artifact metadata and reclaims space without losing
//! recoverable data prematurely. Soft-deleted records sit in a recycle
//! bin until cleanup purges those past the retention window.

use crate::error::{Result, StoreError};
use crate::storage::artifact::{ArtifactRecord, ArtifactState};
use crate::storage::blob::BlobStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// The largest active file, reported in storage statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LargestFile {
    pub id: String,
    pub filename: String,
    pub size: u64,
}

/// Per-media-type statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageTypeStats {
    pub count: usize,
    pub total_size: u64,
}

/// Aggregate storage statistics over Active records only
///
/// Soft-deleted artifacts are excluded from current usage, matching the
/// recycle-bin intent; their space is still reported by cleanup when it
/// is actually reclaimed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_size: u64,
    pub file_count: usize,
    pub average_size: f64,
    pub largest_file: Option<LargestFile>,
    pub by_type: HashMap<String, StorageTypeStats>,
}

/// Result of a cleanup run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Bytes reclaimed from purged artifacts
    pub freed_space: u64,
    /// Number of records purged
    pub purged: usize,
    /// Number of artifacts skipped due to backing-store failures;
    /// they remain soft-deleted and are retried on the next run
    pub failed: usize,
}

/// Storage lifecycle manager
///
/// Owns the catalog of [`ArtifactRecord`]s and drives the
/// soft-delete / restore / purge lifecycle against a backing byte
/// store. Mutations on a single id are serialized by the catalog lock;
/// cleanup never holds that lock across backing-store calls.
pub struct ArtifactCatalog {
    records: Arc<RwLock<HashMap<String, ArtifactRecord>>>,
    blobs: Arc<dyn BlobStore>,
    retention: Option<Duration>,
    index_path: Option<PathBuf>,
}

impl ArtifactCatalog {
    /// Create a catalog with immediate purge eligibility (no retention
    /// window)
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            blobs,
            retention: None,
            index_path: None,
        }
    }

    /// Keep soft-deleted artifacts restorable for the given window
    /// before cleanup may purge them
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Persist the catalog to a JSON index file, loading any records
    /// already there. The index is rewritten after every mutation, so a
    /// restarted process picks up where it left off.
    pub async fn with_index(mut self, index_path: impl Into<PathBuf>) -> Result<Self> {
        let index_path = index_path.into();

        if tokio::fs::try_exists(&index_path).await? {
            let raw = tokio::fs::read_to_string(&index_path).await?;
            let loaded: Vec<ArtifactRecord> = serde_json::from_str(&raw)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            info!("loaded {} catalog records from {:?}", loaded.len(), index_path);

            let mut records = self.records.write().await;
            for record in loaded {
                records.insert(record.id.clone(), record);
            }
        }

        self.index_path = Some(index_path);
        Ok(self)
    }

    /// Internal: rewrite the index file from a snapshot taken under the
    /// read lock. No lock is held during the write itself.
    async fn persist(&self) -> Result<()> {
        let Some(index_path) = &self.index_path else {
            return Ok(());
        };

        let snapshot: Vec<ArtifactRecord> = {
            let records = self.records.read().await;
            records.values().cloned().collect()
        };

        let raw = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(index_path, raw).await?;
        Ok(())
    }

    /// Register an uploaded artifact. Fails with `DuplicateId` if the
    /// id is already in the catalog (in any state).
    pub async fn register(&self, record: ArtifactRecord) -> Result<ArtifactRecord> {
        {
            let mut records = self.records.write().await;

            if records.contains_key(&record.id) {
                return Err(StoreError::DuplicateId {
                    id: record.id.clone(),
                });
            }

            info!(
                "registered artifact {} ({}, {} bytes) for group {}",
                record.id, record.filename, record.size_bytes, record.owner_group_id
            );
            records.insert(record.id.clone(), record.clone());
        }

        self.persist().await?;
        Ok(record)
    }

    /// Move an Active artifact to the recycle bin.
    ///
    /// Deleting an already-deleted artifact is an error
    /// (`InvalidState`), symmetric with [`restore`](Self::restore) - a
    /// caller that double-deletes has a bug we want surfaced, not
    /// masked.
    pub async fn soft_delete(&self, id: &str) -> Result<()> {
        {
            let mut records = self.records.write().await;

            let record = records.get_mut(id).ok_or_else(|| StoreError::NotFound {
                id: id.to_string(),
            })?;

            match record.state {
                ArtifactState::Active => {
                    record.state = ArtifactState::SoftDeleted;
                    record.deleted_at = Some(Utc::now());
                    info!("soft-deleted artifact {}", id);
                }
                ArtifactState::SoftDeleted => {
                    return Err(StoreError::InvalidState {
                        id: id.to_string(),
                        expected: ArtifactState::Active.to_string(),
                        actual: record.state.to_string(),
                    })
                }
            }
        }

        self.persist().await
    }

    /// Bring a soft-deleted artifact back, clearing its deletion stamp
    pub async fn restore(&self, id: &str) -> Result<()> {
        {
            let mut records = self.records.write().await;

            let record = records.get_mut(id).ok_or_else(|| StoreError::NotFound {
                id: id.to_string(),
            })?;

            match record.state {
                ArtifactState::SoftDeleted => {
                    record.state = ArtifactState::Active;
                    record.deleted_at = None;
                    info!("restored artifact {}", id);
                }
                ArtifactState::Active => {
                    return Err(StoreError::InvalidState {
                        id: id.to_string(),
                        expected: ArtifactState::SoftDeleted.to_string(),
                        actual: record.state.to_string(),
                    })
                }
            }
        }

        self.persist().await
    }

    /// Fetch a record by id
    pub async fn get(&self, id: &str) -> Option<ArtifactRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// List Active records, optionally scoped to one owner group,
    /// newest uploads first
    pub async fn list(&self, owner_group_id: Option<&str>) -> Vec<ArtifactRecord> {
        let records = self.records.read().await;
        let mut result: Vec<ArtifactRecord> = records
            .values()
            .filter(|r| r.is_active())
            .filter(|r| owner_group_id.map_or(true, |g| r.owner_group_id == g))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        result
    }

    /// List the recycle bin, optionally scoped to one owner group
    pub async fn list_deleted(&self, owner_group_id: Option<&str>) -> Vec<ArtifactRecord> {
        let records = self.records.read().await;
        let mut result: Vec<ArtifactRecord> = records
            .values()
            .filter(|r| !r.is_active())
            .filter(|r| owner_group_id.map_or(true, |g| r.owner_group_id == g))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        result
    }

    /// Aggregate statistics over Active records, recomputed from the
    /// live catalog on every call
    pub async fn stats(&self) -> StorageStats {
        let records = self.records.read().await;

        let mut stats = StorageStats::default();
        let mut largest: Option<&ArtifactRecord> = None;

        for record in records.values().filter(|r| r.is_active()) {
            stats.total_size += record.size_bytes;
            stats.file_count += 1;

            let type_stats = stats
                .by_type
                .entry(record.media_type.tag().to_string())
                .or_default();
            type_stats.count += 1;
            type_stats.total_size += record.size_bytes;

            // Ties on size go to the earliest upload
            largest = match largest {
                None => Some(record),
                Some(current)
                    if record.size_bytes > current.size_bytes
                        || (record.size_bytes == current.size_bytes
                            && record.uploaded_at < current.uploaded_at) =>
                {
                    Some(record)
                }
                Some(current) => Some(current),
            };
        }

        if stats.file_count > 0 {
            stats.average_size = stats.total_size as f64 / stats.file_count as f64;
        }
        stats.largest_file = largest.map(|r| LargestFile {
            id: r.id.clone(),
            filename: r.filename.clone(),
            size: r.size_bytes,
        });

        stats
    }

    /// Purge soft-deleted artifacts past the retention window,
    /// reclaiming their bytes from the backing store.
    ///
    /// The eligible set is snapshotted under the lock, then each
    /// artifact's bytes are deleted with no lock held; the catalog
    /// record is removed afterwards only if the artifact is still
    /// soft-deleted (a concurrent restore wins). A backing-store
    /// failure skips that artifact - it stays soft-deleted for the
    /// next run - and never aborts the batch. Re-running with nothing
    /// eligible is a no-op reporting `freed_space = 0`.
    pub async fn cleanup(&self) -> Result<CleanupReport> {
        let now = Utc::now();
        let cutoff = self
            .retention
            .map(|r| chrono::Duration::from_std(r).unwrap_or(chrono::Duration::zero()));

        let eligible: Vec<(String, u64)> = {
            let records = self.records.read().await;
            records
                .values()
                .filter(|r| r.state == ArtifactState::SoftDeleted)
                .filter(|r| match (cutoff, r.deleted_at) {
                    (None, _) => true,
                    (Some(c), Some(deleted_at)) => now - deleted_at >= c,
                    (Some(_), None) => false,
                })
                .map(|r| (r.id.clone(), r.size_bytes))
                .collect()
        };

        if eligible.is_empty() {
            debug!("cleanup: nothing eligible");
            return Ok(CleanupReport::default());
        }

        info!("cleanup: {} artifacts eligible for purge", eligible.len());
        let mut report = CleanupReport::default();

        for (id, size_bytes) in eligible {
            if let Err(e) = self.blobs.delete(&id).await {
                warn!("cleanup: backing store delete failed for {}: {}", id, e);
                report.failed += 1;
                continue;
            }

            let mut records = self.records.write().await;
            match records.get(&id) {
                Some(r) if r.state == ArtifactState::SoftDeleted => {
                    records.remove(&id);
                    report.freed_space += size_bytes;
                    report.purged += 1;
                }
                _ => {
                    debug!("cleanup: {} restored during sweep, keeping record", id);
                }
            }
        }

        if report.purged > 0 {
            self.persist().await?;
        }

        info!(
            "cleanup: purged {} artifacts, freed {} bytes ({} failed)",
            report.purged, report.freed_space, report.failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob::MemoryBlobStore;

    fn catalog() -> ArtifactCatalog {
        ArtifactCatalog::new(Arc::new(MemoryBlobStore::new()))
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let catalog = catalog();
        let record = ArtifactRecord::new("group-1", "paper.pdf", 100).with_id("doc-1");

        catalog.register(record).await.unwrap();

        let fetched = catalog.get("doc-1").await.unwrap();
        assert_eq!(fetched.filename, "paper.pdf");
        assert!(fetched.is_active());
    }

    #[tokio::test]
    async fn test_register_duplicate_id() {
        let catalog = catalog();
        let record = ArtifactRecord::new("group-1", "paper.pdf", 100).with_id("doc-1");

        catalog.register(record.clone()).await.unwrap();
        let err = catalog.register(record).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_then_restore_roundtrip() {
        let catalog = catalog();
        catalog
            .register(ArtifactRecord::new("group-1", "paper.pdf", 100).with_id("doc-1"))
            .await
            .unwrap();

        catalog.soft_delete("doc-1").await.unwrap();
        let deleted = catalog.get("doc-1").await.unwrap();
        assert_eq!(deleted.state, ArtifactState::SoftDeleted);
        assert!(deleted.deleted_at.is_some());

        catalog.restore("doc-1").await.unwrap();
        let restored = catalog.get("doc-1").await.unwrap();
        assert!(restored.is_active());
        assert!(restored.deleted_at.is_none());
        assert_eq!(restored.size_bytes, 100);
        assert_eq!(restored.filename, "paper.pdf");
    }

    #[tokio::test]
    async fn test_double_soft_delete_is_invalid_state() {
        let catalog = catalog();
        catalog
            .register(ArtifactRecord::new("group-1", "a.txt", 10).with_id("doc-1"))
            .await
            .unwrap();

        catalog.soft_delete("doc-1").await.unwrap();
        let err = catalog.soft_delete("doc-1").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_restore_active_is_invalid_state() {
        let catalog = catalog();
        catalog
            .register(ArtifactRecord::new("group-1", "a.txt", 10).with_id("doc-1"))
            .await
            .unwrap();

        let err = catalog.restore("doc-1").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let catalog = catalog();

        assert!(matches!(
            catalog.soft_delete("ghost").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
        assert!(matches!(
            catalog.restore("ghost").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_stats_exclude_soft_deleted() {
        let catalog = catalog();
        catalog
            .register(ArtifactRecord::new("g", "a.pdf", 100).with_id("a"))
            .await
            .unwrap();
        catalog
            .register(ArtifactRecord::new("g", "b.pdf", 200).with_id("b"))
            .await
            .unwrap();

        let stats = catalog.stats().await;
        assert_eq!(stats.total_size, 300);
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.average_size, 150.0);
        assert_eq!(stats.largest_file.as_ref().unwrap().id, "b");
        assert_eq!(stats.by_type["pdf"].count, 2);
        assert_eq!(stats.by_type["pdf"].total_size, 300);

        catalog.soft_delete("b").await.unwrap();

        let stats = catalog.stats().await;
        assert_eq!(stats.total_size, 100);
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.largest_file.as_ref().unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_stats_empty_catalog() {
        let catalog = catalog();
        let stats = catalog.stats().await;

        assert_eq!(stats.file_count, 0);
        assert_eq!(stats.average_size, 0.0);
        assert!(stats.largest_file.is_none());
        assert!(stats.by_type.is_empty());
    }

    #[tokio::test]
    async fn test_largest_file_tie_goes_to_earliest() {
        let catalog = catalog();

        let first = ArtifactRecord::new("g", "first.pdf", 100).with_id("first");
        catalog.register(first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = ArtifactRecord::new("g", "second.pdf", 100).with_id("second");
        catalog.register(second).await.unwrap();

        let stats = catalog.stats().await;
        assert_eq!(stats.largest_file.unwrap().id, "first");
    }

    #[tokio::test]
    async fn test_cleanup_purges_and_frees_space() {
        let blobs = Arc::new(MemoryBlobStore::new());
        blobs.put("b", &[0u8; 200]).await.unwrap();
        let catalog = ArtifactCatalog::new(blobs.clone());

        catalog
            .register(ArtifactRecord::new("g", "a.pdf", 100).with_id("a"))
            .await
            .unwrap();
        catalog
            .register(ArtifactRecord::new("g", "b.pdf", 200).with_id("b"))
            .await
            .unwrap();
        catalog.soft_delete("b").await.unwrap();

        let report = catalog.cleanup().await.unwrap();
        assert_eq!(report.freed_space, 200);
        assert_eq!(report.purged, 1);
        assert_eq!(report.failed, 0);

        // Purged id is gone for good
        assert!(catalog.get("b").await.is_none());
        assert!(matches!(
            catalog.restore("b").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
        assert!(blobs.size("b").await.is_err());

        // Active record untouched
        assert!(catalog.get("a").await.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_cleanup_with_nothing_eligible() {
        let catalog = catalog();
        catalog
            .register(ArtifactRecord::new("g", "a.pdf", 100).with_id("a"))
            .await
            .unwrap();

        let report = catalog.cleanup().await.unwrap();
        assert_eq!(report.freed_space, 0);
        assert_eq!(report.purged, 0);

        // Safe to re-run
        let report = catalog.cleanup().await.unwrap();
        assert_eq!(report.freed_space, 0);
        assert!(catalog.get("a").await.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_respects_retention_window() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let catalog =
            ArtifactCatalog::new(blobs).with_retention(Duration::from_secs(3600));

        catalog
            .register(ArtifactRecord::new("g", "a.pdf", 100).with_id("a"))
            .await
            .unwrap();
        catalog.soft_delete("a").await.unwrap();

        // Deleted moments ago: still inside the retention window
        let report = catalog.cleanup().await.unwrap();
        assert_eq!(report.purged, 0);
        assert!(catalog.get("a").await.is_some());
    }

    #[tokio::test]
    async fn test_index_survives_restart() {
        let tmp = tempfile::TempDir::new().unwrap();
        let index = tmp.path().join("catalog.json");
        let blobs = Arc::new(MemoryBlobStore::new());

        let catalog = ArtifactCatalog::new(blobs.clone())
            .with_index(&index)
            .await
            .unwrap();
        catalog
            .register(ArtifactRecord::new("g", "a.pdf", 100).with_id("a"))
            .await
            .unwrap();
        catalog.soft_delete("a").await.unwrap();

        let reloaded = ArtifactCatalog::new(blobs).with_index(&index).await.unwrap();
        let record = reloaded.get("a").await.unwrap();
        assert_eq!(record.state, ArtifactState::SoftDeleted);
        assert_eq!(record.size_bytes, 100);
    }

    #[tokio::test]
    async fn test_list_scoped_to_group() {
        let catalog = catalog();
        catalog
            .register(ArtifactRecord::new("g1", "a.pdf", 1).with_id("a"))
            .await
            .unwrap();
        catalog
            .register(ArtifactRecord::new("g2", "b.pdf", 1).with_id("b"))
            .await
            .unwrap();
        catalog.soft_delete("b").await.unwrap();

        assert_eq!(catalog.list(Some("g1")).await.len(), 1);
        assert_eq!(catalog.list(Some("g2")).await.len(), 0);
        assert_eq!(catalog.list(None).await.len(), 1);
        assert_eq!(catalog.list_deleted(Some("g2")).await.len(), 1);
    }
}
