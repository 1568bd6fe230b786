//! Backing byte store for artifact content
//!
//! The catalog treats the byte store as an external collaborator behind
//! a narrow trait: store, read, delete, and measure by artifact id.
//! Cleanup calls into it without holding any catalog lock.

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Backing store for artifact bytes, addressed by artifact id
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the bytes for an artifact
    async fn put(&self, artifact_id: &str, bytes: &[u8]) -> Result<()>;

    /// Read the bytes for an artifact
    async fn read(&self, artifact_id: &str) -> Result<Vec<u8>>;

    /// Delete the bytes for an artifact. Deleting an id with no bytes
    /// is a success (the space is already reclaimed).
    async fn delete(&self, artifact_id: &str) -> Result<()>;

    /// Size in bytes of a stored artifact
    async fn size(&self, artifact_id: &str) -> Result<u64>;
}

/// Filesystem-backed blob store under a single storage root
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at the given directory (created if absent)
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, artifact_id: &str) -> PathBuf {
        self.root.join(artifact_id)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, artifact_id: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(artifact_id);
        tokio::fs::write(&path, bytes).await?;
        debug!("stored {} bytes at {:?}", bytes.len(), path);
        Ok(())
    }

    async fn read(&self, artifact_id: &str) -> Result<Vec<u8>> {
        let path = self.path_for(artifact_id);
        Ok(tokio::fs::read(&path).await?)
    }

    async fn delete(&self, artifact_id: &str) -> Result<()> {
        let path = self.path_for(artifact_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("deleted blob {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("blob already absent, nothing to delete: {:?}", path);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, artifact_id: &str) -> Result<u64> {
        let path = self.path_for(artifact_id);
        let metadata = tokio::fs::metadata(&path).await?;
        Ok(metadata.len())
    }
}

/// In-memory blob store for tests and embedded use
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, artifact_id: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .await
            .insert(artifact_id.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, artifact_id: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .await
            .get(artifact_id)
            .cloned()
            .ok_or_else(|| StoreError::BackingStore(format!("no blob for {}", artifact_id)))
    }

    async fn delete(&self, artifact_id: &str) -> Result<()> {
        self.blobs.write().await.remove(artifact_id);
        Ok(())
    }

    async fn size(&self, artifact_id: &str) -> Result<u64> {
        self.blobs
            .read()
            .await
            .get(artifact_id)
            .map(|b| b.len() as u64)
            .ok_or_else(|| StoreError::BackingStore(format!("no blob for {}", artifact_id)))
    }
}
