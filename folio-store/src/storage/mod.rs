//! # Storage Lifecycle Management
//!
//! This module tracks every uploaded artifact from registration through
//! soft delete, restore, and space-reclaiming cleanup.
//!
//! ## Features
//!
//! - **Artifact catalog**: durable metadata records; bytes live in a
//!   backing store behind the [`BlobStore`] trait
//! - **Recycle bin**: soft delete / restore with full metadata
//!   round-trip; purge only through cleanup
//! - **Retention window**: soft-deleted artifacts become purge-eligible
//!   only after a configurable grace period
//! - **Partial-failure cleanup**: one artifact's backing-store failure
//!   never aborts the batch; it stays restorable for the next run
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use folio_store::storage::{ArtifactCatalog, ArtifactRecord, MemoryBlobStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let catalog = ArtifactCatalog::new(Arc::new(MemoryBlobStore::new()));
//!
//! let record = ArtifactRecord::new("group-1", "paper.pdf", 1024);
//! let record = catalog.register(record).await?;
//!
//! catalog.soft_delete(&record.id).await?;
//! let report = catalog.cleanup().await?;
//! println!("freed {} bytes", report.freed_space);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod blob;
pub mod catalog;

pub use artifact::{ArtifactRecord, ArtifactState, MediaType};
pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use catalog::{ArtifactCatalog, CleanupReport, LargestFile, StorageStats, StorageTypeStats};
