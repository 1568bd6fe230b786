//! Error types for resource management operations
//!
//! This module defines the error taxonomy shared by the cache engine and
//! the storage lifecycle manager. Handlers upstream map these kinds onto
//! HTTP statuses without losing which kind occurred.

use thiserror::Error;

/// Main error type for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Empty cache type or cache key
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// Unknown artifact id
    #[error("Artifact not found: {id}")]
    NotFound { id: String },

    /// Lifecycle transition attempted from the wrong state
    #[error("Artifact {id} is {actual}, expected {expected}")]
    InvalidState {
        id: String,
        expected: String,
        actual: String,
    },

    /// Artifact id already registered
    #[error("Artifact id already registered: {id}")]
    DuplicateId { id: String },

    /// Backing byte-store failure (propagated, never fatal to a batch)
    #[error("Backing store error: {0}")]
    BackingStore(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Stable machine-readable tag for the error kind, used by the
    /// admin API to preserve the kind across the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::InvalidKey(_) => "invalid_key",
            StoreError::NotFound { .. } => "not_found",
            StoreError::InvalidState { .. } => "invalid_state",
            StoreError::DuplicateId { .. } => "duplicate_id",
            StoreError::BackingStore(_) => "backing_store",
            StoreError::Config(_) => "config",
            StoreError::Serialization(_) => "serialization",
        }
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::BackingStore(e.to_string())
    }
}
