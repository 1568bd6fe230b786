//! Artifact catalog records
//!
//! An artifact is the durable metadata record for one uploaded file.
//! The bytes themselves live in a backing store; the record tracks the
//! lifecycle from upload through soft delete, restore, and purge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media classification derived from the uploaded filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Pdf,
    Doc,
    Text,
    Image,
    Other,
}

impl MediaType {
    /// Classify a filename by its extension
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => MediaType::Pdf,
            "doc" | "docx" | "rtf" => MediaType::Doc,
            "txt" | "md" => MediaType::Text,
            "png" | "jpg" | "jpeg" | "gif" | "webp" => MediaType::Image,
            _ => MediaType::Other,
        }
    }

    /// The string tag used in `by_type` statistics maps
    pub fn tag(&self) -> &'static str {
        match self {
            MediaType::Pdf => "pdf",
            MediaType::Doc => "doc",
            MediaType::Text => "text",
            MediaType::Image => "image",
            MediaType::Other => "other",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Lifecycle state of an artifact
///
/// Transitions: `Active --soft_delete--> SoftDeleted --restore--> Active`;
/// an eligible SoftDeleted record is purged by cleanup, which removes the
/// record entirely (there is no Purged variant to come back from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    /// Visible and counted in storage statistics
    Active,
    /// In the recycle bin; excluded from stats, restorable until purged
    SoftDeleted,
}

impl std::fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactState::Active => write!(f, "active"),
            ArtifactState::SoftDeleted => write!(f, "soft_deleted"),
        }
    }
}

/// Durable record of one uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Unique, immutable id
    pub id: String,

    /// Research group that owns the file
    pub owner_group_id: String,

    /// Display filename (already sanitized by the upload path)
    pub filename: String,

    /// Classification tag for per-type statistics
    pub media_type: MediaType,

    /// File size in bytes, fixed once set
    pub size_bytes: u64,

    /// Upload completion timestamp
    pub uploaded_at: DateTime<Utc>,

    /// Lifecycle state
    pub state: ArtifactState,

    /// Set iff `state` is SoftDeleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ArtifactRecord {
    /// Create an Active record with a fresh v4 id, classifying the
    /// media type from the filename
    pub fn new(
        owner_group_id: impl Into<String>,
        filename: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        let filename = filename.into();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_group_id: owner_group_id.into(),
            media_type: MediaType::from_filename(&filename),
            filename,
            size_bytes,
            uploaded_at: Utc::now(),
            state: ArtifactState::Active,
            deleted_at: None,
        }
    }

    /// Override the generated id (callers that mint their own ids)
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Override the classified media type
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    /// Whether the record counts toward current-usage statistics
    pub fn is_active(&self) -> bool {
        self.state == ArtifactState::Active
    }
}
