//! API routes for the Folio server

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use folio_store::{
    ArtifactCatalog, ArtifactRecord, BlobStore, CacheStats, CleanupReport, ResourceAdmin,
    ResultCache, StorageStats, StoreError,
};

use crate::api::auth::Role;
use crate::api::middleware::AuthState;
use crate::files;

/// Application state
pub struct AppState {
    pub catalog: Arc<ArtifactCatalog>,
    pub cache: Arc<ResultCache>,
    pub blobs: Arc<dyn BlobStore>,
    pub admin: ResourceAdmin,
    pub max_file_size: u64,
}

/// API failure that keeps the error kind visible to clients
pub enum ApiError {
    Store(StoreError),
    BadRequest(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Store(e) => {
                let status = match &e {
                    StoreError::InvalidKey(_) => StatusCode::BAD_REQUEST,
                    StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                    StoreError::InvalidState { .. } | StoreError::DuplicateId { .. } => {
                        StatusCode::CONFLICT
                    }
                    StoreError::BackingStore(_) => StatusCode::BAD_GATEWAY,
                    StoreError::Config(_) | StoreError::Serialization(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (
                    status,
                    ErrorBody {
                        error: e.to_string(),
                        kind: e.kind().to_string(),
                    },
                )
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    kind: "bad_request".to_string(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub expires_in_hours: i64,
}

/// Document list query parameters
#[derive(Deserialize)]
pub struct ListQuery {
    pub group: Option<String>,
    /// List the recycle bin instead of active documents
    #[serde(default)]
    pub deleted: bool,
}

/// Document list response
#[derive(Serialize)]
pub struct ListResponse {
    pub documents: Vec<ArtifactRecord>,
    pub total: usize,
}

/// Cache clear query parameters
#[derive(Deserialize)]
pub struct ClearCacheQuery {
    /// Cache type to clear; everything when omitted
    #[serde(rename = "type")]
    pub cache_type: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Login endpoint (simple demo - in production, validate against a
/// user directory). The operator role is granted to configured
/// operator usernames.
pub async fn login(
    State(auth_state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let role = if auth_state.is_operator_user(&payload.username) {
        Role::Operator
    } else {
        Role::Member
    };

    let expires_in = 24;
    let token = auth_state
        .jwt_auth
        .generate_token(&payload.username, role, Some(expires_in))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(LoginResponse {
        token,
        role,
        expires_in_hours: expires_in,
    }))
}

/// Upload a document into a research group (multipart: `group` text
/// field + `file` field)
pub async fn upload_document(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut group: Option<String> = None;
    let mut raw_filename: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("group") => {
                group = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            Some("file") => {
                raw_filename = field.file_name().map(|s| s.to_string());
                bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let group = group
        .filter(|g| !g.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing group field".to_string()))?;
    let bytes = bytes.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;
    let raw_filename = raw_filename
        .ok_or_else(|| ApiError::BadRequest("file field has no filename".to_string()))?;

    let filename = files::sanitize_filename(&raw_filename)
        .ok_or_else(|| ApiError::BadRequest("unusable filename".to_string()))?;
    if !files::is_allowed_type(&filename) {
        return Err(ApiError::BadRequest(format!(
            "unsupported file type; allowed: {}",
            files::allowed_types_hint()
        )));
    }
    if bytes.len() as u64 > app_state.max_file_size {
        return Err(ApiError::BadRequest(format!(
            "file exceeds the size limit of {} bytes",
            app_state.max_file_size
        )));
    }

    // Resolve display-name collisions within the group
    let taken: HashSet<String> = app_state
        .catalog
        .list(Some(group.as_str()))
        .await
        .into_iter()
        .map(|r| r.filename)
        .collect();
    let filename = files::unique_filename(&filename, &taken);

    let record = ArtifactRecord::new(&group, filename, bytes.len() as u64);
    let artifact_id = record.id.clone();

    app_state.blobs.put(&artifact_id, &bytes).await?;
    match app_state.catalog.register(record).await {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(e) => {
            // The record never made it into the catalog; drop the bytes
            if let Err(cleanup_err) = app_state.blobs.delete(&artifact_id).await {
                warn!(
                    "failed to remove blob for unregistered upload {}: {}",
                    artifact_id, cleanup_err
                );
            }
            Err(e.into())
        }
    }
}

/// List active documents (or the recycle bin), optionally scoped to a
/// group
pub async fn list_documents(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> impl IntoResponse {
    let documents = if params.deleted {
        app_state.catalog.list_deleted(params.group.as_deref()).await
    } else {
        app_state.catalog.list(params.group.as_deref()).await
    };

    Json(ListResponse {
        total: documents.len(),
        documents,
    })
}

/// Download a document's bytes with a safe filename header
pub async fn download_document(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = app_state
        .catalog
        .get(&id)
        .await
        .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;

    // Recycle-bin documents are not downloadable until restored
    if !record.is_active() {
        return Err(StoreError::NotFound { id }.into());
    }

    let bytes = app_state.blobs.read(&record.id).await?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            files::content_disposition(&record.filename),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Soft-delete a document into the recycle bin
pub async fn delete_document(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    app_state.catalog.soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted document
pub async fn restore_document(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ArtifactRecord>, ApiError> {
    app_state.catalog.restore(&id).await?;
    let record = app_state
        .catalog
        .get(&id)
        .await
        .ok_or(StoreError::NotFound { id })?;
    Ok(Json(record))
}

/// Operator: current storage statistics
pub async fn admin_storage_stats(State(app_state): State<Arc<AppState>>) -> Json<StorageStats> {
    Json(app_state.admin.storage_stats().await)
}

/// Operator: purge eligible soft-deleted artifacts
pub async fn admin_cleanup_storage(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<CleanupReport>, ApiError> {
    Ok(Json(app_state.admin.cleanup_storage().await?))
}

/// Operator: current cache statistics
pub async fn admin_cache_stats(State(app_state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(app_state.admin.cache_stats().await)
}

/// Operator: clear one cache type, or everything when `type` is omitted
pub async fn admin_clear_cache(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ClearCacheQuery>,
) -> Result<StatusCode, ApiError> {
    app_state
        .admin
        .clear_cache(params.cache_type.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
