//! API server for Folio

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

use folio_store::{ArtifactCatalog, CacheConfig, FsBlobStore, ResourceAdmin, ResultCache};

use super::middleware::{auth_middleware, operator_middleware, AuthState};
use super::routes::{
    admin_cache_stats, admin_cleanup_storage, admin_clear_cache, admin_storage_stats,
    delete_document, download_document, health_check, list_documents, login, restore_document,
    upload_document, AppState,
};
use crate::files;

/// Configuration for the API server
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub data_dir: PathBuf,
    /// Upload size cap in bytes
    pub max_file_size: u64,
    /// Cache memory budget in bytes
    pub cache_max_memory_bytes: u64,
    /// Grace period before soft-deleted artifacts may be purged;
    /// `None` makes them purge-eligible immediately
    pub retention: Option<Duration>,
    /// Usernames granted the operator role at login
    pub operators: Vec<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "default_secret_change_in_production".to_string()),
            data_dir: PathBuf::from("./data"),
            max_file_size: files::DEFAULT_MAX_FILE_SIZE,
            cache_max_memory_bytes: 256 * 1024 * 1024,
            retention: None,
            operators: vec!["admin".to_string()],
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
}

impl ApiServer {
    /// Create a new API server with configuration
    pub fn new(config: ApiServerConfig) -> Self {
        Self { config }
    }

    /// Create a new API server with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: ApiServerConfig::default(),
        }
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        // Wire up the resource engines
        let blobs = Arc::new(FsBlobStore::new(self.config.data_dir.join("blobs")).await?);

        let mut catalog = ArtifactCatalog::new(blobs.clone());
        if let Some(retention) = self.config.retention {
            catalog = catalog.with_retention(retention);
        }
        let catalog = Arc::new(
            catalog
                .with_index(self.config.data_dir.join("catalog.json"))
                .await?,
        );

        let cache_config = CacheConfig::builder()
            .max_memory_bytes(self.config.cache_max_memory_bytes)
            .build();
        let cache = Arc::new(ResultCache::new(cache_config));

        let admin = ResourceAdmin::new(catalog.clone(), cache.clone());

        // Create application state
        let app_state = Arc::new(AppState {
            catalog,
            cache,
            blobs,
            admin,
            max_file_size: self.config.max_file_size,
        });

        // Create authentication state
        let auth_state = AuthState::new(&self.config.jwt_secret, self.config.operators.clone());

        // Member routes: document lifecycle
        let document_routes = Router::new()
            .route("/api/documents", post(upload_document).get(list_documents))
            .route(
                "/api/documents/:id",
                get(download_document).delete(delete_document),
            )
            .route("/api/documents/:id/restore", post(restore_document))
            .layer(DefaultBodyLimit::max(
                self.config.max_file_size as usize + 1024 * 1024,
            ))
            .route_layer(from_fn_with_state(auth_state.clone(), auth_middleware));

        // Operator routes: resource administration
        let admin_routes = Router::new()
            .route("/api/admin/storage/stats", get(admin_storage_stats))
            .route("/api/admin/storage/cleanup", post(admin_cleanup_storage))
            .route("/api/admin/cache/stats", get(admin_cache_stats))
            .route("/api/admin/cache/clear", post(admin_clear_cache))
            .route_layer(from_fn(operator_middleware))
            .route_layer(from_fn_with_state(auth_state.clone(), auth_middleware));

        // Build router
        let app = Router::new()
            // Public routes
            .route("/health", get(health_check))
            .route("/login", post(login))
            .with_state(auth_state.clone())
            // Protected routes
            .merge(document_routes.with_state(app_state.clone()))
            .merge(admin_routes.with_state(app_state))
            // Add CORS layer
            .layer(CorsLayer::permissive());

        // Start server
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
