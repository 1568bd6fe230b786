//! Application configuration
//!
//! Settings load from an optional YAML file (`folio.yaml` by default);
//! any field left out falls back to its default, and the JWT secret may
//! come from the `JWT_SECRET` environment variable instead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host the API server binds to
    pub host: String,

    /// Port the API server binds to
    pub port: u16,

    /// Root directory for blobs and the catalog index
    pub data_dir: PathBuf,

    /// JWT signing secret; `JWT_SECRET` env var wins when unset here
    pub jwt_secret: Option<String>,

    /// Upload size cap in bytes
    pub max_file_size: u64,

    /// Cache memory budget in bytes
    pub cache_max_memory_bytes: u64,

    /// Seconds a soft-deleted artifact stays restorable before cleanup
    /// may purge it; unset means purge-eligible immediately
    pub retention_secs: Option<u64>,

    /// Usernames granted the operator role at login
    pub operators: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            jwt_secret: None,
            max_file_size: crate::files::DEFAULT_MAX_FILE_SIZE,
            cache_max_memory_bytes: 256 * 1024 * 1024,
            retention_secs: None,
            operators: vec!["admin".to_string()],
        }
    }
}

impl AppConfig {
    /// Load configuration. An explicit path must exist; otherwise
    /// `folio.yaml` in the working directory is used when present, and
    /// defaults apply when it is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let default_path = Path::new("folio.yaml");
                if default_path.exists() {
                    Self::read(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Resolve the JWT secret: config value, then `JWT_SECRET` env var
    pub fn resolve_jwt_secret(&self) -> Option<String> {
        self.jwt_secret
            .clone()
            .or_else(|| std::env::var("JWT_SECRET").ok())
    }
}
