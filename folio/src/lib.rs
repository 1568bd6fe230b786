pub mod api;
pub mod config;
pub mod files;

pub use api::{ApiServer, AuthState, JwtAuth, Role};
pub use config::AppConfig;
