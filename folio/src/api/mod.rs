//! API module for the Folio HTTP server

pub mod auth;
pub mod middleware;
pub mod routes;
pub mod server;

pub use auth::{JwtAuth, Role};
pub use middleware::AuthState;
pub use server::ApiServer;
