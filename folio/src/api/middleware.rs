//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::{Claims, JwtAuth};

/// Authentication state shared across requests
#[derive(Clone)]
pub struct AuthState {
    pub jwt_auth: Arc<JwtAuth>,
    /// Usernames granted the operator role at login
    pub operators: Arc<HashSet<String>>,
}

impl AuthState {
    pub fn new(secret: &str, operators: impl IntoIterator<Item = String>) -> Self {
        Self {
            jwt_auth: Arc::new(JwtAuth::new(secret)),
            operators: Arc::new(operators.into_iter().collect()),
        }
    }

    /// Whether a username logs in with the operator role
    pub fn is_operator_user(&self, username: &str) -> bool {
        self.operators.contains(username)
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Extract bearer token
    let token = JwtAuth::extract_bearer_token(auth_header)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // Validate token
    let claims = state
        .jwt_auth
        .validate_token(&token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // Store claims in request extensions for later use
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Gate for resource-admin routes: requires an operator token.
/// Must run after `auth_middleware` has inserted the claims.
pub async fn operator_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !claims.is_operator() {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}
