use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints: the session gateway (register/login) and the
/// health probe. Everything that touches issue data requires a session and
/// lives in the authenticated router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer / monitoring probe. Answers "ok" if the process is up.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Account creation. Stores a password hash, never the raw credential.
        .route("/auth/register", post(handlers::register))
        // POST /auth/login
        // Credential verification and session token issuance.
        .route("/auth/login", post(handlers::login))
}
