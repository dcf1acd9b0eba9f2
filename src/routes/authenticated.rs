use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every handler here receives a validated `AuthUser` (id + current role)
/// from the extractor layered on in `create_router`. Which of these
/// operations the caller may actually complete is decided per-issue by the
/// authorization policy inside the service — the router only guarantees a
/// live session.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The authenticated account's public profile.
        .route("/me", get(handlers::get_me))
        // POST /issues          — report a new issue (starts in OPEN)
        // GET  /issues?...      — filtered listing with visibility narrowing
        .route(
            "/issues",
            post(handlers::create_issue).get(handlers::list_issues),
        )
        // GET /issues/{id}      — single issue; invisible == missing (404)
        // PUT /issues/{id}      — partial edit of descriptive fields
        .route(
            "/issues/{id}",
            get(handlers::get_issue).put(handlers::update_issue),
        )
        // PUT /issues/{id}/assign
        // Assign to a STAFF account or unassign with null.
        .route("/issues/{id}/assign", put(handlers::assign_issue))
        // PUT /issues/{id}/status
        // One forward lifecycle step (OPEN → IN_PROGRESS → RESOLVED → CLOSED).
        .route("/issues/{id}/status", put(handlers::change_status))
}
