use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post},
};

/// Admin Router Module
///
/// Moderation endpoints nested under `/admin`. The router sits behind the
/// authentication middleware; the ADMIN role requirement is enforced by the
/// authorization policy in the service layer, so a STAFF or CITIZEN session
/// reaching these paths gets a 403, never a silent success.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // DELETE /admin/issues/{id}
        // Soft delete: marks the issue deleted, preserving status and
        // resolution timestamps for a later restore.
        .route("/issues/{id}", delete(handlers::delete_issue))
        // POST /admin/issues/{id}/restore
        // Reverses a soft delete. Fails 409 on an issue that is not deleted.
        .route("/issues/{id}/restore", post(handlers::restore_issue))
}
