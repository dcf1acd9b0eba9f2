use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;
use thiserror::Error;

use crate::models::{IssueStatus, Role};
use crate::policy::IssueAction;

/// StoreError
///
/// Failures surfaced by the persistence collaborators. `Duplicate` is the
/// authoritative uniqueness guard (the service-level existence check is only a
/// fast-fail pre-check); `Conflict` marks a retryable write race on a single
/// row.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Duplicate,
    #[error("concurrent write conflict")]
    Conflict,
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// PortalError
///
/// The complete error taxonomy of the portal core. Every orchestration method
/// surfaces exactly one of these per failing call; nothing is swallowed, and
/// nothing is retried automatically except a single re-attempt after a
/// `StoreError::Conflict`.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Malformed input; the message names the first violated rule.
    #[error("{0}")]
    Validation(String),

    /// Registration conflict on the normalized email.
    #[error("an account with this email already exists")]
    DuplicateIdentifier,

    /// Unknown email and wrong password intentionally share this exact value
    /// so a caller cannot probe which addresses are registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account exists but is soft-deleted. Distinct from
    /// `InvalidCredentials`: deactivation is not a secret-guessing signal.
    #[error("this account has been deactivated")]
    AccountDeactivated,

    #[error("account not found")]
    AccountNotFound,

    #[error("issue not found")]
    IssueNotFound,

    /// Authorization denial on an explicit mutation. Carries the attempted
    /// action and the actor's role for diagnostics; read-path visibility
    /// denials degrade to empty results instead of raising this.
    #[error("{role} is not permitted to {action}")]
    Forbidden { action: IssueAction, role: Role },

    #[error("cannot transition issue from {from} to {to}")]
    InvalidTransition { from: IssueStatus, to: IssueStatus },

    /// The issue is CLOSED; edits and assignment are blocked.
    #[error("issue is closed and can no longer be modified")]
    IssueLocked,

    /// The issue is soft-deleted; only restore may touch it.
    #[error("issue has been deleted")]
    IssueDeleted,

    #[error("assignee must be a STAFF account")]
    InvalidAssignee,

    #[error("issue is already deleted")]
    AlreadyDeleted,

    #[error("issue is not deleted")]
    NotDeleted,

    /// A write raced another writer and the single retry also conflicted.
    #[error("concurrent update, please retry")]
    Conflict,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for PortalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => PortalError::DuplicateIdentifier,
            StoreError::Conflict => PortalError::Conflict,
            StoreError::Backend(msg) => PortalError::Internal(msg),
        }
    }
}

impl PortalError {
    /// Stable machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            PortalError::Validation(_) => "validation_error",
            PortalError::DuplicateIdentifier => "duplicate_identifier",
            PortalError::InvalidCredentials => "invalid_credentials",
            PortalError::AccountDeactivated => "account_deactivated",
            PortalError::AccountNotFound => "account_not_found",
            PortalError::IssueNotFound => "issue_not_found",
            PortalError::Forbidden { .. } => "forbidden",
            PortalError::InvalidTransition { .. } => "invalid_transition",
            PortalError::IssueLocked => "issue_locked",
            PortalError::IssueDeleted => "issue_deleted",
            PortalError::InvalidAssignee => "invalid_assignee",
            PortalError::AlreadyDeleted => "already_deleted",
            PortalError::NotDeleted => "not_deleted",
            PortalError::Conflict => "conflict",
            PortalError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            PortalError::AccountDeactivated | PortalError::Forbidden { .. } => {
                StatusCode::FORBIDDEN
            }
            PortalError::AccountNotFound | PortalError::IssueNotFound => StatusCode::NOT_FOUND,
            PortalError::DuplicateIdentifier
            | PortalError::InvalidTransition { .. }
            | PortalError::AlreadyDeleted
            | PortalError::NotDeleted
            | PortalError::Conflict => StatusCode::CONFLICT,
            PortalError::IssueLocked
            | PortalError::IssueDeleted
            | PortalError::InvalidAssignee => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps every taxonomy variant to an HTTP status plus a small JSON body.
/// Internal failures are logged here with their detail but answer with a
/// generic message.
impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            PortalError::Internal(detail) => {
                tracing::error!(%detail, "internal error while handling request");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({
            "error": self.code(),
            "message": message,
        }));
        (status, body).into_response()
    }
}
