use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::PortalError;

// --- Domain Enums (Mapped to Postgres enum types) ---

/// Role
///
/// The RBAC field attached to every account. Determines which issue operations
/// the authorization policy permits (see `policy.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "account_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Staff,
    Citizen,
}

impl Role {
    /// Resolves a caller-supplied role hint. Blank or unrecognized values fall
    /// back to `Citizen` rather than failing; matching is case-insensitive.
    /// Lenient by design: registration never rejects a role typo.
    pub fn resolve_hint(hint: Option<&str>) -> Role {
        match hint.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("admin") => Role::Admin,
            Some(s) if s.eq_ignore_ascii_case("staff") => Role::Staff,
            _ => Role::Citizen,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
            Role::Citizen => "CITIZEN",
        };
        f.write_str(s)
    }
}

/// IssueStatus
///
/// The lifecycle states of a reported issue. Transitions move strictly forward
/// (OPEN → IN_PROGRESS → RESOLVED → CLOSED); the ordering rules live in
/// `lifecycle.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "issue_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueStatus::Open => "OPEN",
            IssueStatus::InProgress => "IN_PROGRESS",
            IssueStatus::Resolved => "RESOLVED",
            IssueStatus::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// IssueCategory
///
/// Coarse classification chosen by the reporter at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "issue_category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCategory {
    Infrastructure,
    Sanitation,
    Safety,
    Environment,
    Other,
}

/// IssuePriority
///
/// Defaults to `Medium` when the reporter does not supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "issue_priority", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuePriority {
    Low,
    Medium,
    High,
    Critical,
}

// --- Core Application Schemas (Mapped to Database) ---

/// Account
///
/// The canonical identity record stored in `public.accounts`. The password
/// hash never leaves this process: the struct deliberately does not derive
/// `Serialize`, and all outward-facing responses go through `AccountProfile`.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    // Stored lowercase; all lookups normalize first.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Non-null marks the account deactivated (soft delete).
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// The outward-facing shape of an account (no credential material).
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// AccountProfile
///
/// Output schema for account data (login response, GET /me).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccountProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Issue
///
/// A reported issue from `public.issues`. `reporter_id` is immutable after
/// creation; `assignee_id` must reference a STAFF account and may change while
/// the issue is not closed. All "removal" is soft: `deleted_at` is set and the
/// row stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: IssueCategory,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub reporter_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Issue {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for POST /auth/register. The raw password is hashed before
/// persistence and never logged. `role` is a free-form hint resolved by
/// `Role::resolve_hint`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// AuthResponse
///
/// Output of a successful login: the session token plus the minimal public
/// profile of the authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub account: AccountProfile,
}

/// CreateIssueRequest
///
/// Input payload for POST /issues. Priority defaults to MEDIUM when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateIssueRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: IssueCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<IssuePriority>,
}

/// UpdateIssueRequest
///
/// Partial update payload for PUT /issues/{id}. All fields are `Option<T>`
/// with `skip_serializing_if` so only the supplied fields travel the wire and
/// only those are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateIssueRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<IssueCategory>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<IssuePriority>,
}

/// AssignIssueRequest
///
/// Input payload for PUT /issues/{id}/assign. `assignee_id: null` unassigns.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignIssueRequest {
    pub assignee_id: Option<Uuid>,
}

/// ChangeStatusRequest
///
/// Input payload for PUT /issues/{id}/status.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub status: IssueStatus,
}

/// IssueFilter
///
/// Accepted query parameters for GET /issues. Visibility narrowing (citizens
/// see only their own reports, `include_deleted` is admin-only) happens in the
/// service layer, not here.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub category: Option<IssueCategory>,
    pub reporter_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub include_deleted: Option<bool>,
}

// --- Field Validation ---

// Bounds from the data model; registration and issue edits both funnel
// through these so the rules cannot drift apart.
pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;
pub const TITLE_MIN: usize = 10;
pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MIN: usize = 20;
pub const DESCRIPTION_MAX: usize = 2000;

/// Lowercases an email for storage and comparison. Case differences must
/// never distinguish two accounts.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn char_len_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

pub fn validate_name(name: &str) -> Result<(), PortalError> {
    if !char_len_between(name.trim(), NAME_MIN, NAME_MAX) {
        return Err(PortalError::Validation(format!(
            "name must be between {NAME_MIN} and {NAME_MAX} characters"
        )));
    }
    Ok(())
}

/// Syntactic email check: exactly one '@', non-empty local part, a domain
/// containing a dot, and no whitespace. Deliverability is not our problem.
pub fn validate_email(email: &str) -> Result<(), PortalError> {
    let err = || PortalError::Validation("email is not a valid address".to_string());
    if email.is_empty() || email.len() > EMAIL_MAX || email.chars().any(char::is_whitespace) {
        return Err(err());
    }
    let (local, domain) = email.split_once('@').ok_or_else(err)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(err());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(err());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), PortalError> {
    if !char_len_between(password, PASSWORD_MIN, PASSWORD_MAX) {
        return Err(PortalError::Validation(format!(
            "password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), PortalError> {
    if !char_len_between(title.trim(), TITLE_MIN, TITLE_MAX) {
        return Err(PortalError::Validation(format!(
            "title must be between {TITLE_MIN} and {TITLE_MAX} characters"
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), PortalError> {
    if !char_len_between(description.trim(), DESCRIPTION_MIN, DESCRIPTION_MAX) {
        return Err(PortalError::Validation(format!(
            "description must be between {DESCRIPTION_MIN} and {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}
