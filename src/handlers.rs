use crate::{
    AppState,
    auth::AuthUser,
    error::PortalError,
    models::{
        AccountProfile, AssignIssueRequest, AuthResponse, ChangeStatusRequest, CreateIssueRequest,
        Issue, IssueFilter, LoginRequest, RegisterRequest, UpdateIssueRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

// Handlers are deliberately thin: extract, delegate to the service, and let
// `PortalError`'s IntoResponse mapping pick the status code. All access
// decisions live in the policy/service layers, never here.

/// register
///
/// [Public Route] Creates a new account. The role field is an optional hint;
/// anything blank or unrecognized registers a CITIZEN.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AccountProfile),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountProfile>), PortalError> {
    let account = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(account.profile())))
}

/// login
///
/// [Public Route] Verifies credentials and returns a 24-hour session token
/// plus the account's public profile. Unknown email and wrong password are
/// indistinguishable by design.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, PortalError> {
    let response = state.auth.authenticate(&payload.email, &payload.password).await?;
    Ok(Json(response))
}

/// get_me
///
/// [Authenticated Route] Returns the authenticated account's public profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = AccountProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AccountProfile>, PortalError> {
    Ok(Json(state.auth.profile(id).await?))
}

/// create_issue
///
/// [Authenticated Route] Reports a new issue. The reporter is always the
/// authenticated account; the issue starts in OPEN.
#[utoipa::path(
    post,
    path = "/issues",
    request_body = CreateIssueRequest,
    responses(
        (status = 201, description = "Created", body = Issue),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_issue(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateIssueRequest>,
) -> Result<(StatusCode, Json<Issue>), PortalError> {
    let issue = state.issues.create_issue(payload, id).await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

/// list_issues
///
/// [Authenticated Route] Lists issues matching the filter. Citizens only ever
/// see their own reports, whatever the filter says; soft-deleted issues
/// appear only for admins requesting `include_deleted=true`.
#[utoipa::path(
    get,
    path = "/issues",
    params(IssueFilter),
    responses((status = 200, description = "Matching issues", body = [Issue]))
)]
pub async fn list_issues(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<IssueFilter>,
) -> Result<Json<Vec<Issue>>, PortalError> {
    Ok(Json(state.issues.list_issues(filter, id).await?))
}

/// get_issue
///
/// [Authenticated Route] Retrieves one issue. A visibility denial answers
/// exactly like a missing id (404), so existence is never leaked.
#[utoipa::path(
    get,
    path = "/issues/{id}",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Found", body = Issue),
        (status = 404, description = "Not found or not visible")
    )
)]
pub async fn get_issue(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Issue>, PortalError> {
    match state.issues.get_issue(id, actor_id).await? {
        Some(issue) => Ok(Json(issue)),
        None => Err(PortalError::IssueNotFound),
    }
}

/// update_issue
///
/// [Authenticated Route] Partial edit of an issue's descriptive fields.
/// Citizens may edit their own report only while it is still OPEN.
#[utoipa::path(
    put,
    path = "/issues/{id}",
    request_body = UpdateIssueRequest,
    responses(
        (status = 200, description = "Updated", body = Issue),
        (status = 403, description = "Not permitted"),
        (status = 422, description = "Issue closed or deleted")
    )
)]
pub async fn update_issue(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIssueRequest>,
) -> Result<Json<Issue>, PortalError> {
    Ok(Json(state.issues.update_issue(id, payload, actor_id).await?))
}

/// assign_issue
///
/// [Authenticated Route] Assigns the issue to a STAFF account or unassigns it
/// (`assignee_id: null`). Staff and admins only.
#[utoipa::path(
    put,
    path = "/issues/{id}/assign",
    request_body = AssignIssueRequest,
    responses(
        (status = 200, description = "Assigned", body = Issue),
        (status = 403, description = "Not permitted"),
        (status = 422, description = "Assignee is not STAFF")
    )
)]
pub async fn assign_issue(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignIssueRequest>,
) -> Result<Json<Issue>, PortalError> {
    Ok(Json(
        state
            .issues
            .assign_issue(id, payload.assignee_id, actor_id)
            .await?,
    ))
}

/// change_status
///
/// [Authenticated Route] Advances the issue one lifecycle step. Who may
/// request which target is the policy's call; whether the step is in order is
/// the lifecycle engine's.
#[utoipa::path(
    put,
    path = "/issues/{id}/status",
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Transitioned", body = Issue),
        (status = 403, description = "Not permitted"),
        (status = 409, description = "Transition out of order")
    )
)]
pub async fn change_status(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Json<Issue>, PortalError> {
    Ok(Json(
        state
            .issues
            .change_status(id, payload.status, actor_id)
            .await?,
    ))
}

/// delete_issue
///
/// [Admin Route] Soft-deletes an issue. The record stays and can be restored;
/// the service rejects non-admin actors with 403.
#[utoipa::path(
    delete,
    path = "/admin/issues/{id}",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Soft-deleted", body = Issue),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Already deleted")
    )
)]
pub async fn delete_issue(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Issue>, PortalError> {
    Ok(Json(state.issues.delete_issue(id, actor_id).await?))
}

/// restore_issue
///
/// [Admin Route] Brings a soft-deleted issue back, bit-for-bit except the
/// deletion mark and `updated_at`.
#[utoipa::path(
    post,
    path = "/admin/issues/{id}/restore",
    params(("id" = Uuid, Path, description = "Issue ID")),
    responses(
        (status = 200, description = "Restored", body = Issue),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Not deleted")
    )
)]
pub async fn restore_issue(
    AuthUser { id: actor_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Issue>, PortalError> {
    Ok(Json(state.issues.restore_issue(id, actor_id).await?))
}
