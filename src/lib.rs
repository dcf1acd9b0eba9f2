use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod password;
pub mod policy;
pub mod repository;
pub mod services;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the entry point (main.rs).
pub use config::AppConfig;
pub use repository::{
    AccountStoreState, IssueStoreState, PostgresAccountStore, PostgresIssueStore,
};
pub use services::{AuthService, IssueService};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation by aggregating every handler
/// annotated with `#[utoipa::path]` and every schema used in request or
/// response bodies. Served as JSON at `/api-docs/openapi.json` and browsable
/// at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::get_me,
        handlers::create_issue, handlers::list_issues, handlers::get_issue,
        handlers::update_issue, handlers::assign_issue, handlers::change_status,
        handlers::delete_issue, handlers::restore_issue,
    ),
    components(
        schemas(
            models::AccountProfile, models::AuthResponse, models::RegisterRequest,
            models::LoginRequest, models::Issue, models::CreateIssueRequest,
            models::UpdateIssueRequest, models::AssignIssueRequest,
            models::ChangeStatusRequest, models::Role, models::IssueStatus,
            models::IssueCategory, models::IssuePriority,
        )
    ),
    tags(
        (name = "civic-portal", description = "Citizen Issue Reporting API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for all services and configuration. Cloned per
/// request; every field is an `Arc` or otherwise cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Registration and session issuance.
    pub auth: Arc<AuthService>,
    /// Issue orchestration (policy gate + lifecycle engine + store).
    pub issues: Arc<IssueService>,
    /// Account store handle, needed directly by the `AuthUser` extractor.
    pub accounts: AccountStoreState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

// FromRef implementations let the AuthUser extractor pull just the pieces it
// needs from the shared state.

impl FromRef<AppState> for AccountStoreState {
    fn from_ref(app_state: &AppState) -> AccountStoreState {
        app_state.accounts.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the authenticated and admin route sets: extracting `AuthUser`
/// runs the full token validation and account re-read, rejecting with 401
/// before any handler executes.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies scoped and global middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware.
        .merge(public::public_routes())
        // Authenticated routes: session required.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: session required here; the ADMIN role itself is
        // checked by the authorization policy inside the service.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .with_state(state);

    // Observability and correlation layers, outermost.
    base_router
        .layer(
            ServiceBuilder::new()
                // Generate a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // Wrap the request/response lifecycle in a correlated span.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Return the generated x-request-id to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes span creation for `TraceLayer`: includes the `x-request-id`
/// header so every log line belonging to one request shares a correlation id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
