use civic_portal::{
    AppState, AuthService, IssueService, create_router,
    config::{AppConfig, Env},
    repository::{AccountStoreState, IssueStoreState, PostgresAccountStore, PostgresIssueStore},
};
use civic_portal::{auth::TokenIssuer, password::Argon2Hasher};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the database pool, the service wiring,
/// and the HTTP server, in that order.
#[tokio::main]
async fn main() {
    // Configuration (fail-fast on missing production secrets).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // Logging filter: RUST_LOG wins, with sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "civic_portal=debug,tower_http=info,axum=trace".into());

    // Log format follows the environment: pretty for humans locally, JSON for
    // log aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // Database pool.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Store handles, shared as trait objects so tests can substitute fakes.
    let accounts = Arc::new(PostgresAccountStore::new(pool.clone())) as AccountStoreState;
    let issues = Arc::new(PostgresIssueStore::new(pool)) as IssueStoreState;

    // Service wiring: hasher and token issuer are injected capabilities.
    let hasher = Arc::new(Argon2Hasher);
    let tokens = Arc::new(TokenIssuer::new(&config.jwt_secret));
    let auth = Arc::new(AuthService::new(accounts.clone(), hasher, tokens));
    let issue_service = Arc::new(IssueService::new(issues, accounts.clone()));

    let app_state = AppState {
        auth,
        issues: issue_service,
        accounts,
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000").await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
