use crate::error::StoreError;
use crate::models::{Account, Issue, IssueFilter};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// AccountStore
///
/// Abstract contract for account persistence (the Credential Store). The
/// services depend only on this trait, so tests substitute an in-memory fake.
/// The store is the authoritative guard for email uniqueness: a duplicate
/// insert must surface `StoreError::Duplicate` even when a service-level
/// pre-check raced and passed.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: Account) -> Result<Account, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    // `email` must already be normalized to lowercase by the caller.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
}

/// IssueStore
///
/// Abstract contract for issue persistence. `update` may surface
/// `StoreError::Conflict` when two writers race on the same row; the
/// orchestration layer retries the whole use case once.
#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn insert(&self, issue: Issue) -> Result<Issue, StoreError>;
    async fn update(&self, issue: Issue) -> Result<Issue, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, StoreError>;
    /// Filtered listing. Soft-deleted rows are excluded unless
    /// `include_deleted` is set (the service only sets it for admins).
    async fn find_by_criteria(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StoreError>;
}

/// Shared state aliases for the application state and extractors.
pub type AccountStoreState = Arc<dyn AccountStore>;
pub type IssueStoreState = Arc<dyn IssueStore>;

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, role, created_at, updated_at, deleted_at";

const ISSUE_COLUMNS: &str = "id, title, description, location, category, priority, status, \
     reporter_id, assignee_id, created_at, updated_at, resolved_at, closed_at, deleted_at";

/// Maps low-level sqlx failures onto the store taxonomy. Unique violations
/// (23505) become `Duplicate`; serialization failures and deadlocks (40001,
/// 40P01) become the retryable `Conflict`.
fn map_db_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return StoreError::Duplicate,
            Some("40001") | Some("40P01") => return StoreError::Conflict,
            _ => {}
        }
    }
    StoreError::Backend(err.to_string())
}

/// PostgresAccountStore
///
/// Concrete `AccountStore` backed by PostgreSQL.
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO accounts ({ACCOUNT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(account.id)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.role)
            .bind(account.created_at)
            .bind(account.updated_at)
            .bind(account.deleted_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }
}

/// PostgresIssueStore
///
/// Concrete `IssueStore` backed by PostgreSQL.
pub struct PostgresIssueStore {
    pool: PgPool,
}

impl PostgresIssueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IssueStore for PostgresIssueStore {
    async fn insert(&self, issue: Issue) -> Result<Issue, StoreError> {
        let sql = format!(
            "INSERT INTO issues ({ISSUE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {ISSUE_COLUMNS}"
        );
        sqlx::query_as::<_, Issue>(&sql)
            .bind(issue.id)
            .bind(&issue.title)
            .bind(&issue.description)
            .bind(&issue.location)
            .bind(issue.category)
            .bind(issue.priority)
            .bind(issue.status)
            .bind(issue.reporter_id)
            .bind(issue.assignee_id)
            .bind(issue.created_at)
            .bind(issue.updated_at)
            .bind(issue.resolved_at)
            .bind(issue.closed_at)
            .bind(issue.deleted_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn update(&self, issue: Issue) -> Result<Issue, StoreError> {
        let sql = format!(
            "UPDATE issues SET \
                title = $2, description = $3, location = $4, category = $5, \
                priority = $6, status = $7, assignee_id = $8, updated_at = $9, \
                resolved_at = $10, closed_at = $11, deleted_at = $12 \
             WHERE id = $1 \
             RETURNING {ISSUE_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Issue>(&sql)
            .bind(issue.id)
            .bind(&issue.title)
            .bind(&issue.description)
            .bind(&issue.location)
            .bind(issue.category)
            .bind(issue.priority)
            .bind(issue.status)
            .bind(issue.assignee_id)
            .bind(issue.updated_at)
            .bind(issue.resolved_at)
            .bind(issue.closed_at)
            .bind(issue.deleted_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        // The row vanishing between read and write counts as a race.
        updated.ok_or(StoreError::Conflict)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, StoreError> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = $1");
        sqlx::query_as::<_, Issue>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)
    }

    /// Flexible filtered listing built with QueryBuilder so every value is a
    /// bind parameter, never interpolated.
    async fn find_by_criteria(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StoreError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE 1 = 1"));

        if !filter.include_deleted.unwrap_or(false) {
            builder.push(" AND deleted_at IS NULL");
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND priority = ");
            builder.push_bind(priority);
        }
        if let Some(category) = filter.category {
            builder.push(" AND category = ");
            builder.push_bind(category);
        }
        if let Some(reporter_id) = filter.reporter_id {
            builder.push(" AND reporter_id = ");
            builder.push_bind(reporter_id);
        }
        if let Some(assignee_id) = filter.assignee_id {
            builder.push(" AND assignee_id = ");
            builder.push_bind(assignee_id);
        }

        builder.push(" ORDER BY created_at DESC");

        builder
            .build_query_as::<Issue>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)
    }
}
