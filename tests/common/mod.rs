// Shared test scaffolding: in-memory implementations of both store traits and
// pre-wired services. The fakes honor the same contracts as the Postgres
// stores (duplicate emails surface StoreError::Duplicate, racing writes can
// be simulated as StoreError::Conflict), so the services under test cannot
// tell the difference.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use civic_portal::auth::TokenIssuer;
use civic_portal::error::StoreError;
use civic_portal::models::{
    Account, CreateIssueRequest, Issue, IssueCategory, IssueFilter, RegisterRequest,
};
use civic_portal::password::Argon2Hasher;
use civic_portal::repository::{AccountStore, AccountStoreState, IssueStore, IssueStoreState};
use civic_portal::services::{AuthService, IssueService};

pub const TEST_SECRET: &str = "portal-test-secret-do-not-deploy";
pub const TEST_PASSWORD: &str = "secret123";

/// InMemoryAccountStore
///
/// HashMap-backed fake honoring the email uniqueness contract.
#[derive(Default)]
pub struct InMemoryAccountStore {
    rows: Mutex<HashMap<Uuid, Account>>,
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate);
        }
        rows.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .any(|a| a.email == email))
    }
}

impl InMemoryAccountStore {
    /// Direct mutation for scenarios the services never produce themselves,
    /// e.g. deactivating an account out-of-band.
    pub fn put(&self, account: Account) {
        self.rows.lock().unwrap().insert(account.id, account);
    }
}

/// InMemoryIssueStore
///
/// HashMap-backed fake with write-conflict injection: `fail_next_updates(n)`
/// makes the next n update calls report StoreError::Conflict, which is how
/// the single-retry behavior of the service is exercised.
#[derive(Default)]
pub struct InMemoryIssueStore {
    rows: Mutex<HashMap<Uuid, Issue>>,
    conflicts_remaining: Mutex<u32>,
}

impl InMemoryIssueStore {
    pub fn fail_next_updates(&self, n: u32) {
        *self.conflicts_remaining.lock().unwrap() = n;
    }
}

#[async_trait]
impl IssueStore for InMemoryIssueStore {
    async fn insert(&self, issue: Issue) -> Result<Issue, StoreError> {
        self.rows.lock().unwrap().insert(issue.id, issue.clone());
        Ok(issue)
    }

    async fn update(&self, issue: Issue) -> Result<Issue, StoreError> {
        {
            let mut remaining = self.conflicts_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StoreError::Conflict);
            }
        }
        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&issue.id) {
            return Err(StoreError::Conflict);
        }
        rows.insert(issue.id, issue.clone());
        Ok(issue)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_criteria(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StoreError> {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<Issue> = rows
            .values()
            .filter(|i| filter.include_deleted.unwrap_or(false) || i.deleted_at.is_none())
            .filter(|i| filter.status.is_none_or(|s| i.status == s))
            .filter(|i| filter.priority.is_none_or(|p| i.priority == p))
            .filter(|i| filter.category.is_none_or(|c| i.category == c))
            .filter(|i| filter.reporter_id.is_none_or(|r| i.reporter_id == r))
            .filter(|i| filter.assignee_id.is_none_or(|a| i.assignee_id == Some(a)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

/// TestEnv
///
/// Both services wired against shared in-memory stores, plus direct handles
/// to the stores for seeding and inspection.
pub struct TestEnv {
    pub accounts: Arc<InMemoryAccountStore>,
    pub issues: Arc<InMemoryIssueStore>,
    pub auth: AuthService,
    pub service: IssueService,
    pub tokens: Arc<TokenIssuer>,
}

pub fn test_env() -> TestEnv {
    let accounts = Arc::new(InMemoryAccountStore::default());
    let issues = Arc::new(InMemoryIssueStore::default());
    let accounts_state: AccountStoreState = accounts.clone();
    let issues_state: IssueStoreState = issues.clone();
    let tokens = Arc::new(TokenIssuer::new(TEST_SECRET));
    let auth = AuthService::new(accounts_state.clone(), Arc::new(Argon2Hasher), tokens.clone());
    let service = IssueService::new(issues_state, accounts_state);
    TestEnv {
        accounts,
        issues,
        auth,
        service,
        tokens,
    }
}

/// Registers an account with the shared test password.
pub async fn register(env: &TestEnv, name: &str, email: &str, role: Option<&str>) -> Account {
    env.auth
        .register(RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            role: role.map(str::to_string),
        })
        .await
        .expect("registration should succeed")
}

/// A valid issue creation payload; tweak fields per test as needed.
pub fn issue_request() -> CreateIssueRequest {
    CreateIssueRequest {
        title: "Broken streetlight on Elm".to_string(),
        description: "The streetlight at Elm and 4th has been dark for a week.".to_string(),
        location: "Elm St & 4th Ave".to_string(),
        category: IssueCategory::Infrastructure,
        priority: None,
    }
}
