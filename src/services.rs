//! Application services.
//!
//! `AuthService` handles registration and credential verification;
//! `IssueService` composes the authorization policy, the lifecycle engine, and
//! the issue store into one use case per operation. Both receive their
//! collaborators at construction, so tests wire in in-memory fakes.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::TokenIssuer;
use crate::error::PortalError;
use crate::models::{
    Account, AccountProfile, AuthResponse, CreateIssueRequest, Issue, IssueFilter, IssueStatus,
    RegisterRequest, Role, UpdateIssueRequest, normalize_email, validate_email, validate_name,
    validate_password,
};
use crate::password::CredentialHasher;
use crate::policy::{self, IssueAction};
use crate::repository::{AccountStoreState, IssueStoreState};

/// AuthService
///
/// Registers accounts and authenticates credentials, producing a session token
/// on success.
pub struct AuthService {
    accounts: AccountStoreState,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(
        accounts: AccountStoreState,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            accounts,
            hasher,
            tokens,
        }
    }

    /// Registers a new account. The email is normalized to lowercase, the
    /// role hint resolves leniently (unknown values become CITIZEN), and the
    /// raw password exists only long enough to be hashed.
    ///
    /// The existence pre-check is a user-friendly fast fail; the store's
    /// unique constraint remains the authoritative guard, and a late
    /// violation still maps to `DuplicateIdentifier`.
    pub async fn register(&self, req: RegisterRequest) -> Result<Account, PortalError> {
        validate_name(&req.name)?;
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        validate_password(&req.password)?;

        let role = Role::resolve_hint(req.role.as_deref());

        if self.accounts.exists_by_email(&email).await? {
            return Err(PortalError::DuplicateIdentifier);
        }

        let password_hash = self.hasher.hash(&req.password)?;
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let account = self.accounts.insert(account).await?;
        tracing::info!(account_id = %account.id, role = %account.role, "account registered");
        Ok(account)
    }

    /// Verifies credentials and mints a session token.
    ///
    /// An unknown email and a wrong password return the *identical*
    /// `InvalidCredentials` error so callers cannot probe which addresses are
    /// registered. A deactivated account is reported distinctly: that state
    /// is not a secret.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, PortalError> {
        let email = normalize_email(email);

        let Some(account) = self.accounts.find_by_email(&email).await? else {
            return Err(PortalError::InvalidCredentials);
        };

        if !account.is_active() {
            return Err(PortalError::AccountDeactivated);
        }

        if !self.hasher.verify(password, &account.password_hash)? {
            return Err(PortalError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account)?;
        tracing::info!(account_id = %account.id, "session issued");
        Ok(AuthResponse {
            token,
            account: account.profile(),
        })
    }

    /// Profile lookup for GET /me.
    pub async fn profile(&self, id: Uuid) -> Result<AccountProfile, PortalError> {
        let account = self
            .accounts
            .find_by_id(id)
            .await?
            .ok_or(PortalError::AccountNotFound)?;
        Ok(account.profile())
    }
}

/// IssueService
///
/// One method per use case, each following the same skeleton: resolve the
/// referenced ids first (`AccountNotFound` / `IssueNotFound`), then the
/// authorization gate, then the lifecycle engine, then persist.
pub struct IssueService {
    issues: IssueStoreState,
    accounts: AccountStoreState,
}

impl IssueService {
    pub fn new(issues: IssueStoreState, accounts: AccountStoreState) -> Self {
        Self { issues, accounts }
    }

    async fn actor(&self, actor_id: Uuid) -> Result<Account, PortalError> {
        self.accounts
            .find_by_id(actor_id)
            .await?
            .ok_or(PortalError::AccountNotFound)
    }

    async fn issue(&self, id: Uuid) -> Result<Issue, PortalError> {
        self.issues
            .find_by_id(id)
            .await?
            .ok_or(PortalError::IssueNotFound)
    }

    /// Runs a mutating use case, retrying it exactly once if the store
    /// reports a write conflict. The retry re-runs the whole attempt
    /// (re-read, re-check, re-apply); a second conflict surfaces to the
    /// caller. Never a silent overwrite.
    async fn with_retry<F, Fut>(&self, op: F) -> Result<Issue, PortalError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Issue, PortalError>>,
    {
        match op().await {
            Err(PortalError::Conflict) => {
                tracing::warn!("write conflict, retrying use case once");
                op().await
            }
            other => other,
        }
    }

    /// Creates an issue in OPEN on behalf of the reporter.
    pub async fn create_issue(
        &self,
        req: CreateIssueRequest,
        reporter_id: Uuid,
    ) -> Result<Issue, PortalError> {
        let reporter = self.actor(reporter_id).await?;
        let issue = Issue::create(&req, reporter.id, Utc::now())?;
        policy::authorize(reporter.role, reporter.id, &issue, IssueAction::Create)?;
        let issue = self.issues.insert(issue).await?;
        tracing::info!(issue_id = %issue.id, reporter_id = %reporter.id, "issue created");
        Ok(issue)
    }

    /// Applies a partial edit. Only the supplied fields change; each is
    /// re-validated by the lifecycle engine.
    pub async fn update_issue(
        &self,
        id: Uuid,
        req: UpdateIssueRequest,
        actor_id: Uuid,
    ) -> Result<Issue, PortalError> {
        let actor = self.actor(actor_id).await?;
        let (actor, req) = (&actor, &req);
        self.with_retry(|| async move {
            let mut issue = self.issue(id).await?;
            policy::authorize(actor.role, actor.id, &issue, IssueAction::Edit)?;
            issue.apply_update(req, Utc::now())?;
            Ok(self.issues.update(issue).await?)
        })
        .await
    }

    /// Assigns the issue to a STAFF account, or unassigns with `None`.
    pub async fn assign_issue(
        &self,
        id: Uuid,
        assignee_id: Option<Uuid>,
        actor_id: Uuid,
    ) -> Result<Issue, PortalError> {
        let actor = self.actor(actor_id).await?;
        let assignee = match assignee_id {
            Some(assignee_id) => Some(self.actor(assignee_id).await?),
            None => None,
        };
        let (actor, assignee) = (&actor, &assignee);
        self.with_retry(|| async move {
            let mut issue = self.issue(id).await?;
            policy::authorize(actor.role, actor.id, &issue, IssueAction::Assign)?;
            issue.set_assignee(assignee.as_ref(), Utc::now())?;
            Ok(self.issues.update(issue).await?)
        })
        .await
    }

    /// Moves the issue one step forward through its lifecycle. The
    /// authorization check is keyed by the *target* status (staff may resolve
    /// only their own assignment, only admins close); the engine then
    /// enforces structural legality.
    pub async fn change_status(
        &self,
        id: Uuid,
        target: IssueStatus,
        actor_id: Uuid,
    ) -> Result<Issue, PortalError> {
        let actor = self.actor(actor_id).await?;
        let actor = &actor;
        self.with_retry(|| async move {
            let mut issue = self.issue(id).await?;
            policy::authorize(
                actor.role,
                actor.id,
                &issue,
                IssueAction::Transition(target),
            )?;
            issue.transition(target, Utc::now())?;
            Ok(self.issues.update(issue).await?)
        })
        .await
    }

    /// Soft-deletes the issue (admin only). Status and resolution timestamps
    /// are untouched so restore is lossless.
    pub async fn delete_issue(&self, id: Uuid, actor_id: Uuid) -> Result<Issue, PortalError> {
        let actor = self.actor(actor_id).await?;
        let actor = &actor;
        self.with_retry(|| async move {
            let mut issue = self.issue(id).await?;
            policy::authorize(actor.role, actor.id, &issue, IssueAction::Delete)?;
            issue.soft_delete(Utc::now())?;
            let issue = self.issues.update(issue).await?;
            tracing::info!(issue_id = %issue.id, actor_id = %actor.id, "issue soft-deleted");
            Ok(issue)
        })
        .await
    }

    /// Restores a soft-deleted issue (admin only).
    pub async fn restore_issue(&self, id: Uuid, actor_id: Uuid) -> Result<Issue, PortalError> {
        let actor = self.actor(actor_id).await?;
        let actor = &actor;
        self.with_retry(|| async move {
            let mut issue = self.issue(id).await?;
            policy::authorize(actor.role, actor.id, &issue, IssueAction::Restore)?;
            issue.restore(Utc::now())?;
            let issue = self.issues.update(issue).await?;
            tracing::info!(issue_id = %issue.id, actor_id = %actor.id, "issue restored");
            Ok(issue)
        })
        .await
    }

    /// Single-issue read. A visibility denial yields `Ok(None)` rather than
    /// `Forbidden`, so an actor who may not see the issue cannot distinguish
    /// it from one that does not exist. A genuinely unknown id is
    /// `IssueNotFound`; the HTTP layer renders both identically.
    pub async fn get_issue(&self, id: Uuid, actor_id: Uuid) -> Result<Option<Issue>, PortalError> {
        let actor = self.actor(actor_id).await?;
        let issue = self.issue(id).await?;
        if policy::can_view(actor.role, actor.id, &issue) {
            Ok(Some(issue))
        } else {
            Ok(None)
        }
    }

    /// Filtered listing with visibility narrowing: citizens are pinned to
    /// their own reports regardless of the requested filter, and only admins
    /// may see soft-deleted issues.
    pub async fn list_issues(
        &self,
        mut filter: IssueFilter,
        actor_id: Uuid,
    ) -> Result<Vec<Issue>, PortalError> {
        let actor = self.actor(actor_id).await?;
        if actor.role == Role::Citizen {
            filter.reporter_id = Some(actor.id);
        }
        if actor.role != Role::Admin {
            filter.include_deleted = Some(false);
        }
        Ok(self.issues.find_by_criteria(&filter).await?)
    }
}
