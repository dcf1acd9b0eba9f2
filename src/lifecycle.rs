//! Issue Lifecycle Engine
//!
//! The Issue entity's internal state machine: which status changes are in
//! order, when fields may still be edited, what a valid assignee is, and how
//! soft delete/restore behave. These guards are structural and independent of
//! the authorization layer — even an ADMIN cannot move CLOSED back to OPEN.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PortalError;
use crate::models::{
    Account, CreateIssueRequest, Issue, IssuePriority, IssueStatus, Role, UpdateIssueRequest,
    validate_description, validate_title,
};

impl Issue {
    /// Validating factory: every issue starts life OPEN, unassigned, with
    /// timestamps set and priority defaulted to MEDIUM.
    pub fn create(
        req: &CreateIssueRequest,
        reporter_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Issue, PortalError> {
        validate_title(&req.title)?;
        validate_description(&req.description)?;
        Ok(Issue {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            location: req.location.trim().to_string(),
            category: req.category,
            priority: req.priority.unwrap_or(IssuePriority::Medium),
            status: IssueStatus::Open,
            reporter_id,
            assignee_id: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            closed_at: None,
            deleted_at: None,
        })
    }

    /// Advances the status by exactly one step. The only legal moves are
    /// OPEN → IN_PROGRESS → RESOLVED → CLOSED; anything else (backward,
    /// skipping, same-state, or out of CLOSED) is an `InvalidTransition`
    /// naming both ends. RESOLVED stamps `resolved_at`, CLOSED stamps
    /// `closed_at`.
    pub fn transition(&mut self, to: IssueStatus, now: DateTime<Utc>) -> Result<(), PortalError> {
        if self.is_deleted() {
            return Err(PortalError::IssueDeleted);
        }
        match (self.status, to) {
            (IssueStatus::Open, IssueStatus::InProgress) => {}
            (IssueStatus::InProgress, IssueStatus::Resolved) => {
                self.resolved_at = Some(now);
            }
            (IssueStatus::Resolved, IssueStatus::Closed) => {
                self.closed_at = Some(now);
            }
            (from, to) => return Err(PortalError::InvalidTransition { from, to }),
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Applies a partial edit: only the supplied fields change, and each
    /// supplied field is re-validated. Blocked once CLOSED (`IssueLocked`) or
    /// soft-deleted (`IssueDeleted`).
    pub fn apply_update(
        &mut self,
        req: &UpdateIssueRequest,
        now: DateTime<Utc>,
    ) -> Result<(), PortalError> {
        if self.is_deleted() {
            return Err(PortalError::IssueDeleted);
        }
        if self.status == IssueStatus::Closed {
            return Err(PortalError::IssueLocked);
        }
        if let Some(title) = &req.title {
            validate_title(title)?;
        }
        if let Some(description) = &req.description {
            validate_description(description)?;
        }
        // Validation passed for everything supplied; now apply atomically.
        if let Some(title) = &req.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &req.description {
            self.description = description.trim().to_string();
        }
        if let Some(location) = &req.location {
            self.location = location.trim().to_string();
        }
        if let Some(category) = req.category {
            self.category = category;
        }
        if let Some(priority) = req.priority {
            self.priority = priority;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Sets or clears the assignee. The assignee must be a STAFF account;
    /// pointing at a CITIZEN or ADMIN is `InvalidAssignee`. Assignment is
    /// blocked once the issue is CLOSED or deleted.
    pub fn set_assignee(
        &mut self,
        assignee: Option<&Account>,
        now: DateTime<Utc>,
    ) -> Result<(), PortalError> {
        if self.is_deleted() {
            return Err(PortalError::IssueDeleted);
        }
        if self.status == IssueStatus::Closed {
            return Err(PortalError::IssueLocked);
        }
        match assignee {
            Some(account) if account.role != Role::Staff => Err(PortalError::InvalidAssignee),
            Some(account) => {
                self.assignee_id = Some(account.id);
                self.updated_at = now;
                Ok(())
            }
            None => {
                self.assignee_id = None;
                self.updated_at = now;
                Ok(())
            }
        }
    }

    /// Marks the issue deleted. Does not alter status, `resolved_at`, or
    /// `closed_at`, so a later restore brings back the exact pre-delete state.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) -> Result<(), PortalError> {
        if self.is_deleted() {
            return Err(PortalError::AlreadyDeleted);
        }
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Clears the deletion mark. Only valid from the deleted state.
    pub fn restore(&mut self, now: DateTime<Utc>) -> Result<(), PortalError> {
        if !self.is_deleted() {
            return Err(PortalError::NotDeleted);
        }
        self.deleted_at = None;
        self.updated_at = now;
        Ok(())
    }
}
