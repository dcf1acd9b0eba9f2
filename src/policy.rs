//! Authorization Policy
//!
//! Pure decision functions: "may actor A with role R perform action X on this
//! issue". No I/O, no clock, no side effects, so the whole rule table is
//! testable in isolation. The structural legality of a change (e.g. whether a
//! status transition is in order) is a separate concern handled by
//! `lifecycle.rs`; this module only answers *who*.

use uuid::Uuid;

use crate::error::PortalError;
use crate::models::{Issue, IssueStatus, Role};

/// IssueAction
///
/// The actions the policy rules range over. Transitions are keyed by the
/// *target* status because the rule differs per target (staff may start work
/// on anything, may resolve only their own assignment, may never close).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueAction {
    View,
    Create,
    Edit,
    Assign,
    Transition(IssueStatus),
    Delete,
    Restore,
}

impl std::fmt::Display for IssueAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueAction::View => f.write_str("view this issue"),
            IssueAction::Create => f.write_str("create an issue"),
            IssueAction::Edit => f.write_str("edit this issue"),
            IssueAction::Assign => f.write_str("assign this issue"),
            IssueAction::Transition(to) => write!(f, "move this issue to {to}"),
            IssueAction::Delete => f.write_str("delete this issue"),
            IssueAction::Restore => f.write_str("restore this issue"),
        }
    }
}

/// The central rule table.
///
/// | Action            | ADMIN | STAFF            | CITIZEN (reporter) |
/// |-------------------|-------|------------------|--------------------|
/// | View              | yes   | yes              | yes                |
/// | Create            | yes   | yes              | yes                |
/// | Edit              | yes   | yes              | only while OPEN    |
/// | Assign            | yes   | yes              | no                 |
/// | -> IN_PROGRESS    | yes   | yes              | no                 |
/// | -> RESOLVED       | yes   | only as assignee | no                 |
/// | -> CLOSED         | yes   | no               | no                 |
/// | Delete / Restore  | yes   | no               | no                 |
///
/// A citizen who is not the reporter gets `false` for everything but Create.
pub fn can_perform(role: Role, actor_id: Uuid, issue: &Issue, action: IssueAction) -> bool {
    match action {
        IssueAction::Create => true,
        IssueAction::View => can_view(role, actor_id, issue),
        IssueAction::Edit => match role {
            Role::Admin | Role::Staff => true,
            Role::Citizen => issue.reporter_id == actor_id && issue.status == IssueStatus::Open,
        },
        IssueAction::Assign => matches!(role, Role::Admin | Role::Staff),
        IssueAction::Transition(target) => match role {
            Role::Admin => true,
            Role::Staff => match target {
                IssueStatus::Resolved => issue.assignee_id == Some(actor_id),
                IssueStatus::Closed => false,
                // Backward/no-op targets pass here; the lifecycle engine
                // rejects them with InvalidTransition.
                _ => true,
            },
            Role::Citizen => false,
        },
        IssueAction::Delete | IssueAction::Restore => role == Role::Admin,
    }
}

/// Visibility rule shared by `getIssue` and list filtering: staff and admins
/// see every issue, citizens only what they reported. Deleted issues are
/// admin-only on read paths.
pub fn can_view(role: Role, actor_id: Uuid, issue: &Issue) -> bool {
    if issue.is_deleted() && role != Role::Admin {
        return false;
    }
    match role {
        Role::Admin | Role::Staff => true,
        Role::Citizen => issue.reporter_id == actor_id,
    }
}

/// Mutation gate: a denial is an explicit `Forbidden` carrying the attempted
/// action and the actor's role. Never used on read paths, which degrade to
/// empty results instead (anti-existence-leak).
pub fn authorize(
    role: Role,
    actor_id: Uuid,
    issue: &Issue,
    action: IssueAction,
) -> Result<(), PortalError> {
    if can_perform(role, actor_id, issue, action) {
        Ok(())
    } else {
        Err(PortalError::Forbidden { action, role })
    }
}
