mod common;

use chrono::Utc;
use civic_portal::error::PortalError;
use civic_portal::models::{
    Account, Issue, IssuePriority, IssueStatus, Role, UpdateIssueRequest,
};
use common::issue_request;
use uuid::Uuid;

fn account_with_role(role: Role) -> Account {
    let now = Utc::now();
    Account {
        id: Uuid::new_v4(),
        name: "Fixture".to_string(),
        email: format!("{}@x.com", Uuid::new_v4().simple()),
        password_hash: "$argon2id$fixture".to_string(),
        role,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn open_issue() -> Issue {
    Issue::create(&issue_request(), Uuid::new_v4(), Utc::now()).unwrap()
}

const ALL_STATUSES: [IssueStatus; 4] = [
    IssueStatus::Open,
    IssueStatus::InProgress,
    IssueStatus::Resolved,
    IssueStatus::Closed,
];

#[test]
fn create_starts_open_with_default_priority() {
    let issue = open_issue();
    assert_eq!(issue.status, IssueStatus::Open);
    assert_eq!(issue.priority, IssuePriority::Medium);
    assert!(issue.assignee_id.is_none());
    assert!(issue.resolved_at.is_none());
    assert!(issue.closed_at.is_none());
    assert!(issue.deleted_at.is_none());
}

#[test]
fn create_validates_title_and_description() {
    let mut req = issue_request();
    req.title = "too short".to_string();
    let err = Issue::create(&req, Uuid::new_v4(), Utc::now()).unwrap_err();
    assert!(matches!(err, PortalError::Validation(ref m) if m.contains("title")));

    let mut req = issue_request();
    req.description = "brief".to_string();
    let err = Issue::create(&req, Uuid::new_v4(), Utc::now()).unwrap_err();
    assert!(matches!(err, PortalError::Validation(ref m) if m.contains("description")));
}

#[test]
fn status_walks_forward_and_stamps_timestamps() {
    let mut issue = open_issue();
    let now = Utc::now();

    issue.transition(IssueStatus::InProgress, now).unwrap();
    assert_eq!(issue.status, IssueStatus::InProgress);
    assert!(issue.resolved_at.is_none());

    issue.transition(IssueStatus::Resolved, now).unwrap();
    assert_eq!(issue.status, IssueStatus::Resolved);
    assert!(issue.resolved_at.is_some());

    issue.transition(IssueStatus::Closed, now).unwrap();
    assert_eq!(issue.status, IssueStatus::Closed);
    assert!(issue.closed_at.is_some());
}

#[test]
fn every_other_status_pair_is_rejected() {
    let legal = [
        (IssueStatus::Open, IssueStatus::InProgress),
        (IssueStatus::InProgress, IssueStatus::Resolved),
        (IssueStatus::Resolved, IssueStatus::Closed),
    ];

    for from in ALL_STATUSES {
        for to in ALL_STATUSES {
            if legal.contains(&(from, to)) {
                continue;
            }
            let mut issue = open_issue();
            issue.status = from;
            let err = issue.transition(to, Utc::now()).unwrap_err();
            match err {
                PortalError::InvalidTransition { from: f, to: t } => {
                    assert_eq!((f, t), (from, to));
                }
                other => panic!("{from} -> {to}: expected InvalidTransition, got {other:?}"),
            }
            // A failed transition must not move the status.
            assert_eq!(issue.status, from);
        }
    }
}

#[test]
fn deleted_issue_refuses_transitions() {
    let mut issue = open_issue();
    issue.soft_delete(Utc::now()).unwrap();
    let err = issue.transition(IssueStatus::InProgress, Utc::now()).unwrap_err();
    assert!(matches!(err, PortalError::IssueDeleted));
}

#[test]
fn partial_update_touches_only_supplied_fields() {
    let mut issue = open_issue();
    let original_description = issue.description.clone();

    issue
        .apply_update(
            &UpdateIssueRequest {
                title: Some("Streetlight completely dead now".to_string()),
                priority: Some(IssuePriority::High),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();

    assert_eq!(issue.title, "Streetlight completely dead now");
    assert_eq!(issue.priority, IssuePriority::High);
    assert_eq!(issue.description, original_description);
}

#[test]
fn update_revalidates_supplied_fields() {
    let mut issue = open_issue();
    let err = issue
        .apply_update(
            &UpdateIssueRequest {
                title: Some("short".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
}

#[test]
fn closed_issue_locks_edits_and_assignment() {
    let mut issue = open_issue();
    issue.status = IssueStatus::Closed;

    let edit = issue.apply_update(
        &UpdateIssueRequest {
            title: Some("A new, perfectly valid title".to_string()),
            ..Default::default()
        },
        Utc::now(),
    );
    assert!(matches!(edit, Err(PortalError::IssueLocked)));

    let staff = account_with_role(Role::Staff);
    let assign = issue.set_assignee(Some(&staff), Utc::now());
    assert!(matches!(assign, Err(PortalError::IssueLocked)));
}

#[test]
fn deleted_issue_blocks_edits() {
    let mut issue = open_issue();
    issue.soft_delete(Utc::now()).unwrap();
    let err = issue
        .apply_update(
            &UpdateIssueRequest {
                location: Some("somewhere else".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap_err();
    assert!(matches!(err, PortalError::IssueDeleted));
}

#[test]
fn assignee_must_be_staff() {
    let mut issue = open_issue();

    let citizen = account_with_role(Role::Citizen);
    let err = issue.set_assignee(Some(&citizen), Utc::now()).unwrap_err();
    assert!(matches!(err, PortalError::InvalidAssignee));

    let admin = account_with_role(Role::Admin);
    let err = issue.set_assignee(Some(&admin), Utc::now()).unwrap_err();
    assert!(matches!(err, PortalError::InvalidAssignee));

    let staff = account_with_role(Role::Staff);
    issue.set_assignee(Some(&staff), Utc::now()).unwrap();
    assert_eq!(issue.assignee_id, Some(staff.id));

    issue.set_assignee(None, Utc::now()).unwrap();
    assert!(issue.assignee_id.is_none());
}

#[test]
fn soft_delete_and_restore_guard_their_states() {
    let mut issue = open_issue();

    // Restore before delete is rejected.
    let err = issue.restore(Utc::now()).unwrap_err();
    assert!(matches!(err, PortalError::NotDeleted));

    issue.soft_delete(Utc::now()).unwrap();
    assert!(issue.is_deleted());

    // Double delete is rejected.
    let err = issue.soft_delete(Utc::now()).unwrap_err();
    assert!(matches!(err, PortalError::AlreadyDeleted));

    issue.restore(Utc::now()).unwrap();
    assert!(!issue.is_deleted());
}

#[test]
fn delete_then_restore_preserves_every_other_field() {
    let mut issue = open_issue();
    issue.transition(IssueStatus::InProgress, Utc::now()).unwrap();
    issue.transition(IssueStatus::Resolved, Utc::now()).unwrap();
    let before = issue.clone();

    issue.soft_delete(Utc::now()).unwrap();
    // Deletion leaves status and resolution untouched.
    assert_eq!(issue.status, before.status);
    assert_eq!(issue.resolved_at, before.resolved_at);

    issue.restore(Utc::now()).unwrap();
    assert_eq!(issue.deleted_at, None);
    // Everything but updated_at is back to the pre-delete state.
    let mut restored = issue.clone();
    restored.updated_at = before.updated_at;
    assert_eq!(restored, before);
}
