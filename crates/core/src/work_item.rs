//! Tasks and assignments: one work item model split by [`WorkItemKind`].
//!
//! Holds the status machine and the derived-field rules (completion date,
//! overdue flag). Persistence and orchestration live in the db and api crates.

use crate::error::CoreError;
use crate::policy::ResourceKind;
use crate::query::Predicate;
use crate::types::Timestamp;

define_name_enum! {
    /// Discriminator stored in the `kind` column.
    WorkItemKind("work item kind") {
        Task = "task",
        Assignment = "assignment",
    }
}

impl WorkItemKind {
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            WorkItemKind::Task => ResourceKind::Task,
            WorkItemKind::Assignment => ResourceKind::Assignment,
        }
    }

    /// Only tasks may link to a project.
    pub fn supports_project(self) -> bool {
        matches!(self, WorkItemKind::Task)
    }

    /// Only assignments carry a comment thread.
    pub fn supports_comments(self) -> bool {
        matches!(self, WorkItemKind::Assignment)
    }
}

define_name_enum! {
    /// Priority shared by work items and projects.
    Priority("priority") {
        Low = "low",
        Medium = "medium",
        High = "high",
        Urgent = "urgent",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

define_name_enum! {
    WorkStatus("status") {
        Pending = "pending",
        InProgress = "in_progress",
        Review = "review",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

impl WorkStatus {
    /// Statuses that still count towards overdue.
    pub const OPEN: &'static [WorkStatus] =
        &[WorkStatus::Pending, WorkStatus::InProgress, WorkStatus::Review];

    pub fn is_open(self) -> bool {
        Self::OPEN.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WorkStatus::Cancelled)
    }
}

impl Default for WorkStatus {
    fn default() -> Self {
        WorkStatus::Pending
    }
}

/// Whether a work item may move from `from` to `to`.
///
/// The four pipeline states connect freely in both directions, `cancelled`
/// is reachable from any open state and nothing leaves it.
pub fn can_transition(from: WorkStatus, to: WorkStatus) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (WorkStatus::Cancelled, _) => false,
        (_, WorkStatus::Cancelled) => from.is_open(),
        _ => true,
    }
}

pub fn validate_transition(from: WorkStatus, to: WorkStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "Cannot change status from '{from}' to '{to}'"
        )))
    }
}

/// Status and completion date to persist after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOutcome {
    pub status: WorkStatus,
    pub completed_date: Option<Timestamp>,
}

/// Apply an optional status change to the current state.
///
/// Entering `completed` stamps `now`, staying there keeps the original
/// stamp, leaving it clears the stamp.
pub fn apply_status_change(
    current: WorkStatus,
    completed_date: Option<Timestamp>,
    requested: Option<WorkStatus>,
    now: Timestamp,
) -> Result<StatusOutcome, CoreError> {
    let next = requested.unwrap_or(current);
    validate_transition(current, next)?;

    let completed_date = match (current, next) {
        (WorkStatus::Completed, WorkStatus::Completed) => completed_date.or(Some(now)),
        (_, WorkStatus::Completed) => Some(now),
        _ => None,
    };

    Ok(StatusOutcome {
        status: next,
        completed_date,
    })
}

/// Not finished, not cancelled and past its due date.
pub fn is_overdue(status: WorkStatus, due_date: Timestamp, now: Timestamp) -> bool {
    status.is_open() && due_date < now
}

/// Store-side equivalent of [`is_overdue`].
pub fn overdue_predicate(now: Timestamp) -> Predicate {
    Predicate::and([
        Predicate::or(
            WorkStatus::OPEN
                .iter()
                .map(|s| Predicate::eq("status", s.name())),
        ),
        Predicate::lt("due_date", now),
    ])
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn test_pipeline_moves_both_ways() {
        assert!(can_transition(WorkStatus::Pending, WorkStatus::InProgress));
        assert!(can_transition(WorkStatus::Review, WorkStatus::InProgress));
        assert!(can_transition(WorkStatus::Completed, WorkStatus::Review));
        assert!(can_transition(WorkStatus::Pending, WorkStatus::Completed));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        assert!(can_transition(WorkStatus::Review, WorkStatus::Cancelled));
        assert!(!can_transition(WorkStatus::Completed, WorkStatus::Cancelled));
        assert!(!can_transition(WorkStatus::Cancelled, WorkStatus::Pending));
        assert!(can_transition(WorkStatus::Cancelled, WorkStatus::Cancelled));

        let err = validate_transition(WorkStatus::Cancelled, WorkStatus::Review).unwrap_err();
        assert_matches!(err, CoreError::InvalidState(_));
    }

    #[test]
    fn test_completion_stamps_date() {
        let now = Utc::now();
        let out =
            apply_status_change(WorkStatus::Review, None, Some(WorkStatus::Completed), now)
                .unwrap();
        assert_eq!(out.status, WorkStatus::Completed);
        assert_eq!(out.completed_date, Some(now));
    }

    #[test]
    fn test_staying_completed_keeps_date() {
        let earlier = Utc::now() - Duration::days(3);
        let now = Utc::now();
        let out = apply_status_change(
            WorkStatus::Completed,
            Some(earlier),
            Some(WorkStatus::Completed),
            now,
        )
        .unwrap();
        assert_eq!(out.completed_date, Some(earlier));

        let untouched =
            apply_status_change(WorkStatus::Completed, Some(earlier), None, now).unwrap();
        assert_eq!(untouched.completed_date, Some(earlier));
    }

    #[test]
    fn test_leaving_completed_clears_date() {
        let earlier = Utc::now() - Duration::days(1);
        let out = apply_status_change(
            WorkStatus::Completed,
            Some(earlier),
            Some(WorkStatus::InProgress),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(out.status, WorkStatus::InProgress);
        assert_eq!(out.completed_date, None);
    }

    #[test]
    fn test_overdue_only_for_open_items() {
        let now = Utc::now();
        let past = now - Duration::hours(1);
        let future = now + Duration::hours(1);
        assert!(is_overdue(WorkStatus::Pending, past, now));
        assert!(!is_overdue(WorkStatus::Pending, future, now));
        assert!(!is_overdue(WorkStatus::Completed, past, now));
        assert!(!is_overdue(WorkStatus::Cancelled, past, now));
    }

    #[test]
    fn test_overdue_predicate_shape() {
        let now = Utc::now();
        assert_matches!(
            overdue_predicate(now),
            Predicate::And(ref parts) if parts.len() == 2
        );
    }

    #[test]
    fn test_kind_capabilities() {
        assert!(WorkItemKind::Task.supports_project());
        assert!(!WorkItemKind::Task.supports_comments());
        assert!(WorkItemKind::Assignment.supports_comments());
        assert_eq!(WorkItemKind::Assignment.resource_kind(), ResourceKind::Assignment);
        assert_eq!(WorkStatus::from_name("in_progress").unwrap(), WorkStatus::InProgress);
    }
}
