//! Project status and progress rules.

use crate::error::CoreError;
use crate::types::Timestamp;

define_name_enum! {
    ProjectStatus("project status") {
        Planning = "planning",
        Active = "active",
        OnHold = "on_hold",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Planning
    }
}

/// `round(completed / total * 100)`, 0 when there are no tasks.
pub fn compute_progress(total_tasks: i64, completed_tasks: i64) -> i64 {
    if total_tasks <= 0 {
        return 0;
    }
    // Half-up rounding; widened so any i64 counts fit.
    let (total, completed) = (i128::from(total_tasks), i128::from(completed_tasks));
    let rounded = (completed * 200 + total) / (2 * total);
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

pub fn validate_counts(total_tasks: i64, completed_tasks: i64) -> Result<(), CoreError> {
    if total_tasks < 0 || completed_tasks < 0 {
        return Err(CoreError::Validation(
            "Task counts cannot be negative".to_string(),
        ));
    }
    if completed_tasks > total_tasks {
        return Err(CoreError::Validation(
            "Completed tasks cannot exceed total tasks".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_schedule(start_date: Timestamp, deadline: Timestamp) -> Result<(), CoreError> {
    if deadline < start_date {
        return Err(CoreError::Validation(
            "Deadline cannot precede start date".to_string(),
        ));
    }
    Ok(())
}

/// Persisted progress-related fields of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub status: ProjectStatus,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub progress: i64,
}

/// The progress-related fields an update may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub status: Option<ProjectStatus>,
    pub total_tasks: Option<i64>,
    pub completed_tasks: Option<i64>,
}

/// Merge an update into the current state and recompute derived fields.
///
/// When either count is present the progress is recomputed from the merged
/// counts, and reaching 100 forces `completed` over any explicit status.
/// Without counts an explicit status is applied as given.
pub fn apply_progress_update(
    current: ProgressState,
    update: ProgressUpdate,
) -> Result<ProgressState, CoreError> {
    let mut next = current;
    if let Some(status) = update.status {
        next.status = status;
    }

    if update.total_tasks.is_none() && update.completed_tasks.is_none() {
        return Ok(next);
    }

    next.total_tasks = update.total_tasks.unwrap_or(current.total_tasks);
    next.completed_tasks = update.completed_tasks.unwrap_or(current.completed_tasks);
    validate_counts(next.total_tasks, next.completed_tasks)?;

    next.progress = compute_progress(next.total_tasks, next.completed_tasks);
    if next.progress >= 100 {
        next.status = ProjectStatus::Completed;
    }
    Ok(next)
}
