//! Task / assignment row model, DTOs and comments.

use portal_core::policy::Resource;
use portal_core::types::{DbId, Timestamp};
use portal_core::work_item::{self, Priority, WorkItemKind, WorkStatus};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `work_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: DbId,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub assigned_to: DbId,
    pub assigned_by: DbId,
    pub department: Option<String>,
    pub priority: String,
    pub status: String,
    pub due_date: Timestamp,
    pub completed_date: Option<Timestamp>,
    #[serde(rename = "project")]
    pub project_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkItem {
    pub fn kind(&self) -> WorkItemKind {
        WorkItemKind::from_name(&self.kind).unwrap_or(WorkItemKind::Task)
    }

    pub fn status(&self) -> WorkStatus {
        WorkStatus::from_name(&self.status).unwrap_or_default()
    }

    pub fn priority(&self) -> Priority {
        Priority::from_name(&self.priority).unwrap_or_default()
    }

    pub fn is_overdue(&self, now: Timestamp) -> bool {
        work_item::is_overdue(self.status(), self.due_date, now)
    }

    pub fn resource(&self) -> Resource {
        Resource::WorkItem {
            assigned_to: self.assigned_to,
            assigned_by: self.assigned_by,
        }
    }
}

/// DTO for creating a work item. Status always starts at `pending`.
#[derive(Debug, Clone)]
pub struct CreateWorkItem {
    pub kind: WorkItemKind,
    pub title: String,
    pub description: String,
    pub assigned_to: DbId,
    pub assigned_by: DbId,
    pub department: Option<String>,
    pub priority: Priority,
    pub due_date: Timestamp,
    pub project_id: Option<DbId>,
}

/// DTO for updating a work item.
///
/// `status` and `completed_date` are always written: they are resolved by
/// [`work_item::apply_status_change`] before the update is issued.
#[derive(Debug, Clone)]
pub struct UpdateWorkItem {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the department.
    pub department: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Timestamp>,
    /// `Some(None)` unlinks the project.
    pub project_id: Option<Option<DbId>>,
    pub status: WorkStatus,
    pub completed_date: Option<Timestamp>,
}

/// A comment on an assignment, joined with its author's name.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: DbId,
    #[serde(skip)]
    pub work_item_id: DbId,
    #[serde(rename = "user")]
    pub user_id: DbId,
    pub user_name: Option<String>,
    pub text: String,
    pub created_at: Timestamp,
}
