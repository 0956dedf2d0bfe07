//! Project entity model and DTOs.

use portal_core::policy::Resource;
use portal_core::project::{ProgressState, ProjectStatus};
use portal_core::types::{DbId, Timestamp};
use portal_core::work_item::Priority;
use serde::Serialize;
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: DbId,
    pub project_name: String,
    pub description: String,
    pub department: String,
    pub start_date: Timestamp,
    pub deadline: Timestamp,
    pub status: String,
    pub priority: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub progress: i64,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn status(&self) -> ProjectStatus {
        ProjectStatus::from_name(&self.status).unwrap_or_default()
    }

    pub fn priority(&self) -> Priority {
        Priority::from_name(&self.priority).unwrap_or_default()
    }

    pub fn progress_state(&self) -> ProgressState {
        ProgressState {
            status: self.status(),
            total_tasks: self.total_tasks,
            completed_tasks: self.completed_tasks,
            progress: self.progress,
        }
    }

    pub fn resource(&self) -> Resource {
        Resource::Project {
            created_by: self.created_by,
        }
    }
}

/// DTO for creating a new project. Status always starts at `planning`.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub project_name: String,
    pub description: String,
    pub department: String,
    pub start_date: Timestamp,
    pub deadline: Timestamp,
    pub priority: Priority,
    pub created_by: DbId,
}

/// DTO for updating a project.
///
/// The progress fields are always written, already merged and recomputed by
/// [`portal_core::project::apply_progress_update`].
#[derive(Debug, Clone)]
pub struct UpdateProject {
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub start_date: Option<Timestamp>,
    pub deadline: Option<Timestamp>,
    pub priority: Option<Priority>,
    pub progress: ProgressState,
}
