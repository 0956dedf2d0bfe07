//! Handlers for the `/projects` resource.
//!
//! Projects are admin-only. Progress is derived: whenever an update carries
//! task counts, the progress percentage is recomputed and reaching 100 moves
//! the project to `completed`.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::error::CoreError;
use portal_core::policy::{scope_filter, Action, ResourceKind};
use portal_core::project::{
    apply_progress_update, validate_schedule, ProgressUpdate, ProjectStatus,
};
use portal_core::query::{user_filters, Page, PageRequest};
use portal_core::roles::Role;
use portal_core::stats::ProjectStats;
use portal_core::types::{DbId, Timestamp};
use portal_core::work_item::Priority;
use portal_db::models::project::{CreateProject, Project, UpdateProject};
use portal_db::models::user::UserSummary;
use portal_db::repositories::{ProjectRepo, UserRepo, WorkItemRepo};
use portal_db::DbPool;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_found;
use super::work_item::WorkItemView;
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::ensure;
use crate::response::{ItemResponse, ListResponse, MessageResponse, StatsResponse};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Project;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /projects`. Status always starts at `planning`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub project_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "is required"))]
    pub department: String,
    /// Defaults to now.
    pub start_date: Option<Timestamp>,
    pub deadline: Timestamp,
    #[serde(default)]
    pub priority: Priority,
}

/// Request body for `PUT /projects/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub project_name: Option<String>,
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub department: Option<String>,
    pub start_date: Option<Timestamp>,
    pub deadline: Option<Timestamp>,
    pub priority: Option<Priority>,
    pub status: Option<ProjectStatus>,
    pub total_tasks: Option<i64>,
    pub completed_tasks: Option<i64>,
}

/// Request body for `PUT /projects/{id}/assign`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignEmployeesRequest {
    pub employee_ids: Vec<DbId>,
}

/// A project with its roster and, on the detail route, its linked tasks.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub assigned_employees: Vec<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<WorkItemView>>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/projects?page&limit&status&priority&department
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ListResponse<ProjectView>>> {
    ensure(Some(&auth.actor), Action::List, KIND, None)?;

    let filter =
        scope_filter(Some(&auth.actor), KIND, Utc::now()).and_also(user_filters(KIND, &params));
    let Page {
        items,
        total,
        total_pages,
        current_page,
    } = ProjectRepo::list(&state.pool, &filter, &PageRequest::from_params(&params)).await?;

    let mut views = Vec::with_capacity(items.len());
    for project in items {
        views.push(project_view(&state.pool, project).await?);
    }

    let page = Page {
        items: views,
        total,
        total_pages,
        current_page,
    };
    Ok(Json(page.into()))
}

/// GET /api/v1/projects/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<StatsResponse<ProjectStats>>> {
    ensure(Some(&auth.actor), Action::Stats, KIND, None)?;

    let scope = scope_filter(Some(&auth.actor), KIND, Utc::now());
    let stats = ProjectRepo::stats(&state.pool, &scope).await?;
    Ok(Json(StatsResponse::new(stats)))
}

/// GET /api/v1/projects/{id}
///
/// Includes the assigned employees and every linked task.
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ItemResponse<ProjectView>>> {
    ensure(Some(&auth.actor), Action::Read, KIND, None)?;

    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Read, KIND, Some(&project.resource()))?;

    let now = Utc::now();
    let tasks = WorkItemRepo::list_for_project(&state.pool, id)
        .await?
        .into_iter()
        .map(|task| WorkItemView::new(task, now))
        .collect();

    let mut view = project_view(&state.pool, project).await?;
    view.tasks = Some(tasks);
    Ok(Json(ItemResponse::new(view)))
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<ItemResponse<ProjectView>>)> {
    ensure(Some(&auth.actor), Action::Create, KIND, None)?;

    let start_date = input.start_date.unwrap_or_else(Utc::now);
    validate_schedule(start_date, input.deadline)?;

    let project = ProjectRepo::create(
        &state.pool,
        &CreateProject {
            project_name: input.project_name.trim().to_string(),
            description: input.description,
            department: input.department.trim().to_string(),
            start_date,
            deadline: input.deadline,
            priority: input.priority,
            created_by: auth.actor.id,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, created_by = auth.actor.id, "Project created");

    let view = project_view(&state.pool, project).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::new(view))))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateProjectRequest>,
) -> AppResult<Json<ItemResponse<ProjectView>>> {
    ensure(Some(&auth.actor), Action::Update, KIND, None)?;

    let existing = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Update, KIND, Some(&existing.resource()))?;

    validate_schedule(
        input.start_date.unwrap_or(existing.start_date),
        input.deadline.unwrap_or(existing.deadline),
    )?;

    let progress = apply_progress_update(
        existing.progress_state(),
        ProgressUpdate {
            status: input.status,
            total_tasks: input.total_tasks,
            completed_tasks: input.completed_tasks,
        },
    )?;

    let update = UpdateProject {
        project_name: input.project_name.map(|n| n.trim().to_string()),
        description: input.description,
        department: input.department.map(|d| d.trim().to_string()),
        start_date: input.start_date,
        deadline: input.deadline,
        priority: input.priority,
        progress,
    };

    let project = ProjectRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(not_found(KIND, id))?;

    if project.status != existing.status {
        tracing::info!(
            project_id = id,
            from = %existing.status,
            to = %project.status,
            progress = project.progress,
            "Project status changed"
        );
    }

    let view = project_view(&state.pool, project).await?;
    Ok(Json(ItemResponse::new(view)))
}

/// DELETE /api/v1/projects/{id}
///
/// Rejected while any task still links to the project.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    ensure(Some(&auth.actor), Action::Delete, KIND, None)?;

    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Delete, KIND, Some(&project.resource()))?;

    let linked = WorkItemRepo::count_for_project(&state.pool, id).await?;
    if linked > 0 {
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "Cannot delete project with {linked} linked task(s)"
        ))));
    }

    if !ProjectRepo::delete(&state.pool, id).await? {
        return Err(not_found(KIND, id));
    }

    tracing::info!(project_id = id, deleted_by = auth.actor.id, "Project deleted");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

/// PUT /api/v1/projects/{id}/assign
///
/// Replace the project roster. Every id must be an existing employee or admin.
pub async fn assign_employees(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<AssignEmployeesRequest>,
) -> AppResult<Json<ItemResponse<ProjectView>>> {
    ensure(Some(&auth.actor), Action::Update, KIND, None)?;

    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Update, KIND, Some(&project.resource()))?;

    let mut employee_ids = input.employee_ids;
    employee_ids.sort_unstable();
    employee_ids.dedup();

    let found = UserRepo::find_summaries(&state.pool, &employee_ids).await?;
    if let Some(missing) = employee_ids
        .iter()
        .find(|wanted| !found.iter().any(|u| u.id == **wanted))
    {
        return Err(AppError::Core(CoreError::Validation(format!(
            "User {missing} does not exist"
        ))));
    }
    if let Some(user) = found.iter().find(|u| {
        !Role::from_name(&u.role)
            .map(Role::can_join_projects)
            .unwrap_or(false)
    }) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "User {} is not an employee or admin",
            user.id
        ))));
    }

    ProjectRepo::set_employees(&state.pool, id, &employee_ids).await?;
    tracing::info!(project_id = id, count = employee_ids.len(), "Project roster replaced");

    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    let view = project_view(&state.pool, project).await?;
    Ok(Json(ItemResponse::new(view)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn project_view(pool: &DbPool, project: Project) -> AppResult<ProjectView> {
    let ids = ProjectRepo::employee_ids(pool, project.id).await?;
    let assigned_employees = UserRepo::find_summaries(pool, &ids).await?;
    Ok(ProjectView {
        project,
        assigned_employees,
        tasks: None,
    })
}
