//! Handlers shared by the `/tasks` and `/assignments` resources.
//!
//! Both resources are the same work item model; the router injects the
//! [`WorkItemKind`] as an extension so every handler and query stays pinned
//! to one kind.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use portal_core::error::CoreError;
use portal_core::policy::{scope_filter, Action};
use portal_core::query::{user_filters, PageRequest};
use portal_core::stats::WorkItemStats;
use portal_core::types::{DbId, Timestamp};
use portal_core::work_item::{apply_status_change, Priority, WorkItemKind, WorkStatus};
use portal_db::models::work_item::{Comment, CreateWorkItem, UpdateWorkItem, WorkItem};
use portal_db::repositories::{CommentRepo, ProjectRepo, UserRepo, WorkItemRepo};
use portal_db::DbPool;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_found;
use crate::error::{AppError, AppResult};
use crate::extract::{nullable, ValidJson};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{ensure, ensure_work_item_fields};
use crate::response::{ItemResponse, ListResponse, MessageResponse, StatsResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /tasks` and `POST /assignments`.
///
/// The assigner is always the caller; status always starts at `pending`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkItemRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    pub assigned_to: DbId,
    pub department: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Timestamp,
    /// Linked project id (tasks only).
    pub project: Option<DbId>,
}

/// Request body for `PUT /tasks/{id}` and `PUT /assignments/{id}`.
///
/// `assignedTo` / `assignedBy` are accepted only so their presence can be
/// rejected explicitly.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkItemRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    /// `null` clears the department.
    #[serde(default, deserialize_with = "nullable")]
    pub department: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<WorkStatus>,
    pub due_date: Option<Timestamp>,
    /// `null` unlinks the project.
    #[serde(default, deserialize_with = "nullable")]
    pub project: Option<Option<DbId>>,
    pub assigned_to: Option<serde_json::Value>,
    pub assigned_by: Option<serde_json::Value>,
}

impl UpdateWorkItemRequest {
    /// Wire names of the fields this update touches.
    fn touched_fields(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("description", self.description.is_some()),
            ("department", self.department.is_some()),
            ("priority", self.priority.is_some()),
            ("status", self.status.is_some()),
            ("dueDate", self.due_date.is_some()),
            ("project", self.project.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

/// Request body for `POST /assignments/{id}/comments`.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"))]
    pub text: String,
}

/// A work item as returned by the API, with derived fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemView {
    #[serde(flatten)]
    pub item: WorkItem,
    pub is_overdue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl WorkItemView {
    pub fn new(item: WorkItem, now: Timestamp) -> Self {
        Self {
            is_overdue: item.is_overdue(now),
            item,
            comments: None,
        }
    }

    fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = Some(comments);
        self
    }
}

/// `{ success, comments }` after appending a comment.
#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub success: bool,
    pub comments: Vec<Comment>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/{tasks|assignments}?page&limit&status&priority&department
///
/// Employees only ever see items assigned to them.
pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    auth: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ListResponse<WorkItemView>>> {
    let resource_kind = kind.resource_kind();
    ensure(Some(&auth.actor), Action::List, resource_kind, None)?;

    let now = Utc::now();
    let filter = scope_filter(Some(&auth.actor), resource_kind, now)
        .and_also(user_filters(resource_kind, &params));
    let page =
        WorkItemRepo::list(&state.pool, kind, &filter, &PageRequest::from_params(&params)).await?;

    Ok(Json(page.map(|item| WorkItemView::new(item, now)).into()))
}

/// GET /api/v1/{tasks|assignments}/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    auth: AuthUser,
) -> AppResult<Json<StatsResponse<WorkItemStats>>> {
    let resource_kind = kind.resource_kind();
    ensure(Some(&auth.actor), Action::Stats, resource_kind, None)?;

    let now = Utc::now();
    let scope = scope_filter(Some(&auth.actor), resource_kind, now);
    let stats = WorkItemRepo::stats(&state.pool, kind, &scope, now).await?;
    Ok(Json(StatsResponse::new(stats)))
}

/// GET /api/v1/{tasks|assignments}/{id}
///
/// Assignments include their comment thread.
pub async fn get(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ItemResponse<WorkItemView>>> {
    let resource_kind = kind.resource_kind();
    ensure(Some(&auth.actor), Action::Read, resource_kind, None)?;

    let item = WorkItemRepo::find_by_id(&state.pool, kind, id)
        .await?
        .ok_or(not_found(resource_kind, id))?;
    ensure(Some(&auth.actor), Action::Read, resource_kind, Some(&item.resource()))?;

    let mut view = WorkItemView::new(item, Utc::now());
    if kind.supports_comments() {
        let comments = CommentRepo::list_for_assignment(&state.pool, id).await?;
        view = view.with_comments(comments);
    }

    Ok(Json(ItemResponse::new(view)))
}

/// POST /api/v1/{tasks|assignments}
pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateWorkItemRequest>,
) -> AppResult<(StatusCode, Json<ItemResponse<WorkItemView>>)> {
    let resource_kind = kind.resource_kind();
    ensure(Some(&auth.actor), Action::Create, resource_kind, None)?;

    ensure_active_assignee(&state.pool, input.assigned_to).await?;
    if let Some(project_id) = input.project {
        ensure_linkable_project(&state.pool, kind, project_id).await?;
    }

    let item = WorkItemRepo::create(
        &state.pool,
        &CreateWorkItem {
            kind,
            title: input.title.trim().to_string(),
            description: input.description,
            assigned_to: input.assigned_to,
            assigned_by: auth.actor.id,
            department: input.department,
            priority: input.priority,
            due_date: input.due_date,
            project_id: input.project,
        },
    )
    .await?;

    tracing::info!(
        kind = %kind,
        id = item.id,
        assigned_to = item.assigned_to,
        assigned_by = item.assigned_by,
        "Work item created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse::new(WorkItemView::new(item, Utc::now()))),
    ))
}

/// PUT /api/v1/{tasks|assignments}/{id}
///
/// Employees may update only their own items, and only status, priority,
/// due date and description. The assignee and assigner never change here.
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateWorkItemRequest>,
) -> AppResult<Json<ItemResponse<WorkItemView>>> {
    let resource_kind = kind.resource_kind();
    ensure(Some(&auth.actor), Action::Update, resource_kind, None)?;

    if input.assigned_to.is_some() || input.assigned_by.is_some() {
        return Err(AppError::Core(CoreError::Validation(
            "assignedTo and assignedBy cannot be changed".into(),
        )));
    }

    let existing = WorkItemRepo::find_by_id(&state.pool, kind, id)
        .await?
        .ok_or(not_found(resource_kind, id))?;
    ensure(
        Some(&auth.actor),
        Action::Update,
        resource_kind,
        Some(&existing.resource()),
    )?;
    ensure_work_item_fields(&auth.actor, resource_kind, input.touched_fields())?;

    if let Some(Some(project_id)) = input.project {
        ensure_linkable_project(&state.pool, kind, project_id).await?;
    }

    let now = Utc::now();
    let outcome = apply_status_change(existing.status(), existing.completed_date, input.status, now)?;

    let update = UpdateWorkItem {
        title: input.title.map(|t| t.trim().to_string()),
        description: input.description,
        department: input
            .department
            .map(|d| d.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())),
        priority: input.priority,
        due_date: input.due_date,
        project_id: input.project,
        status: outcome.status,
        completed_date: outcome.completed_date,
    };

    let item = WorkItemRepo::update(&state.pool, kind, id, &update)
        .await?
        .ok_or(not_found(resource_kind, id))?;

    if item.status != existing.status {
        tracing::info!(
            kind = %kind,
            id,
            from = %existing.status,
            to = %item.status,
            user_id = auth.actor.id,
            "Work item status changed"
        );
    }

    Ok(Json(ItemResponse::new(WorkItemView::new(item, now))))
}

/// DELETE /api/v1/{tasks|assignments}/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let resource_kind = kind.resource_kind();
    ensure(Some(&auth.actor), Action::Delete, resource_kind, None)?;

    if !WorkItemRepo::delete(&state.pool, kind, id).await? {
        return Err(not_found(resource_kind, id));
    }

    tracing::info!(kind = %kind, id, deleted_by = auth.actor.id, "Work item deleted");
    Ok(Json(MessageResponse::new(format!(
        "{} deleted successfully",
        resource_kind.entity_name()
    ))))
}

/// POST /api/v1/assignments/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(kind): Extension<WorkItemKind>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<CommentRequest>,
) -> AppResult<Json<CommentsResponse>> {
    let resource_kind = kind.resource_kind();
    if !kind.supports_comments() {
        return Err(AppError::BadRequest(format!(
            "Comments are not supported on {}s",
            resource_kind.label()
        )));
    }
    ensure(Some(&auth.actor), Action::Comment, resource_kind, None)?;

    let item = WorkItemRepo::find_by_id(&state.pool, kind, id)
        .await?
        .ok_or(not_found(resource_kind, id))?;
    ensure(Some(&auth.actor), Action::Comment, resource_kind, Some(&item.resource()))?;

    let text = input.text.trim();
    if text.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Comment text is required".into(),
        )));
    }

    if !CommentRepo::append(&state.pool, id, auth.actor.id, text, Utc::now()).await? {
        return Err(not_found(resource_kind, id));
    }

    let comments = CommentRepo::list_for_assignment(&state.pool, id).await?;
    Ok(Json(CommentsResponse {
        success: true,
        comments,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_active_assignee(pool: &DbPool, user_id: DbId) -> AppResult<()> {
    match UserRepo::find_by_id(pool, user_id).await? {
        Some(user) if user.is_active => Ok(()),
        Some(_) => Err(AppError::Core(CoreError::Validation(format!(
            "Assignee {user_id} is deactivated"
        )))),
        None => Err(AppError::Core(CoreError::Validation(format!(
            "Assignee {user_id} does not exist"
        )))),
    }
}

async fn ensure_linkable_project(pool: &DbPool, kind: WorkItemKind, project_id: DbId) -> AppResult<()> {
    if !kind.supports_project() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "A {kind} cannot be linked to a project"
        ))));
    }
    if !ProjectRepo::exists(pool, project_id).await? {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Project {project_id} does not exist"
        ))));
    }
    Ok(())
}
