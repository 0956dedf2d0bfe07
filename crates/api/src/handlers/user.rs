//! Handlers for the `/users` resource (account administration).
//!
//! Only superadmins and admins pass the policy here; employees and public
//! users get 403 on every route.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::error::CoreError;
use portal_core::policy::{scope_filter, Action, ResourceKind};
use portal_core::query::{user_filters, PageRequest};
use portal_core::roles::Role;
use portal_core::stats::UserStats;
use portal_core::types::DbId;
use portal_core::user::{clean_optional, normalize_email, validate_password};
use portal_db::models::user::{CreateUser, UpdateUser, UserResponse, UserSummary};
use portal_db::repositories::UserRepo;
use serde::Deserialize;
use validator::Validate;

use super::not_found;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{ensure, ensure_user_fields};
use crate::response::{
    CollectionResponse, ItemResponse, ListResponse, MessageResponse, StatsResponse,
};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::User;

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, message = "is required"))]
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 500, message = "cannot exceed 500 characters"))]
    pub bio: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Request body for `PUT /users/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    pub role: Option<Role>,
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 500, message = "cannot exceed 500 characters"))]
    pub bio: Option<String>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/users?page&limit&role&department&isActive
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ListResponse<UserResponse>>> {
    ensure(Some(&auth.actor), Action::List, KIND, None)?;

    let filter =
        scope_filter(Some(&auth.actor), KIND, Utc::now()).and_also(user_filters(KIND, &params));
    let page = UserRepo::list(&state.pool, &filter, &PageRequest::from_params(&params)).await?;

    Ok(Json(page.map(UserResponse::from).into()))
}

/// GET /api/v1/users/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<StatsResponse<UserStats>>> {
    ensure(Some(&auth.actor), Action::Stats, KIND, None)?;

    let scope = scope_filter(Some(&auth.actor), KIND, Utc::now());
    let stats = UserRepo::stats(&state.pool, &scope).await?;
    Ok(Json(StatsResponse::new(stats)))
}

/// GET /api/v1/users/{id}
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ItemResponse<UserResponse>>> {
    ensure(Some(&auth.actor), Action::Read, KIND, None)?;

    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Read, KIND, Some(&user.resource()))?;

    Ok(Json(ItemResponse::new(user.into())))
}

/// POST /api/v1/users
///
/// Create an account with any role. Email, username and employee id must be
/// unused.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<ItemResponse<UserResponse>>)> {
    ensure(Some(&auth.actor), Action::Create, KIND, None)?;
    validate_password(&input.password)?;

    let email = normalize_email(&input.email);
    let username = input.username.trim().to_string();
    let employee_id = clean_optional(input.employee_id.as_deref());

    let taken = UserRepo::identity_taken(
        &state.pool,
        Some(&email),
        Some(&username),
        employee_id.as_deref(),
        None,
    )
    .await?;
    if taken {
        return Err(AppError::Core(CoreError::Conflict(
            "User already exists with this email, username or employee ID".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email,
            password_hash,
            role: input.role,
            full_name: input.full_name.trim().to_string(),
            department: clean_optional(input.department.as_deref()),
            designation: clean_optional(input.designation.as_deref()),
            employee_id,
            phone: clean_optional(input.phone.as_deref()),
            address: clean_optional(input.address.as_deref()),
            bio: input.bio,
            is_active: input.is_active,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %input.role, created_by = auth.actor.id, "User created");

    Ok((StatusCode::CREATED, Json(ItemResponse::new(user.into()))))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateUserRequest>,
) -> AppResult<Json<ItemResponse<UserResponse>>> {
    ensure(Some(&auth.actor), Action::Update, KIND, None)?;

    let existing = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Update, KIND, Some(&existing.resource()))?;

    let mut changed = Vec::new();
    if input.role.is_some_and(|role| role != existing.role()) {
        changed.push("role");
    }
    if input.is_active.is_some_and(|active| active != existing.is_active) {
        changed.push("isActive");
    }
    ensure_user_fields(&auth.actor, &existing.resource(), changed)?;

    let email = input.email.as_deref().map(normalize_email);
    let username = input.username.as_deref().map(|u| u.trim().to_string());
    let employee_id = clean_optional(input.employee_id.as_deref());

    if email.is_some() || username.is_some() || employee_id.is_some() {
        let taken = UserRepo::identity_taken(
            &state.pool,
            email.as_deref(),
            username.as_deref(),
            employee_id.as_deref(),
            Some(id),
        )
        .await?;
        if taken {
            return Err(AppError::Core(CoreError::Conflict(
                "Email, username or employee ID already in use".into(),
            )));
        }
    }

    let update = UpdateUser {
        username,
        email,
        role: input.role,
        full_name: input.full_name.map(|n| n.trim().to_string()),
        department: input.department,
        designation: input.designation,
        employee_id,
        phone: input.phone,
        address: input.address,
        bio: input.bio,
        is_active: input.is_active,
    };

    let user = UserRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(not_found(KIND, id))?;

    Ok(Json(ItemResponse::new(user.into())))
}

/// DELETE /api/v1/users/{id}
///
/// Superadmin accounts are protected, and accounts that own or are assigned
/// records must be deactivated instead.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    ensure(Some(&auth.actor), Action::Delete, KIND, None)?;

    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Delete, KIND, Some(&user.resource()))?;

    let references = UserRepo::reference_count(&state.pool, id).await?;
    if references > 0 {
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "Cannot delete user with {references} linked record(s); deactivate the account instead"
        ))));
    }

    if !UserRepo::delete(&state.pool, id).await? {
        return Err(not_found(KIND, id));
    }
    if let Some(image) = user.profile_image.as_deref() {
        state.files.remove(image).await;
    }

    tracing::info!(user_id = id, deleted_by = auth.actor.id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// GET /api/v1/users/department/{department}
///
/// Active employees and admins of a department, for assignment pickers.
pub async fn by_department(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(department): Path<String>,
) -> AppResult<Json<CollectionResponse<UserSummary>>> {
    ensure(Some(&auth.actor), Action::List, KIND, None)?;

    let staff = UserRepo::list_active_staff_by_department(&state.pool, &department).await?;
    Ok(Json(CollectionResponse::new(staff)))
}
