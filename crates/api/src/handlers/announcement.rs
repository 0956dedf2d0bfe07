//! Handlers for the `/announcements` resource.
//!
//! Listing, the featured strip and single reads are public. Anonymous and
//! non-privileged callers only ever see published, unexpired announcements.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::announcement::{
    validate_dates, AnnouncementCategory, AnnouncementPriority, AnnouncementStatus,
};
use portal_core::policy::{scope_filter, Action, ResourceKind};
use portal_core::query::{user_filters, PageRequest};
use portal_core::stats::AnnouncementStats;
use portal_core::types::{DbId, Timestamp};
use portal_db::models::announcement::{Announcement, CreateAnnouncement, UpdateAnnouncement};
use portal_db::repositories::AnnouncementRepo;
use serde::Deserialize;
use validator::Validate;

use super::not_found;
use crate::error::AppResult;
use crate::extract::{nullable, ValidJson};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::ensure;
use crate::response::{CollectionResponse, ItemResponse, ListResponse, MessageResponse, StatsResponse};
use crate::state::AppState;

const KIND: ResourceKind = ResourceKind::Announcement;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub content: String,
    #[serde(default)]
    pub category: AnnouncementCategory,
    #[serde(default)]
    pub priority: AnnouncementPriority,
    #[serde(default)]
    pub status: AnnouncementStatus,
    /// Defaults to now.
    pub publish_date: Option<Timestamp>,
    pub expiry_date: Option<Timestamp>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub content: Option<String>,
    pub category: Option<AnnouncementCategory>,
    pub priority: Option<AnnouncementPriority>,
    pub status: Option<AnnouncementStatus>,
    pub publish_date: Option<Timestamp>,
    /// `null` clears the expiry date.
    #[serde(default, deserialize_with = "nullable")]
    pub expiry_date: Option<Option<Timestamp>>,
    pub is_featured: Option<bool>,
    pub order: Option<i64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/announcements?page&limit&category&priority&status&view
///
/// Privileged callers passing `view=admin` see drafts, archived and expired
/// announcements too.
pub async fn list(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ListResponse<Announcement>>> {
    ensure(auth.actor(), Action::List, KIND, None)?;

    let admin_view = auth.actor().is_some_and(|a| a.is_privileged())
        && params.get("view").map(String::as_str) == Some("admin");
    let scope_actor = if admin_view { auth.actor() } else { None };

    let filter =
        scope_filter(scope_actor, KIND, Utc::now()).and_also(user_filters(KIND, &params));
    let page =
        AnnouncementRepo::list(&state.pool, &filter, &PageRequest::from_params(&params)).await?;
    Ok(Json(page.into()))
}

/// GET /api/v1/announcements/featured
pub async fn featured(
    State(state): State<AppState>,
) -> AppResult<Json<CollectionResponse<Announcement>>> {
    let items = AnnouncementRepo::featured(&state.pool, Utc::now()).await?;
    Ok(Json(CollectionResponse::new(items)))
}

/// GET /api/v1/announcements/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<StatsResponse<AnnouncementStats>>> {
    ensure(Some(&auth.actor), Action::Stats, KIND, None)?;

    let scope = scope_filter(Some(&auth.actor), KIND, Utc::now());
    let stats = AnnouncementRepo::stats(&state.pool, &scope).await?;
    Ok(Json(StatsResponse::new(stats)))
}

/// GET /api/v1/announcements/{id}
///
/// Every successful read counts as a view.
pub async fn get(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ItemResponse<Announcement>>> {
    ensure(auth.actor(), Action::Read, KIND, None)?;

    let announcement = AnnouncementRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(
        auth.actor(),
        Action::Read,
        KIND,
        Some(&announcement.resource(Utc::now())),
    )?;

    let announcement = AnnouncementRepo::increment_views(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    Ok(Json(ItemResponse::new(announcement)))
}

/// POST /api/v1/announcements
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateAnnouncementRequest>,
) -> AppResult<(StatusCode, Json<ItemResponse<Announcement>>)> {
    ensure(Some(&auth.actor), Action::Create, KIND, None)?;

    let publish_date = input.publish_date.unwrap_or_else(Utc::now);
    validate_dates(publish_date, input.expiry_date)?;

    let announcement = AnnouncementRepo::create(
        &state.pool,
        &CreateAnnouncement {
            title: input.title.trim().to_string(),
            content: input.content,
            category: input.category,
            priority: input.priority,
            status: input.status,
            publish_date,
            expiry_date: input.expiry_date,
            created_by: auth.actor.id,
            is_featured: input.is_featured,
            display_order: input.order,
        },
    )
    .await?;

    tracing::info!(
        announcement_id = announcement.id,
        status = %input.status,
        created_by = auth.actor.id,
        "Announcement created"
    );

    Ok((StatusCode::CREATED, Json(ItemResponse::new(announcement))))
}

/// PUT /api/v1/announcements/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateAnnouncementRequest>,
) -> AppResult<Json<ItemResponse<Announcement>>> {
    ensure(Some(&auth.actor), Action::Update, KIND, None)?;

    let existing = AnnouncementRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;

    validate_dates(
        input.publish_date.unwrap_or(existing.publish_date),
        input.expiry_date.unwrap_or(existing.expiry_date),
    )?;

    let update = UpdateAnnouncement {
        title: input.title.map(|t| t.trim().to_string()),
        content: input.content,
        category: input.category,
        priority: input.priority,
        status: input.status,
        publish_date: input.publish_date,
        expiry_date: input.expiry_date,
        is_featured: input.is_featured,
        display_order: input.order,
    };

    let announcement = AnnouncementRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(not_found(KIND, id))?;

    Ok(Json(ItemResponse::new(announcement)))
}

/// DELETE /api/v1/announcements/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    ensure(Some(&auth.actor), Action::Delete, KIND, None)?;

    if !AnnouncementRepo::delete(&state.pool, id).await? {
        return Err(not_found(KIND, id));
    }

    tracing::info!(announcement_id = id, deleted_by = auth.actor.id, "Announcement deleted");
    Ok(Json(MessageResponse::new("Announcement deleted successfully")))
}
