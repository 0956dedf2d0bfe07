//! Handlers for the `/documents` resource.
//!
//! Uploads arrive as multipart forms and are written to the upload directory
//! under a generated name; the original name is kept only as metadata.
//! Non-privileged callers see public documents plus their own uploads.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use portal_core::document::{
    parse_tags, resolve_title, validate_title, DocumentCategory, DocumentStatus,
};
use portal_core::actor::Actor;
use portal_core::error::CoreError;
use portal_core::policy::{scope_filter, Action, ResourceKind};
use portal_core::query::{has_param, user_filters, PageRequest, Predicate};
use portal_core::stats::DocumentStats;
use portal_core::types::DbId;
use portal_core::upload;
use portal_db::models::document::{CreateDocument, Document, UpdateDocument};
use portal_db::repositories::DocumentRepo;
use portal_db::DbPool;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use uuid::Uuid;
use validator::Validate;

use super::not_found;
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::ensure;
use crate::response::{ItemResponse, ListResponse, MessageResponse, StatsResponse};
use crate::state::AppState;
use crate::storage::DOCUMENTS_DIR;

const KIND: ResourceKind = ResourceKind::Document;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `PUT /documents/{id}` (metadata only; the file itself
/// is immutable).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<DocumentCategory>,
    pub department: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    pub status: Option<DocumentStatus>,
}

/// Text fields collected from the upload form.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Option<String>, Vec<u8>)>,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    department: Option<String>,
    tags: Option<String>,
    is_public: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/documents?page&limit&category&department&status
///
/// Only active documents are listed unless a privileged caller asks for a
/// specific `status`.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ListResponse<Document>>> {
    ensure(Some(&auth.actor), Action::List, KIND, None)?;

    let mut filter =
        scope_filter(Some(&auth.actor), KIND, Utc::now()).and_also(user_filters(KIND, &params));
    if !(auth.actor.is_privileged() && has_param(&params, "status")) {
        filter = filter.and_also(Predicate::eq("status", DocumentStatus::Active.name()));
    }

    let page = DocumentRepo::list(&state.pool, &filter, &PageRequest::from_params(&params)).await?;
    Ok(Json(page.into()))
}

/// GET /api/v1/documents/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<StatsResponse<DocumentStats>>> {
    ensure(Some(&auth.actor), Action::Stats, KIND, None)?;

    let scope = scope_filter(Some(&auth.actor), KIND, Utc::now());
    let stats = DocumentRepo::stats(&state.pool, &scope).await?;
    Ok(Json(StatsResponse::new(stats)))
}

/// GET /api/v1/documents/{id}
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<ItemResponse<Document>>> {
    ensure(Some(&auth.actor), Action::Read, KIND, None)?;

    let document = find_readable(&state.pool, &auth.actor, id).await?;
    ensure(Some(&auth.actor), Action::Read, KIND, Some(&document.resource()))?;

    Ok(Json(ItemResponse::new(document)))
}

/// POST /api/v1/documents
///
/// Multipart form: `file` plus optional `title`, `description`, `category`,
/// `department`, `tags` (comma separated) and `isPublic` (`"true"`).
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ItemResponse<Document>>)> {
    ensure(Some(&auth.actor), Action::Create, KIND, None)?;

    let form = read_upload_form(multipart).await?;
    let (original_name, content_type, data) = form
        .file
        .ok_or_else(|| AppError::BadRequest("Please upload a file".into()))?;

    upload::validate_document(&original_name, data.len())?;
    let title = resolve_title(form.title.as_deref(), &original_name)?;
    let category = match form.category.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => DocumentCategory::from_name(raw)?,
        _ => DocumentCategory::default(),
    };

    let unique = Uuid::new_v4().simple().to_string();
    let file_name = upload::stored_file_name("doc", &unique, &original_name);
    let file_path = state
        .files
        .save(DOCUMENTS_DIR, &file_name, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store document: {e}")))?;

    let input = CreateDocument {
        title,
        description: form.description.filter(|d| !d.trim().is_empty()),
        category,
        file_name,
        original_name,
        file_path: file_path.clone(),
        mime_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        file_size: data.len() as i64,
        uploaded_by: auth.actor.id,
        department: form.department.filter(|d| !d.trim().is_empty()),
        tags: form.tags.as_deref().map(parse_tags).unwrap_or_default(),
        is_public: form.is_public.as_deref().map(str::trim) == Some("true"),
    };

    let document = match DocumentRepo::create(&state.pool, &input).await {
        Ok(document) => document,
        Err(e) => {
            state.files.remove(&file_path).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        document_id = document.id,
        size = document.file_size,
        uploaded_by = auth.actor.id,
        "Document uploaded"
    );

    Ok((StatusCode::CREATED, Json(ItemResponse::new(document))))
}

/// PUT /api/v1/documents/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateDocumentRequest>,
) -> AppResult<Json<ItemResponse<Document>>> {
    ensure(Some(&auth.actor), Action::Update, KIND, None)?;

    let existing = DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Update, KIND, Some(&existing.resource()))?;

    let title = input.title.map(|t| t.trim().to_string());
    if let Some(title) = title.as_deref() {
        validate_title(title)?;
    }

    let update = UpdateDocument {
        title,
        description: input.description,
        category: input.category,
        department: input.department,
        tags: input.tags.map(|tags| parse_tags(&tags.join(","))),
        is_public: input.is_public,
        status: input.status,
    };

    let document = DocumentRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(not_found(KIND, id))?;

    Ok(Json(ItemResponse::new(document)))
}

/// DELETE /api/v1/documents/{id}
///
/// Removes the record first, then the stored file.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    ensure(Some(&auth.actor), Action::Delete, KIND, None)?;

    let document = DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    ensure(Some(&auth.actor), Action::Delete, KIND, Some(&document.resource()))?;

    if !DocumentRepo::delete(&state.pool, id).await? {
        return Err(not_found(KIND, id));
    }
    state.files.remove(&document.file_path).await;

    tracing::info!(document_id = id, deleted_by = auth.actor.id, "Document deleted");
    Ok(Json(MessageResponse::new("Document deleted successfully")))
}

/// GET /api/v1/documents/{id}/download
///
/// The file is opened before the counter moves, so a missing file is a 404
/// that leaves `downloadCount` untouched.
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    ensure(Some(&auth.actor), Action::Download, KIND, None)?;

    let document = find_readable(&state.pool, &auth.actor, id).await?;
    ensure(Some(&auth.actor), Action::Download, KIND, Some(&document.resource()))?;

    let file = match state.files.open(&document.file_path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(document_id = id, path = %document.file_path, "Stored file missing");
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Document file",
                id,
            }));
        }
        Err(e) => {
            return Err(AppError::InternalError(format!(
                "Failed to open stored document: {e}"
            )))
        }
    };

    let document = DocumentRepo::increment_downloads(&state.pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;

    tracing::debug!(
        document_id = id,
        downloads = document.download_count,
        user_id = auth.actor.id,
        "Document downloaded"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, document.mime_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                attachment_name(&document.original_name)
            ),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(format!("Failed to build download response: {e}")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a document for a single-item read. Non-privileged callers only see
/// active documents, matching the listing default.
async fn find_readable(pool: &DbPool, actor: &Actor, id: DbId) -> AppResult<Document> {
    let document = DocumentRepo::find_by_id(pool, id)
        .await?
        .ok_or(not_found(KIND, id))?;
    if !actor.is_privileged() && document.status() != DocumentStatus::Active {
        return Err(not_found(KIND, id));
    }
    Ok(document)
}

async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let original_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.file = Some((original_name, content_type, data.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value),
            "category" => form.category = Some(value),
            "department" => form.department = Some(value),
            "tags" => form.tags = Some(value),
            "isPublic" => form.is_public = Some(value),
            _ => {} // ignore unknown fields
        }
    }

    Ok(form)
}

/// Header-safe version of the original file name.
fn attachment_name(original: &str) -> String {
    original
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
