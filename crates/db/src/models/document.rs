//! Document entity model and DTOs.

use portal_core::document::{DocumentCategory, DocumentStatus};
use portal_core::policy::Resource;
use portal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub file_name: String,
    pub original_name: String,
    /// Path relative to the upload root. Never sent to clients.
    #[serde(skip)]
    pub file_path: String,
    pub mime_type: String,
    pub file_size: i64,
    pub uploaded_by: DbId,
    pub department: Option<String>,
    pub tags: Json<Vec<String>>,
    pub is_public: bool,
    pub status: String,
    pub download_count: i64,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    pub fn category(&self) -> DocumentCategory {
        DocumentCategory::from_name(&self.category).unwrap_or_default()
    }

    pub fn status(&self) -> DocumentStatus {
        DocumentStatus::from_name(&self.status).unwrap_or_default()
    }

    pub fn resource(&self) -> Resource {
        Resource::Document {
            uploaded_by: self.uploaded_by,
            is_public: self.is_public,
        }
    }
}

/// DTO for recording an uploaded document.
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub title: String,
    pub description: Option<String>,
    pub category: DocumentCategory,
    pub file_name: String,
    pub original_name: String,
    pub file_path: String,
    pub mime_type: String,
    pub file_size: i64,
    pub uploaded_by: DbId,
    pub department: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
}

/// DTO for updating document metadata. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<DocumentCategory>,
    pub department: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
    pub status: Option<DocumentStatus>,
}
