//! Repository for the `documents` table.

use portal_core::document::DocumentStatus;
use portal_core::query::{Page, PageRequest, Predicate, NEWEST_FIRST};
use portal_core::stats::DocumentStats;
use portal_core::types::DbId;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::filter;
use crate::models::document::{CreateDocument, Document, UpdateDocument};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, category, file_name, original_name, file_path, \
                       mime_type, file_size, uploaded_by, department, tags, is_public, status, \
                       download_count, version, created_at, updated_at";

const TABLE: &str = "documents";

/// Provides CRUD operations and the download counter for documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Record an uploaded file, returning the created row.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateDocument,
    ) -> Result<Document, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO documents (title, description, category, file_name, original_name,
                                    file_path, mime_type, file_size, uploaded_by, department,
                                    tags, is_public, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.category.name())
            .bind(&input.file_name)
            .bind(&input.original_name)
            .bind(&input.file_path)
            .bind(&input.mime_type)
            .bind(input.file_size)
            .bind(input.uploaded_by)
            .bind(&input.department)
            .bind(Json(&input.tags))
            .bind(input.is_public)
            .bind(DocumentStatus::Active.name())
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a document by its internal ID.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = ?1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of documents matching `filter`, newest first.
    pub async fn list(
        pool: &SqlitePool,
        filter: &Predicate,
        page: &PageRequest,
    ) -> Result<Page<Document>, sqlx::Error> {
        filter::fetch_page(pool, TABLE, COLUMNS, filter, NEWEST_FIRST, page).await
    }

    /// Update document metadata. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        input: &UpdateDocument,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "UPDATE documents SET
                title = COALESCE(?2, title),
                description = COALESCE(?3, description),
                category = COALESCE(?4, category),
                department = COALESCE(?5, department),
                tags = COALESCE(?6, tags),
                is_public = COALESCE(?7, is_public),
                status = COALESCE(?8, status),
                updated_at = ?9
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.category.map(|c| c.name()))
            .bind(&input.department)
            .bind(input.tags.as_ref().map(Json))
            .bind(input.is_public)
            .bind(input.status.map(|s| s.name()))
            .bind(chrono::Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Atomically bump the download counter, returning the updated row.
    ///
    /// Returns `None` when the document no longer exists.
    pub async fn increment_downloads(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "UPDATE documents SET download_count = download_count + 1 WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a document row. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Aggregates over the active documents in `scope`.
    pub async fn stats(pool: &SqlitePool, scope: &Predicate) -> Result<DocumentStats, sqlx::Error> {
        let scope = scope
            .clone()
            .and_also(Predicate::eq("status", DocumentStatus::Active.name()));

        Ok(DocumentStats {
            total: filter::count(pool, TABLE, &scope).await?,
            by_category: filter::group_counts(pool, TABLE, "category", &scope).await?,
            by_department: filter::group_counts(pool, TABLE, "department", &scope).await?,
            total_downloads: filter::sum(pool, TABLE, "download_count", &scope).await?,
        })
    }
}
