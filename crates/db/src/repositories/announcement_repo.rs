//! Repository for the `announcements` table.

use portal_core::announcement::{self, FEATURED_LIMIT};
use portal_core::query::{Page, PageRequest, Predicate, ANNOUNCEMENT_FEED_ORDER};
use portal_core::stats::AnnouncementStats;
use portal_core::types::{DbId, Timestamp};
use sqlx::SqlitePool;

use crate::filter::{self, SqlFilter};
use crate::models::announcement::{Announcement, CreateAnnouncement, UpdateAnnouncement};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, content, category, priority, status, publish_date, \
                       expiry_date, created_by, views, is_featured, display_order, created_at, \
                       updated_at";

const TABLE: &str = "announcements";

/// Provides CRUD operations, the featured strip and the view counter.
pub struct AnnouncementRepo;

impl AnnouncementRepo {
    /// Insert a new announcement, returning the created row.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateAnnouncement,
    ) -> Result<Announcement, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO announcements (title, content, category, priority, status,
                                        publish_date, expiry_date, created_by, is_featured,
                                        display_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Announcement>(&query)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.category.name())
            .bind(input.priority.name())
            .bind(input.status.name())
            .bind(input.publish_date)
            .bind(input.expiry_date)
            .bind(input.created_by)
            .bind(input.is_featured)
            .bind(input.display_order)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find an announcement by its internal ID without touching the view counter.
    pub async fn find_by_id(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<Announcement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM announcements WHERE id = ?1");
        sqlx::query_as::<_, Announcement>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of announcements matching `filter` in feed order.
    pub async fn list(
        pool: &SqlitePool,
        filter: &Predicate,
        page: &PageRequest,
    ) -> Result<Page<Announcement>, sqlx::Error> {
        filter::fetch_page(pool, TABLE, COLUMNS, filter, ANNOUNCEMENT_FEED_ORDER, page).await
    }

    /// Up to [`FEATURED_LIMIT`] featured, currently visible announcements
    /// ordered by manual order then newest publish date.
    pub async fn featured(
        pool: &SqlitePool,
        now: Timestamp,
    ) -> Result<Vec<Announcement>, sqlx::Error> {
        let rendered = SqlFilter::render(&Predicate::and([
            Predicate::eq("is_featured", true),
            announcement::visible_predicate(now),
        ]));
        let query = format!(
            "SELECT {COLUMNS} FROM announcements {}
             ORDER BY display_order ASC, publish_date DESC, id DESC
             LIMIT ?",
            rendered.where_clause()
        );
        filter::bind_values(sqlx::query_as::<_, Announcement>(&query), &rendered.binds)
            .bind(FEATURED_LIMIT)
            .fetch_all(pool)
            .await
    }

    /// Atomically bump the view counter, returning the updated row.
    ///
    /// Returns `None` when the announcement no longer exists.
    pub async fn increment_views(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<Announcement>, sqlx::Error> {
        let query = format!(
            "UPDATE announcements SET views = views + 1 WHERE id = ?1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Announcement>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update an announcement. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        input: &UpdateAnnouncement,
    ) -> Result<Option<Announcement>, sqlx::Error> {
        let query = format!(
            "UPDATE announcements SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                category = COALESCE(?4, category),
                priority = COALESCE(?5, priority),
                status = COALESCE(?6, status),
                publish_date = COALESCE(?7, publish_date),
                expiry_date = CASE WHEN ?12 THEN ?8 ELSE expiry_date END,
                is_featured = COALESCE(?9, is_featured),
                display_order = COALESCE(?10, display_order),
                updated_at = ?11
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Announcement>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(input.category.map(|c| c.name()))
            .bind(input.priority.map(|p| p.name()))
            .bind(input.status.map(|s| s.name()))
            .bind(input.publish_date)
            .bind(input.expiry_date.flatten())
            .bind(input.is_featured)
            .bind(input.display_order)
            .bind(chrono::Utc::now())
            .bind(input.expiry_date.is_some())
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete an announcement. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Status, category, priority and view aggregates over `scope`.
    pub async fn stats(
        pool: &SqlitePool,
        scope: &Predicate,
    ) -> Result<AnnouncementStats, sqlx::Error> {
        let by_status = filter::group_counts(pool, TABLE, "status", scope).await?;
        let by_category = filter::group_counts(pool, TABLE, "category", scope).await?;
        let by_priority = filter::group_counts(pool, TABLE, "priority", scope).await?;
        let total_views = filter::sum(pool, TABLE, "views", scope).await?;

        Ok(AnnouncementStats::from_groups(
            &by_status,
            by_category,
            by_priority,
            total_views,
        ))
    }
}
