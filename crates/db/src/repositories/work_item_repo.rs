//! Repository for the `work_items` table (tasks and assignments).
//!
//! Every query is pinned to one [`WorkItemKind`], so a task id never
//! resolves through the assignment endpoints and vice versa.

use portal_core::query::{Page, PageRequest, Predicate, NEWEST_FIRST};
use portal_core::stats::WorkItemStats;
use portal_core::types::{DbId, Timestamp};
use portal_core::work_item::{self, WorkItemKind, WorkStatus};
use sqlx::SqlitePool;

use crate::filter;
use crate::models::work_item::{CreateWorkItem, UpdateWorkItem, WorkItem};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, kind, title, description, assigned_to, assigned_by, department, \
                       priority, status, due_date, completed_date, project_id, created_at, \
                       updated_at";

const TABLE: &str = "work_items";

fn kind_filter(kind: WorkItemKind) -> Predicate {
    Predicate::eq("kind", kind.name())
}

/// Provides CRUD operations for tasks and assignments.
pub struct WorkItemRepo;

impl WorkItemRepo {
    /// Insert a new work item in `pending` state, returning the created row.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateWorkItem,
    ) -> Result<WorkItem, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO work_items (kind, title, description, assigned_to, assigned_by,
                                     department, priority, status, due_date, project_id,
                                     created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(input.kind.name())
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.assigned_to)
            .bind(input.assigned_by)
            .bind(&input.department)
            .bind(input.priority.name())
            .bind(WorkStatus::Pending.name())
            .bind(input.due_date)
            .bind(input.project_id)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a work item of `kind` by ID.
    pub async fn find_by_id(
        pool: &SqlitePool,
        kind: WorkItemKind,
        id: DbId,
    ) -> Result<Option<WorkItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_items WHERE id = ?1 AND kind = ?2");
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(id)
            .bind(kind.name())
            .fetch_optional(pool)
            .await
    }

    /// List one page of `kind` items matching `filter`, newest first.
    pub async fn list(
        pool: &SqlitePool,
        kind: WorkItemKind,
        filter: &Predicate,
        page: &PageRequest,
    ) -> Result<Page<WorkItem>, sqlx::Error> {
        let filter = kind_filter(kind).and_also(filter.clone());
        filter::fetch_page(pool, TABLE, COLUMNS, &filter, NEWEST_FIRST, page).await
    }

    /// All tasks linked to a project, newest first.
    pub async fn list_for_project(
        pool: &SqlitePool,
        project_id: DbId,
    ) -> Result<Vec<WorkItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_items
             WHERE project_id = ?1 AND kind = 'task'
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Number of tasks linked to a project.
    pub async fn count_for_project(pool: &SqlitePool, project_id: DbId) -> Result<i64, sqlx::Error> {
        filter::count(
            pool,
            TABLE,
            &Predicate::and([
                kind_filter(WorkItemKind::Task),
                Predicate::eq("project_id", project_id),
            ]),
        )
        .await
    }

    /// Apply an update. `None` fields keep their value and `Some(None)` clears
    /// a nullable column; status and completion date are always written.
    ///
    /// Returns `None` if no row of `kind` with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        kind: WorkItemKind,
        id: DbId,
        input: &UpdateWorkItem,
    ) -> Result<Option<WorkItem>, sqlx::Error> {
        let query = format!(
            "UPDATE work_items SET
                title = COALESCE(?3, title),
                description = COALESCE(?4, description),
                department = CASE WHEN ?12 THEN ?5 ELSE department END,
                priority = COALESCE(?6, priority),
                due_date = COALESCE(?7, due_date),
                project_id = CASE WHEN ?13 THEN ?8 ELSE project_id END,
                status = ?9,
                completed_date = ?10,
                updated_at = ?11
             WHERE id = ?1 AND kind = ?2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(id)
            .bind(kind.name())
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.department.clone().flatten())
            .bind(input.priority.map(|p| p.name()))
            .bind(input.due_date)
            .bind(input.project_id.flatten())
            .bind(input.status.name())
            .bind(input.completed_date)
            .bind(chrono::Utc::now())
            .bind(input.department.is_some())
            .bind(input.project_id.is_some())
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a work item. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, kind: WorkItemKind, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM work_items WHERE id = ?1 AND kind = ?2")
            .bind(id)
            .bind(kind.name())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Status, priority and overdue counts over the `kind` items in `scope`.
    pub async fn stats(
        pool: &SqlitePool,
        kind: WorkItemKind,
        scope: &Predicate,
        now: Timestamp,
    ) -> Result<WorkItemStats, sqlx::Error> {
        let scope = kind_filter(kind).and_also(scope.clone());
        let total = filter::count(pool, TABLE, &scope).await?;
        let overdue = filter::count(
            pool,
            TABLE,
            &scope.clone().and_also(work_item::overdue_predicate(now)),
        )
        .await?;
        let by_status = filter::group_counts(pool, TABLE, "status", &scope).await?;
        let by_priority = filter::group_counts(pool, TABLE, "priority", &scope).await?;

        Ok(WorkItemStats::from_groups(total, overdue, by_status, by_priority))
    }
}
