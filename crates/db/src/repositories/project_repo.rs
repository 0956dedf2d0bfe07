//! Repository for the `projects` and `project_employees` tables.

use portal_core::project::ProjectStatus;
use portal_core::query::{Page, PageRequest, Predicate, NEWEST_FIRST};
use portal_core::stats::ProjectStats;
use portal_core::types::DbId;
use sqlx::SqlitePool;

use crate::filter;
use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_name, description, department, start_date, deadline, \
                       status, priority, total_tasks, completed_tasks, progress, created_by, \
                       created_at, updated_at";

const TABLE: &str = "projects";

/// Provides CRUD operations for projects and their employee rosters.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project in `planning` state, returning the created row.
    pub async fn create(pool: &SqlitePool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO projects (project_name, description, department, start_date, deadline,
                                   status, priority, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.project_name)
            .bind(&input.description)
            .bind(&input.department)
            .bind(input.start_date)
            .bind(input.deadline)
            .bind(ProjectStatus::Planning.name())
            .bind(input.priority.name())
            .bind(input.created_by)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = ?1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a project with the given ID exists.
    pub async fn exists(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        Ok(filter::count(pool, TABLE, &Predicate::eq("id", id)).await? > 0)
    }

    /// List one page of projects matching `filter`, newest first.
    pub async fn list(
        pool: &SqlitePool,
        filter: &Predicate,
        page: &PageRequest,
    ) -> Result<Page<Project>, sqlx::Error> {
        filter::fetch_page(pool, TABLE, COLUMNS, filter, NEWEST_FIRST, page).await
    }

    /// Apply an update. Progress fields are always written.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                project_name = COALESCE(?2, project_name),
                description = COALESCE(?3, description),
                department = COALESCE(?4, department),
                start_date = COALESCE(?5, start_date),
                deadline = COALESCE(?6, deadline),
                priority = COALESCE(?7, priority),
                status = ?8,
                total_tasks = ?9,
                completed_tasks = ?10,
                progress = ?11,
                updated_at = ?12
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.project_name)
            .bind(&input.description)
            .bind(&input.department)
            .bind(input.start_date)
            .bind(input.deadline)
            .bind(input.priority.map(|p| p.name()))
            .bind(input.progress.status.name())
            .bind(input.progress.total_tasks)
            .bind(input.progress.completed_tasks)
            .bind(input.progress.progress)
            .bind(chrono::Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a project. Returns `true` if a row was removed.
    ///
    /// Fails with a foreign key violation while any task still links to it.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// IDs of the employees assigned to a project.
    pub async fn employee_ids(pool: &SqlitePool, project_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT user_id FROM project_employees WHERE project_id = ?1 ORDER BY user_id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Replace a project's roster atomically.
    pub async fn set_employees(
        pool: &SqlitePool,
        project_id: DbId,
        user_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM project_employees WHERE project_id = ?1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        for user_id in user_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO project_employees (project_id, user_id) VALUES (?1, ?2)",
            )
            .bind(project_id)
            .bind(*user_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE projects SET updated_at = ?2 WHERE id = ?1")
            .bind(project_id)
            .bind(chrono::Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(project_id, count = user_ids.len(), "Project roster replaced");
        Ok(())
    }

    /// Status, department, priority and progress aggregates over `scope`.
    pub async fn stats(pool: &SqlitePool, scope: &Predicate) -> Result<ProjectStats, sqlx::Error> {
        let by_status = filter::group_counts(pool, TABLE, "status", scope).await?;
        let by_department = filter::group_counts(pool, TABLE, "department", scope).await?;
        let by_priority = filter::group_counts(pool, TABLE, "priority", scope).await?;
        let avg_progress = filter::average(pool, TABLE, "progress", scope).await?;

        Ok(ProjectStats::from_groups(
            &by_status,
            by_department,
            by_priority,
            avg_progress,
        ))
    }
}
