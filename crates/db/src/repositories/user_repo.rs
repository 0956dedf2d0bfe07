//! Repository for the `users` table.

use portal_core::query::{Page, PageRequest, Predicate, NEWEST_FIRST};
use portal_core::roles::Role;
use portal_core::stats::UserStats;
use portal_core::types::{DbId, Timestamp};
use sqlx::SqlitePool;

use crate::filter;
use crate::models::user::{CreateUser, UpdateUser, User, UserSummary};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, password_hash, role, full_name, department, \
                       designation, employee_id, phone, address, bio, profile_image, \
                       is_active, last_login, created_at, updated_at";

const SUMMARY_COLUMNS: &str =
    "id, full_name, email, role, department, designation, employee_id";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &SqlitePool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO users (username, email, password_hash, role, full_name, department,
                                designation, employee_id, phone, address, bio, is_active,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role.name())
            .bind(&input.full_name)
            .bind(&input.department)
            .bind(&input.designation)
            .bind(&input.employee_id)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.bio)
            .bind(input.is_active)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by (already normalized) email.
    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = ?1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Whether another account already holds any of the given unique values.
    ///
    /// `exclude_id` skips the account being updated.
    pub async fn identity_taken(
        pool: &SqlitePool,
        email: Option<&str>,
        username: Option<&str>,
        employee_id: Option<&str>,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users
             WHERE (email = ?1 OR username = ?2 OR employee_id = ?3)
               AND (?4 IS NULL OR id <> ?4)",
        )
        .bind(email)
        .bind(username)
        .bind(employee_id)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;
        Ok(taken > 0)
    }

    /// List one page of users matching `filter`, newest first.
    pub async fn list(
        pool: &SqlitePool,
        filter: &Predicate,
        page: &PageRequest,
    ) -> Result<Page<User>, sqlx::Error> {
        filter::fetch_page(pool, "users", COLUMNS, filter, NEWEST_FIRST, page).await
    }

    /// Active employees and admins of a department, by name.
    pub async fn list_active_staff_by_department(
        pool: &SqlitePool,
        department: &str,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM users
             WHERE department = ?1 AND is_active = 1 AND role IN ('employee', 'admin')
             ORDER BY full_name ASC, id ASC"
        );
        sqlx::query_as::<_, UserSummary>(&query)
            .bind(department)
            .fetch_all(pool)
            .await
    }

    /// Summaries for the given ids, in id order. Unknown ids are skipped.
    pub async fn find_summaries(
        pool: &SqlitePool,
        ids: &[DbId],
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM users WHERE id IN ({placeholders}) ORDER BY id"
        );
        let mut q = sqlx::query_as::<_, UserSummary>(&query);
        for id in ids {
            q = q.bind(*id);
        }
        q.fetch_all(pool).await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE(?2, username),
                email = COALESCE(?3, email),
                role = COALESCE(?4, role),
                full_name = COALESCE(?5, full_name),
                department = COALESCE(?6, department),
                designation = COALESCE(?7, designation),
                employee_id = COALESCE(?8, employee_id),
                phone = COALESCE(?9, phone),
                address = COALESCE(?10, address),
                bio = COALESCE(?11, bio),
                is_active = COALESCE(?12, is_active),
                updated_at = ?13
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.email)
            .bind(input.role.map(Role::name))
            .bind(&input.full_name)
            .bind(&input.department)
            .bind(&input.designation)
            .bind(&input.employee_id)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.bio)
            .bind(input.is_active)
            .bind(chrono::Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Set `last_login` to the given time.
    pub async fn record_login(
        pool: &SqlitePool,
        id: DbId,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = ?2 WHERE id = ?1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Update a user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &SqlitePool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(password_hash)
                .bind(chrono::Utc::now())
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Point the profile image at a newly stored file, returning the updated row.
    pub async fn update_profile_image(
        pool: &SqlitePool,
        id: DbId,
        path: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET profile_image = ?2, updated_at = ?3 WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(path)
            .bind(chrono::Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Number of accounts holding `role`.
    pub async fn count_by_role(pool: &SqlitePool, role: Role) -> Result<i64, sqlx::Error> {
        filter::count(pool, "users", &Predicate::eq("role", role.name())).await
    }

    /// Records that still point at the user: work items assigned to or by
    /// them, comments, and projects, documents or announcements they created.
    ///
    /// Project roster rows are not counted; they cascade with the account.
    pub async fn reference_count(pool: &SqlitePool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT \
                (SELECT COUNT(*) FROM work_items WHERE assigned_to = ?1 OR assigned_by = ?1) \
              + (SELECT COUNT(*) FROM assignment_comments WHERE user_id = ?1) \
              + (SELECT COUNT(*) FROM projects WHERE created_by = ?1) \
              + (SELECT COUNT(*) FROM documents WHERE uploaded_by = ?1) \
              + (SELECT COUNT(*) FROM announcements WHERE created_by = ?1)",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Permanently delete a user by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Account counts over the users matching `scope`.
    pub async fn stats(pool: &SqlitePool, scope: &Predicate) -> Result<UserStats, sqlx::Error> {
        let total = filter::count(pool, "users", scope).await?;
        let active = filter::count(
            pool,
            "users",
            &scope.clone().and_also(Predicate::eq("is_active", true)),
        )
        .await?;
        let by_role = filter::group_counts(pool, "users", "role", scope).await?;
        let by_department = filter::group_counts(pool, "users", "department", scope).await?;

        Ok(UserStats {
            total,
            active,
            inactive: total - active,
            by_role,
            by_department,
        })
    }
}
