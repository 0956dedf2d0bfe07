//! Repository for the `assignment_comments` table.

use portal_core::types::{DbId, Timestamp};
use sqlx::SqlitePool;

use crate::models::work_item::Comment;

/// Append-only access to assignment comment threads.
pub struct CommentRepo;

impl CommentRepo {
    /// Append a comment in one statement.
    ///
    /// Returns `false` when the assignment no longer exists, in which case
    /// nothing is written.
    pub async fn append(
        pool: &SqlitePool,
        assignment_id: DbId,
        user_id: DbId,
        text: &str,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO assignment_comments (work_item_id, user_id, text, created_at)
             SELECT id, ?2, ?3, ?4 FROM work_items WHERE id = ?1 AND kind = 'assignment'",
        )
        .bind(assignment_id)
        .bind(user_id)
        .bind(text)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The full thread of an assignment, oldest first.
    pub async fn list_for_assignment(
        pool: &SqlitePool,
        assignment_id: DbId,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "SELECT c.id, c.work_item_id, c.user_id, u.full_name AS user_name, c.text,
                    c.created_at
             FROM assignment_comments c
             LEFT JOIN users u ON u.id = c.user_id
             WHERE c.work_item_id = ?1
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(assignment_id)
        .fetch_all(pool)
        .await
    }
}
