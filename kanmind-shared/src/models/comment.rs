/// Task comment model and database operations
///
/// Comments are flat and append-only. They are never edited, only deleted
/// by their author.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_comments (
///     id BIGSERIAL PRIMARY KEY,
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Comment on a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub task_id: i64,
    pub author_id: i64,
    pub content: String,
}

impl Comment {
    /// Appends a comment to a task
    pub async fn create(pool: &PgPool, data: CreateComment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO task_comments (task_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, content, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.author_id)
        .bind(data.content)
        .fetch_one(pool)
        .await
    }

    /// Finds a comment scoped to its task
    ///
    /// Returns None if the comment exists but belongs to another task.
    pub async fn find_in_task(
        pool: &PgPool,
        task_id: i64,
        comment_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, content, created_at
            FROM task_comments
            WHERE id = $1 AND task_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// Comments of a task, oldest first (ties broken by ID)
    pub async fn list_by_task(pool: &PgPool, task_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, content, created_at
            FROM task_comments
            WHERE task_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
