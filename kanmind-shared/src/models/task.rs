/// Task model and database operations
///
/// A task belongs to exactly one board and is deleted with it. Assignee and
/// reviewer are optional and must be board participants at the time they are
/// set; the check is done by the task service, not by the schema.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     board_id BIGINT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status VARCHAR(20) NOT NULL DEFAULT 'to-do',
///     priority VARCHAR(10) NOT NULL DEFAULT 'medium',
///     assignee_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     reviewer_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     due_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     created_by BIGINT REFERENCES users(id) ON DELETE SET NULL
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

/// Error returned when a status or priority string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{value}\" is not a valid choice. Allowed: {allowed}")]
pub struct ChoiceError {
    pub value: String,
    pub allowed: String,
}

/// Workflow column of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::ToDo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to-do",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

macro_rules! text_choice {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|choice| choice.as_str() == s)
                    .ok_or_else(|| {
                        let mut allowed: Vec<&str> = <$ty>::ALL.iter().map(|c| c.as_str()).collect();
                        allowed.sort_unstable();
                        ChoiceError {
                            value: s.to_string(),
                            allowed: allowed.join(", "),
                        }
                    })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ChoiceError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_choice!(TaskStatus);
text_choice!(TaskPriority);

/// Task row, annotated with its comment count
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    /// Owning board
    pub board_id: i64,

    pub title: String,

    pub description: String,

    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    pub assignee_id: Option<i64>,

    pub reviewer_id: Option<i64>,

    pub due_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    /// Creator (nullable if the user was deleted)
    pub created_by: Option<i64>,

    /// Derived, not stored
    pub comments_count: i64,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub board_id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_id: Option<i64>,
    pub reviewer_id: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub created_by: Option<i64>,
}

/// Partial task update
///
/// `None` leaves a field untouched. For nullable columns `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Option<i64>>,
    pub reviewer_id: Option<Option<i64>>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        *self == UpdateTask::default()
    }
}

const TASK_SELECT: &str = r#"
    SELECT t.id, t.board_id, t.title, t.description, t.status, t.priority,
           t.assignee_id, t.reviewer_id, t.due_date, t.created_at, t.created_by,
           (SELECT COUNT(*) FROM task_comments c WHERE c.task_id = t.id) AS comments_count
    FROM tasks t
"#;

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO tasks (board_id, title, description, status, priority,
                               assignee_id, reviewer_id, due_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(data.board_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.priority.as_str())
        .bind(data.assignee_id)
        .bind(data.reviewer_id)
        .bind(data.due_date)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{TASK_SELECT} WHERE t.id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Applies a partial update
    ///
    /// Returns the updated task, or None if it doesn't exist.
    pub async fn update(pool: &PgPool, id: i64, data: UpdateTask) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        // Build dynamic update query based on which fields are present
        let mut assignments = Vec::new();
        let mut bind_count = 1;

        let mut push = |column: &str| {
            bind_count += 1;
            assignments.push(format!("{} = ${}", column, bind_count));
        };

        if data.title.is_some() {
            push("title");
        }
        if data.description.is_some() {
            push("description");
        }
        if data.status.is_some() {
            push("status");
        }
        if data.priority.is_some() {
            push("priority");
        }
        if data.assignee_id.is_some() {
            push("assignee_id");
        }
        if data.reviewer_id.is_some() {
            push("reviewer_id");
        }
        if data.due_date.is_some() {
            push("due_date");
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 RETURNING id",
            assignments.join(", ")
        );

        let mut q = sqlx::query_scalar::<_, i64>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }
        if let Some(reviewer_id) = data.reviewer_id {
            q = q.bind(reviewer_id);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        match q.fetch_optional(pool).await? {
            Some(id) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }

    /// Deletes a task; its comments cascade
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All tasks of a board, ordered by ID
    pub async fn list_by_board(pool: &PgPool, board_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("{TASK_SELECT} WHERE t.board_id = $1 ORDER BY t.id ASC");

        sqlx::query_as::<_, Task>(&query)
            .bind(board_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks assigned to a user, by due date (nulls last) then ID
    pub async fn list_assigned_to(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "{TASK_SELECT} WHERE t.assignee_id = $1 ORDER BY t.due_date ASC, t.id ASC"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks a user reviews, by due date (nulls last) then ID
    pub async fn list_reviewed_by(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "{TASK_SELECT} WHERE t.reviewer_id = $1 ORDER BY t.due_date ASC, t.id ASC"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
