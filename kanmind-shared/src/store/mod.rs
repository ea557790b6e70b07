/// Persistence seam
///
/// Services never talk to the database directly. They go through
/// [`KanbanStore`], which has two implementations:
///
/// - [`postgres::PgStore`]: delegates to the `models::*` CRUD functions
/// - [`memory::MemoryStore`]: in-process maps, used by tests and local runs
///
/// Token issuance sits behind the separate [`TokenIssuer`] trait so the
/// token mechanism can change without touching authorization or services.
///
/// # Contract
///
/// - Lookups return `Ok(None)` for missing rows; only infrastructure failures
///   are errors.
/// - Board snapshots always carry the full `member_ids` set, ascending.
/// - Task lists are ordered by ID; assigned/reviewing lists by due date
///   (missing dates last) then ID; comment lists by creation time then ID.
/// - Deleting a board removes its tasks and their comments.

pub mod memory;
pub mod postgres;
#[cfg(test)]
pub(crate) mod racing;

use async_trait::async_trait;

use crate::models::board::{Board, BoardSummary};
use crate::models::comment::{Comment, CreateComment};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Referenced row does not exist
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// In-memory state is unusable (a writer panicked)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error() {
            match db.code().as_deref() {
                // unique_violation
                Some("23505") => return StoreError::Conflict(db.message().to_string()),
                // foreign_key_violation
                Some("23503") => return StoreError::MissingReference(db.message().to_string()),
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Repository operations used by the domain services
#[async_trait]
pub trait KanbanStore: Send + Sync {
    /// Connectivity check for health reporting
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;

    /// First user (lowest ID) whose email matches case-insensitively
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Users with the given IDs, ascending; unknown IDs are skipped
    async fn find_users(&self, ids: &[i64]) -> StoreResult<Vec<User>>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    async fn username_exists(&self, username: &str) -> StoreResult<bool>;

    // Boards

    async fn create_board(&self, owner_id: i64, title: &str, member_ids: &[i64]) -> StoreResult<Board>;

    async fn find_board(&self, id: i64) -> StoreResult<Option<Board>>;

    async fn add_board_member(&self, board_id: i64, user_id: i64) -> StoreResult<()>;

    async fn update_board_title(&self, board_id: i64, title: &str) -> StoreResult<bool>;

    /// Replaces the whole member set
    async fn replace_board_members(&self, board_id: i64, member_ids: &[i64]) -> StoreResult<()>;

    async fn delete_board(&self, board_id: i64) -> StoreResult<bool>;

    /// Boards the user owns or belongs to, with derived counts, by ID
    async fn list_boards_for_user(&self, user_id: i64) -> StoreResult<Vec<BoardSummary>>;

    /// Derived counts of one board
    async fn board_summary(&self, board_id: i64) -> StoreResult<Option<BoardSummary>>;

    // Tasks

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>>;

    async fn update_task(&self, id: i64, data: UpdateTask) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: i64) -> StoreResult<bool>;

    async fn list_board_tasks(&self, board_id: i64) -> StoreResult<Vec<Task>>;

    async fn list_tasks_assigned_to(&self, user_id: i64) -> StoreResult<Vec<Task>>;

    async fn list_tasks_reviewed_by(&self, user_id: i64) -> StoreResult<Vec<Task>>;

    // Comments

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment>;

    /// Comment by ID, only if it belongs to `task_id`
    async fn find_comment(&self, task_id: i64, comment_id: i64) -> StoreResult<Option<Comment>>;

    async fn list_comments(&self, task_id: i64) -> StoreResult<Vec<Comment>>;

    async fn delete_comment(&self, comment_id: i64) -> StoreResult<bool>;
}

/// Opaque token issuance
///
/// `issue` is idempotent per user: it returns the existing token when there
/// is one and only mints a new key otherwise.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, user_id: i64) -> StoreResult<String>;

    /// User owning `token`, if the token exists and the user is active
    async fn resolve(&self, token: &str) -> StoreResult<Option<i64>>;
}
