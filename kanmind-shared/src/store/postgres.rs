/// PostgreSQL-backed store
///
/// Thin adapter from [`KanbanStore`] and [`TokenIssuer`] to the models'
/// associated functions. All SQL lives in `models::*`.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{KanbanStore, StoreResult, TokenIssuer};
use crate::auth::token::generate_token_key;
use crate::models::auth_token::AuthToken;
use crate::models::board::{Board, BoardSummary};
use crate::models::comment::{Comment, CreateComment};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

/// Store over a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl KanbanStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_users(&self, ids: &[i64]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(User::find_many(&self.pool, ids).await?)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(User::email_exists(&self.pool, email).await?)
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(User::username_exists(&self.pool, username).await?)
    }

    async fn create_board(&self, owner_id: i64, title: &str, member_ids: &[i64]) -> StoreResult<Board> {
        Ok(Board::create(&self.pool, owner_id, title, member_ids).await?)
    }

    async fn find_board(&self, id: i64) -> StoreResult<Option<Board>> {
        Ok(Board::find_by_id(&self.pool, id).await?)
    }

    async fn add_board_member(&self, board_id: i64, user_id: i64) -> StoreResult<()> {
        Ok(Board::add_member(&self.pool, board_id, user_id).await?)
    }

    async fn update_board_title(&self, board_id: i64, title: &str) -> StoreResult<bool> {
        Ok(Board::update_title(&self.pool, board_id, title).await?)
    }

    async fn replace_board_members(&self, board_id: i64, member_ids: &[i64]) -> StoreResult<()> {
        Ok(Board::replace_members(&self.pool, board_id, member_ids).await?)
    }

    async fn delete_board(&self, board_id: i64) -> StoreResult<bool> {
        Ok(Board::delete(&self.pool, board_id).await?)
    }

    async fn list_boards_for_user(&self, user_id: i64) -> StoreResult<Vec<BoardSummary>> {
        Ok(Board::list_for_user(&self.pool, user_id).await?)
    }

    async fn board_summary(&self, board_id: i64) -> StoreResult<Option<BoardSummary>> {
        Ok(Board::summary(&self.pool, board_id).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn update_task(&self, id: i64, data: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete_task(&self, id: i64) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn list_board_tasks(&self, board_id: i64) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_board(&self.pool, board_id).await?)
    }

    async fn list_tasks_assigned_to(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        Ok(Task::list_assigned_to(&self.pool, user_id).await?)
    }

    async fn list_tasks_reviewed_by(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        Ok(Task::list_reviewed_by(&self.pool, user_id).await?)
    }

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment> {
        Ok(Comment::create(&self.pool, data).await?)
    }

    async fn find_comment(&self, task_id: i64, comment_id: i64) -> StoreResult<Option<Comment>> {
        Ok(Comment::find_in_task(&self.pool, task_id, comment_id).await?)
    }

    async fn list_comments(&self, task_id: i64) -> StoreResult<Vec<Comment>> {
        Ok(Comment::list_by_task(&self.pool, task_id).await?)
    }

    async fn delete_comment(&self, comment_id: i64) -> StoreResult<bool> {
        Ok(Comment::delete(&self.pool, comment_id).await?)
    }
}

#[async_trait]
impl TokenIssuer for PgStore {
    async fn issue(&self, user_id: i64) -> StoreResult<String> {
        let candidate = generate_token_key();
        let token = AuthToken::get_or_create(&self.pool, user_id, &candidate).await?;
        Ok(token.key)
    }

    async fn resolve(&self, token: &str) -> StoreResult<Option<i64>> {
        Ok(AuthToken::resolve(&self.pool, token).await?)
    }
}
