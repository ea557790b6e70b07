/// Store wrapper that replays races with concurrent requests
///
/// Delegates to a [`MemoryStore`] but can serve stale reads:
/// - `stale_username_check`: the next username check reports the name free
/// - `deleted_users`: still returned by `find_users` after their deletion

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::memory::MemoryStore;
use super::{KanbanStore, StoreResult};
use crate::models::board::{Board, BoardSummary};
use crate::models::comment::{Comment, CreateComment};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

#[derive(Default)]
pub(crate) struct RacingStore {
    pub inner: MemoryStore,
    pub stale_username_check: AtomicBool,
    pub deleted_users: Mutex<Vec<User>>,
}

impl RacingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a user that lookups still see but writes no longer find
    pub fn delete_user_after_lookup(&self, id: i64) {
        self.deleted_users.lock().unwrap().push(User {
            id,
            username: format!("gone{id}"),
            email: format!("gone{id}@example.com"),
            first_name: "Gone".to_string(),
            last_name: String::new(),
            password_hash: "hash".to_string(),
            is_active: true,
            date_joined: Utc::now(),
        });
    }
}

#[async_trait]
impl KanbanStore for RacingStore {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.inner.create_user(data).await
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_users(&self, ids: &[i64]) -> StoreResult<Vec<User>> {
        let mut users = self.inner.find_users(ids).await?;
        users.extend(
            self.deleted_users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| ids.contains(&u.id))
                .cloned(),
        );
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        self.inner.email_exists(email).await
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        if self.stale_username_check.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.username_exists(username).await
    }

    async fn create_board(&self, owner_id: i64, title: &str, member_ids: &[i64]) -> StoreResult<Board> {
        self.inner.create_board(owner_id, title, member_ids).await
    }

    async fn find_board(&self, id: i64) -> StoreResult<Option<Board>> {
        self.inner.find_board(id).await
    }

    async fn add_board_member(&self, board_id: i64, user_id: i64) -> StoreResult<()> {
        self.inner.add_board_member(board_id, user_id).await
    }

    async fn update_board_title(&self, board_id: i64, title: &str) -> StoreResult<bool> {
        self.inner.update_board_title(board_id, title).await
    }

    async fn replace_board_members(&self, board_id: i64, member_ids: &[i64]) -> StoreResult<()> {
        self.inner.replace_board_members(board_id, member_ids).await
    }

    async fn delete_board(&self, board_id: i64) -> StoreResult<bool> {
        self.inner.delete_board(board_id).await
    }

    async fn list_boards_for_user(&self, user_id: i64) -> StoreResult<Vec<BoardSummary>> {
        self.inner.list_boards_for_user(user_id).await
    }

    async fn board_summary(&self, board_id: i64) -> StoreResult<Option<BoardSummary>> {
        self.inner.board_summary(board_id).await
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.inner.create_task(data).await
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        self.inner.find_task(id).await
    }

    async fn update_task(&self, id: i64, data: UpdateTask) -> StoreResult<Option<Task>> {
        self.inner.update_task(id, data).await
    }

    async fn delete_task(&self, id: i64) -> StoreResult<bool> {
        self.inner.delete_task(id).await
    }

    async fn list_board_tasks(&self, board_id: i64) -> StoreResult<Vec<Task>> {
        self.inner.list_board_tasks(board_id).await
    }

    async fn list_tasks_assigned_to(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        self.inner.list_tasks_assigned_to(user_id).await
    }

    async fn list_tasks_reviewed_by(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        self.inner.list_tasks_reviewed_by(user_id).await
    }

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment> {
        self.inner.create_comment(data).await
    }

    async fn find_comment(&self, task_id: i64, comment_id: i64) -> StoreResult<Option<Comment>> {
        self.inner.find_comment(task_id, comment_id).await
    }

    async fn list_comments(&self, task_id: i64) -> StoreResult<Vec<Comment>> {
        self.inner.list_comments(task_id).await
    }

    async fn delete_comment(&self, comment_id: i64) -> StoreResult<bool> {
        self.inner.delete_comment(comment_id).await
    }
}
