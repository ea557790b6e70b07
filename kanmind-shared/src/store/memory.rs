/// In-memory store
///
/// Keeps every table in ordered maps behind one `RwLock`, mirroring the
/// PostgreSQL schema's constraints: unique usernames and (case-insensitive)
/// emails, foreign keys on insert, and cascading board/task deletes.
/// Used by the service and API tests, and handy for local experiments
/// without a database.
///
/// # Example
///
/// ```
/// use kanmind_shared::models::user::CreateUser;
/// use kanmind_shared::store::{memory::MemoryStore, KanbanStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = store
///     .create_user(CreateUser {
///         username: "ada".to_string(),
///         email: "ada@example.com".to_string(),
///         first_name: "Ada".to_string(),
///         last_name: "Lovelace".to_string(),
///         password_hash: "hash".to_string(),
///     })
///     .await?;
///
/// let board = store.create_board(user.id, "Engines", &[]).await?;
/// assert_eq!(board.owner_id, user.id);
/// # Ok(())
/// # }
/// ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{KanbanStore, StoreError, StoreResult, TokenIssuer};
use crate::auth::token::{constant_time_compare, generate_token_key};
use crate::models::board::{Board, BoardCounts, BoardSummary};
use crate::models::comment::{Comment, CreateComment};
use crate::models::task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    users: BTreeMap<i64, User>,
    boards: BTreeMap<i64, Board>,
    tasks: BTreeMap<i64, Task>,
    comments: BTreeMap<i64, Comment>,
    /// user_id -> token key
    tokens: HashMap<i64, String>,
}

impl State {
    /// IDs are unique across tables, which is fine for a test double
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn require_user(&self, id: i64) -> StoreResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(format!("user {id}")))
        }
    }

    fn require_users(&self, ids: &[i64]) -> StoreResult<()> {
        ids.iter().try_for_each(|id| self.require_user(*id))
    }

    fn require_optional_user(&self, id: Option<i64>) -> StoreResult<()> {
        id.map_or(Ok(()), |id| self.require_user(id))
    }

    fn email_taken(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.users.values().any(|u| u.email.to_lowercase() == email)
    }

    /// Task with its comment count filled in
    fn task_view(&self, task: &Task) -> Task {
        let mut task = task.clone();
        task.comments_count = self
            .comments
            .values()
            .filter(|c| c.task_id == task.id)
            .count() as i64;
        task
    }

    fn summary(&self, board: &Board) -> BoardSummary {
        let tasks: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.board_id == board.id)
            .collect();

        BoardSummary {
            id: board.id,
            title: board.title.clone(),
            owner_id: board.owner_id,
            counts: BoardCounts {
                member_count: board.member_ids.len() as i64,
                ticket_count: tasks.len() as i64,
                tasks_to_do_count: tasks.iter().filter(|t| t.status == TaskStatus::ToDo).count() as i64,
                tasks_high_prio_count: tasks
                    .iter()
                    .filter(|t| t.priority == TaskPriority::High)
                    .count() as i64,
            },
        }
    }

    /// Tasks matching `filter`, by due date (missing last) then ID
    fn tasks_by_due_date(&self, filter: impl Fn(&Task) -> bool) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| filter(t))
            .map(|t| self.task_view(t))
            .collect();
        tasks.sort_by_key(|t| (t.due_date.is_none(), t.due_date, t.id));
        tasks
    }
}

fn unique_sorted(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Store holding all state in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Marks a user active or inactive
    ///
    /// There is no account management surface; this exists so tests can
    /// exercise the inactive-account paths.
    pub fn set_user_active(&self, user_id: i64, active: bool) -> StoreResult<bool> {
        let mut state = self.write()?;
        Ok(state
            .users
            .get_mut(&user_id)
            .map(|user| user.is_active = active)
            .is_some())
    }
}

#[async_trait]
impl KanbanStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.write()?;

        if state.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Conflict(format!("username {} exists", data.username)));
        }
        if state.email_taken(&data.email) {
            return Err(StoreError::Conflict(format!("email {} exists", data.email)));
        }

        let user = User {
            id: state.next_id(),
            username: data.username,
            email: data.email,
            first_name: data.first_name,
            last_name: data.last_name,
            password_hash: data.password_hash,
            is_active: true,
            date_joined: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_users(&self, ids: &[i64]) -> StoreResult<Vec<User>> {
        let state = self.read()?;
        Ok(unique_sorted(ids)
            .into_iter()
            .filter_map(|id| state.users.get(&id).cloned())
            .collect())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.read()?.email_taken(email))
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self.read()?.users.values().any(|u| u.username == username))
    }

    async fn create_board(&self, owner_id: i64, title: &str, member_ids: &[i64]) -> StoreResult<Board> {
        let mut state = self.write()?;

        state.require_user(owner_id)?;
        state.require_users(member_ids)?;

        let board = Board {
            id: state.next_id(),
            title: title.to_string(),
            owner_id,
            created_at: Utc::now(),
            member_ids: unique_sorted(member_ids),
        };
        state.boards.insert(board.id, board.clone());

        Ok(board)
    }

    async fn find_board(&self, id: i64) -> StoreResult<Option<Board>> {
        Ok(self.read()?.boards.get(&id).cloned())
    }

    async fn add_board_member(&self, board_id: i64, user_id: i64) -> StoreResult<()> {
        let mut state = self.write()?;
        state.require_user(user_id)?;

        let board = state
            .boards
            .get_mut(&board_id)
            .ok_or_else(|| StoreError::MissingReference(format!("board {board_id}")))?;

        if let Err(pos) = board.member_ids.binary_search(&user_id) {
            board.member_ids.insert(pos, user_id);
        }

        Ok(())
    }

    async fn update_board_title(&self, board_id: i64, title: &str) -> StoreResult<bool> {
        let mut state = self.write()?;
        Ok(state
            .boards
            .get_mut(&board_id)
            .map(|board| board.title = title.to_string())
            .is_some())
    }

    async fn replace_board_members(&self, board_id: i64, member_ids: &[i64]) -> StoreResult<()> {
        let mut state = self.write()?;
        state.require_users(member_ids)?;

        if let Some(board) = state.boards.get_mut(&board_id) {
            board.member_ids = unique_sorted(member_ids);
        }

        Ok(())
    }

    async fn delete_board(&self, board_id: i64) -> StoreResult<bool> {
        let mut state = self.write()?;

        if state.boards.remove(&board_id).is_none() {
            return Ok(false);
        }

        let task_ids: BTreeSet<i64> = state
            .tasks
            .values()
            .filter(|t| t.board_id == board_id)
            .map(|t| t.id)
            .collect();
        state.tasks.retain(|id, _| !task_ids.contains(id));
        state.comments.retain(|_, c| !task_ids.contains(&c.task_id));

        Ok(true)
    }

    async fn list_boards_for_user(&self, user_id: i64) -> StoreResult<Vec<BoardSummary>> {
        let state = self.read()?;
        Ok(state
            .boards
            .values()
            .filter(|b| b.owner_id == user_id || b.has_member(user_id))
            .map(|b| state.summary(b))
            .collect())
    }

    async fn board_summary(&self, board_id: i64) -> StoreResult<Option<BoardSummary>> {
        let state = self.read()?;
        Ok(state.boards.get(&board_id).map(|b| state.summary(b)))
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.write()?;

        if !state.boards.contains_key(&data.board_id) {
            return Err(StoreError::MissingReference(format!("board {}", data.board_id)));
        }
        state.require_optional_user(data.assignee_id)?;
        state.require_optional_user(data.reviewer_id)?;
        state.require_optional_user(data.created_by)?;

        let task = Task {
            id: state.next_id(),
            board_id: data.board_id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            assignee_id: data.assignee_id,
            reviewer_id: data.reviewer_id,
            due_date: data.due_date,
            created_at: Utc::now(),
            created_by: data.created_by,
            comments_count: 0,
        };
        state.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).map(|t| state.task_view(t)))
    }

    async fn update_task(&self, id: i64, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;

        if let Some(assignee_id) = data.assignee_id {
            state.require_optional_user(assignee_id)?;
        }
        if let Some(reviewer_id) = data.reviewer_id {
            state.require_optional_user(reviewer_id)?;
        }

        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(status) = data.status {
            task.status = status;
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = data.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(reviewer_id) = data.reviewer_id {
            task.reviewer_id = reviewer_id;
        }
        if let Some(due_date) = data.due_date {
            task.due_date = due_date;
        }

        let task = task.clone();
        Ok(Some(state.task_view(&task)))
    }

    async fn delete_task(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.write()?;

        if state.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, c| c.task_id != id);

        Ok(true)
    }

    async fn list_board_tasks(&self, board_id: i64) -> StoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.board_id == board_id)
            .map(|t| state.task_view(t))
            .collect())
    }

    async fn list_tasks_assigned_to(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        Ok(self
            .read()?
            .tasks_by_due_date(|t| t.assignee_id == Some(user_id)))
    }

    async fn list_tasks_reviewed_by(&self, user_id: i64) -> StoreResult<Vec<Task>> {
        Ok(self
            .read()?
            .tasks_by_due_date(|t| t.reviewer_id == Some(user_id)))
    }

    async fn create_comment(&self, data: CreateComment) -> StoreResult<Comment> {
        let mut state = self.write()?;

        if !state.tasks.contains_key(&data.task_id) {
            return Err(StoreError::MissingReference(format!("task {}", data.task_id)));
        }
        state.require_user(data.author_id)?;

        let comment = Comment {
            id: state.next_id(),
            task_id: data.task_id,
            author_id: data.author_id,
            content: data.content,
            created_at: Utc::now(),
        };
        state.comments.insert(comment.id, comment.clone());

        Ok(comment)
    }

    async fn find_comment(&self, task_id: i64, comment_id: i64) -> StoreResult<Option<Comment>> {
        Ok(self
            .read()?
            .comments
            .get(&comment_id)
            .filter(|c| c.task_id == task_id)
            .cloned())
    }

    async fn list_comments(&self, task_id: i64) -> StoreResult<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .read()?
            .comments
            .values()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn delete_comment(&self, comment_id: i64) -> StoreResult<bool> {
        Ok(self.write()?.comments.remove(&comment_id).is_some())
    }
}

#[async_trait]
impl TokenIssuer for MemoryStore {
    async fn issue(&self, user_id: i64) -> StoreResult<String> {
        let mut state = self.write()?;
        state.require_user(user_id)?;

        let key = state
            .tokens
            .entry(user_id)
            .or_insert_with(generate_token_key)
            .clone();

        Ok(key)
    }

    async fn resolve(&self, token: &str) -> StoreResult<Option<i64>> {
        let state = self.read()?;

        let user_id = state
            .tokens
            .iter()
            .find(|(_, key)| constant_time_compare(key, token))
            .map(|(user_id, _)| *user_id);

        Ok(user_id.filter(|id| state.users.get(id).is_some_and(|u| u.is_active)))
    }
}
