/// Domain services
///
/// Each operation is a free async function over `&dyn KanbanStore`. They
/// all follow the same order: resolve the target entity (not found), apply
/// the authorization predicate (permission denied), validate fields, then
/// write.
///
/// - `accounts`: registration, login, email lookup
/// - `boards`: board CRUD and membership
/// - `tasks`: task CRUD, assigned/reviewing queries
/// - `comments`: task comments

pub mod accounts;
pub mod boards;
pub mod comments;
pub mod tasks;

use std::collections::HashMap;

use crate::error::{KanbanError, KanbanResult};
use crate::models::board::Board;
use crate::models::task::Task;
use crate::models::user::{User, UserSummary};
use crate::store::KanbanStore;

pub(crate) const REQUIRED: &str = "This field is required.";

/// Loads a board or fails with `NotFound`
pub(crate) async fn load_board(store: &dyn KanbanStore, board_id: i64) -> KanbanResult<Board> {
    store
        .find_board(board_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("Board not found.".to_string()))
}

/// Loads a task or fails with `NotFound`
pub(crate) async fn load_task(store: &dyn KanbanStore, task_id: i64) -> KanbanResult<Task> {
    store
        .find_task(task_id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("Task not found.".to_string()))
}

/// Loads users by ID in one query, keyed by ID
pub(crate) async fn user_map(
    store: &dyn KanbanStore,
    mut ids: Vec<i64>,
) -> KanbanResult<HashMap<i64, User>> {
    ids.sort_unstable();
    ids.dedup();

    Ok(store
        .find_users(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

/// Minimal representation of an optional user reference
pub(crate) fn summary_of(users: &HashMap<i64, User>, id: Option<i64>) -> Option<UserSummary> {
    id.and_then(|id| users.get(&id)).map(UserSummary::from)
}

pub(crate) fn trimmed(value: &str) -> String {
    value.trim().to_string()
}
