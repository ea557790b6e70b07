/// Board operations
///
/// Members are validated as a set: duplicate IDs collapse, and if any ID
/// does not resolve to a user the whole request fails with every missing ID
/// listed. On update the member set is replaced, never merged.

use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::tasks::{hydrate_tasks, TaskView};
use super::{load_board, trimmed, user_map, REQUIRED};
use crate::auth::authorization::{require_board_access, require_board_delete};
use crate::error::{KanbanError, KanbanResult};
use crate::models::board::{Board, BoardSummary};
use crate::models::user::UserSummary;
use crate::store::{KanbanStore, StoreError};

/// Create or update payload
///
/// `title` is required on create and on full updates.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BoardInput {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters."))]
    pub title: Option<String>,

    pub members: Option<Vec<i64>>,
}

/// Board with its members and tasks expanded
#[derive(Debug, Clone)]
pub struct BoardDetail {
    pub board: Board,
    pub members: Vec<UserSummary>,
    pub tasks: Vec<TaskView>,
}

/// Board after an update, with owner and members expanded
#[derive(Debug, Clone)]
pub struct BoardUpdate {
    pub board: Board,
    pub owner: Option<UserSummary>,
    pub members: Vec<UserSummary>,
}

/// Boards the user owns or belongs to, ordered by ID
pub async fn list(store: &dyn KanbanStore, user_id: i64) -> KanbanResult<Vec<BoardSummary>> {
    Ok(store.list_boards_for_user(user_id).await?)
}

/// Creates a board owned by `owner_id`
///
/// The owner is added to the member set after the listed members.
pub async fn create(
    store: &dyn KanbanStore,
    owner_id: i64,
    mut input: BoardInput,
) -> KanbanResult<BoardSummary> {
    input.title = input.title.as_deref().map(trimmed);
    input.validate()?;

    let title = input
        .title
        .ok_or_else(|| KanbanError::field("title", REQUIRED))?;
    let member_ids = resolve_members(store, input.members.as_deref().unwrap_or_default()).await?;

    let board = store
        .create_board(owner_id, &title, &member_ids)
        .await
        .map_err(member_vanished)?;
    store.add_board_member(board.id, owner_id).await?;

    info!(board_id = board.id, owner_id, members = member_ids.len(), "Board created");

    store
        .board_summary(board.id)
        .await?
        .ok_or_else(|| KanbanError::NotFound("Board not found.".to_string()))
}

/// Board with members and tasks, for owners and members
pub async fn detail(store: &dyn KanbanStore, user_id: i64, board_id: i64) -> KanbanResult<BoardDetail> {
    let board = load_board(store, board_id).await?;
    require_board_access(user_id, &board)?;

    let members = store
        .find_users(&board.member_ids)
        .await?
        .iter()
        .map(UserSummary::from)
        .collect();
    let tasks = hydrate_tasks(store, store.list_board_tasks(board.id).await?).await?;

    Ok(BoardDetail { board, members, tasks })
}

/// Updates title and/or replaces the member set
///
/// With `require_title` (full update) a missing title is a validation error.
pub async fn update(
    store: &dyn KanbanStore,
    user_id: i64,
    board_id: i64,
    mut input: BoardInput,
    require_title: bool,
) -> KanbanResult<BoardUpdate> {
    let board = load_board(store, board_id).await?;
    require_board_access(user_id, &board)?;

    input.title = input.title.as_deref().map(trimmed);
    input.validate()?;

    if require_title && input.title.is_none() {
        return Err(KanbanError::field("title", REQUIRED));
    }

    let member_ids = match input.members.as_deref() {
        Some(ids) => Some(resolve_members(store, ids).await?),
        None => None,
    };

    if let Some(title) = &input.title {
        store.update_board_title(board.id, title).await?;
    }

    if let Some(member_ids) = &member_ids {
        store
            .replace_board_members(board.id, member_ids)
            .await
            .map_err(member_vanished)?;
    }

    info!(
        board_id,
        title_changed = input.title.is_some(),
        members_replaced = member_ids.is_some(),
        "Board updated"
    );

    let board = load_board(store, board_id).await?;
    let mut ids = board.member_ids.clone();
    ids.push(board.owner_id);
    let users = user_map(store, ids).await?;

    Ok(BoardUpdate {
        owner: users.get(&board.owner_id).map(UserSummary::from),
        members: board
            .member_ids
            .iter()
            .filter_map(|id| users.get(id))
            .map(UserSummary::from)
            .collect(),
        board,
    })
}

/// Deletes a board and, with it, its tasks and their comments
pub async fn delete(store: &dyn KanbanStore, user_id: i64, board_id: i64) -> KanbanResult<()> {
    let board = load_board(store, board_id).await?;
    require_board_delete(user_id, &board)?;

    store.delete_board(board.id).await?;

    info!(board_id, "Board deleted");

    Ok(())
}

/// Deduplicates member IDs (first occurrence wins) and checks they exist
async fn resolve_members(store: &dyn KanbanStore, ids: &[i64]) -> KanbanResult<Vec<i64>> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }

    if unique.is_empty() {
        return Ok(unique);
    }

    let found = user_map(store, unique.clone()).await?;
    let mut missing: Vec<i64> = unique
        .iter()
        .copied()
        .filter(|id| !found.contains_key(id))
        .collect();

    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(KanbanError::field(
            "members",
            format!("The following user IDs do not exist: {missing:?}."),
        ));
    }

    Ok(unique)
}

/// A listed user deleted between validation and the write
fn member_vanished(err: StoreError) -> KanbanError {
    match err {
        StoreError::MissingReference(_) => {
            KanbanError::field("members", "One or more members no longer exist.")
        }
        other => other.into(),
    }
}
