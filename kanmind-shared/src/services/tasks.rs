/// Task operations
///
/// Creation checks run in a fixed order: the board must exist, the creator
/// must participate in it, and only then are the fields validated. Updates
/// first resolve the task and check access through its board.
///
/// Assignee and reviewer must be the board owner or a current member at the
/// time they are set. The check is not repeated when membership later
/// changes.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::info;
use validator::Validate;

use super::{load_board, load_task, summary_of, trimmed, user_map, REQUIRED};
use crate::auth::authorization::{
    is_eligible_assignee, require_board_access, require_task_access, require_task_delete,
};
use crate::error::{field_errors, FieldError, KanbanError, KanbanResult};
use crate::models::board::Board;
use crate::models::task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask};
use crate::models::user::UserSummary;
use crate::store::KanbanStore;

/// Task with assignee and reviewer expanded
#[derive(Debug, Clone)]
pub struct TaskView {
    pub task: Task,
    pub assignee: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
}

/// Task creation payload
///
/// Status and priority arrive as text so that unknown values are reported
/// as field errors naming the allowed choices.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewTask {
    pub board: Option<i64>,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<String>,

    pub priority: Option<String>,

    pub assignee_id: Option<i64>,

    pub reviewer_id: Option<i64>,

    pub due_date: Option<NaiveDate>,
}

/// Partial task update payload
///
/// For `assignee_id`, `reviewer_id` and `due_date` an explicit `null`
/// clears the value while an absent key leaves it unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TaskChanges {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<String>,

    pub priority: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub assignee_id: Option<Option<i64>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub reviewer_id: Option<Option<i64>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<NaiveDate>>,
}

/// Maps a present key (even `null`) to `Some`
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Creates a task on a board the creator participates in
pub async fn create(store: &dyn KanbanStore, creator_id: i64, mut input: NewTask) -> KanbanResult<TaskView> {
    let board_id = input
        .board
        .ok_or_else(|| KanbanError::field("board", REQUIRED))?;
    let board = load_board(store, board_id).await?;
    require_board_access(creator_id, &board)?;

    input.title = input.title.as_deref().map(trimmed);
    let mut errors = validation_errors(&input);

    if input.title.is_none() {
        errors.push(FieldError::new("title", REQUIRED));
    }
    let status = parse_choice::<TaskStatus>("status", input.status.as_deref(), &mut errors);
    let priority = parse_choice::<TaskPriority>("priority", input.priority.as_deref(), &mut errors);
    check_participant(store, &board, "assignee_id", input.assignee_id, &mut errors).await?;
    check_participant(store, &board, "reviewer_id", input.reviewer_id, &mut errors).await?;

    if !errors.is_empty() {
        return Err(KanbanError::Validation(errors));
    }

    let task = store
        .create_task(CreateTask {
            board_id: board.id,
            title: input.title.unwrap_or_default(),
            description: input.description.unwrap_or_default(),
            status: status.unwrap_or_default(),
            priority: priority.unwrap_or_default(),
            assignee_id: input.assignee_id,
            reviewer_id: input.reviewer_id,
            due_date: input.due_date,
            created_by: Some(creator_id),
        })
        .await?;

    info!(task_id = task.id, board_id = board.id, creator_id, "Task created");

    single(store, task).await
}

/// A task, for owners and members of its board
pub async fn get(store: &dyn KanbanStore, user_id: i64, task_id: i64) -> KanbanResult<TaskView> {
    let task = load_task(store, task_id).await?;
    let board = load_board(store, task.board_id).await?;
    require_task_access(user_id, &task, &board)?;

    single(store, task).await
}

/// Applies a partial update
///
/// With `require_title` (full update) a missing title is a validation error.
pub async fn update(
    store: &dyn KanbanStore,
    user_id: i64,
    task_id: i64,
    mut changes: TaskChanges,
    require_title: bool,
) -> KanbanResult<TaskView> {
    let task = load_task(store, task_id).await?;
    let board = load_board(store, task.board_id).await?;
    require_task_access(user_id, &task, &board)?;

    changes.title = changes.title.as_deref().map(trimmed);
    let mut errors = validation_errors(&changes);

    if require_title && changes.title.is_none() {
        errors.push(FieldError::new("title", REQUIRED));
    }
    let status = parse_choice::<TaskStatus>("status", changes.status.as_deref(), &mut errors);
    let priority = parse_choice::<TaskPriority>("priority", changes.priority.as_deref(), &mut errors);
    check_participant(store, &board, "assignee_id", changes.assignee_id.flatten(), &mut errors).await?;
    check_participant(store, &board, "reviewer_id", changes.reviewer_id.flatten(), &mut errors).await?;

    if !errors.is_empty() {
        return Err(KanbanError::Validation(errors));
    }

    let update = UpdateTask {
        title: changes.title,
        description: changes.description,
        status,
        priority,
        assignee_id: changes.assignee_id,
        reviewer_id: changes.reviewer_id,
        due_date: changes.due_date,
    };

    let task = store
        .update_task(task.id, update)
        .await?
        .ok_or_else(|| KanbanError::NotFound("Task not found.".to_string()))?;

    info!(task_id = task.id, user_id, "Task updated");

    single(store, task).await
}

/// Deletes a task; allowed for its creator and the board owner
pub async fn delete(store: &dyn KanbanStore, user_id: i64, task_id: i64) -> KanbanResult<()> {
    let task = load_task(store, task_id).await?;
    let board = load_board(store, task.board_id).await?;
    require_task_delete(user_id, &task, &board)?;

    store.delete_task(task.id).await?;

    info!(task_id, user_id, "Task deleted");

    Ok(())
}

/// Tasks assigned to the user, by due date (undated last) then ID
pub async fn assigned_to(store: &dyn KanbanStore, user_id: i64) -> KanbanResult<Vec<TaskView>> {
    let tasks = store.list_tasks_assigned_to(user_id).await?;
    hydrate_tasks(store, tasks).await
}

/// Tasks the user reviews, by due date (undated last) then ID
pub async fn reviewing(store: &dyn KanbanStore, user_id: i64) -> KanbanResult<Vec<TaskView>> {
    let tasks = store.list_tasks_reviewed_by(user_id).await?;
    hydrate_tasks(store, tasks).await
}

/// Expands assignee and reviewer of many tasks with one user lookup
pub(crate) async fn hydrate_tasks(store: &dyn KanbanStore, tasks: Vec<Task>) -> KanbanResult<Vec<TaskView>> {
    let ids: Vec<i64> = tasks
        .iter()
        .flat_map(|t| [t.assignee_id, t.reviewer_id])
        .flatten()
        .collect();
    let users = user_map(store, ids).await?;

    Ok(tasks
        .into_iter()
        .map(|task| TaskView {
            assignee: summary_of(&users, task.assignee_id),
            reviewer: summary_of(&users, task.reviewer_id),
            task,
        })
        .collect())
}

async fn single(store: &dyn KanbanStore, task: Task) -> KanbanResult<TaskView> {
    hydrate_tasks(store, vec![task])
        .await?
        .pop()
        .ok_or_else(|| KanbanError::NotFound("Task not found.".to_string()))
}

fn validation_errors(input: &impl Validate) -> Vec<FieldError> {
    match input.validate() {
        Ok(()) => Vec::new(),
        Err(e) => field_errors(&e),
    }
}

fn parse_choice<T>(field: &str, value: Option<&str>, errors: &mut Vec<FieldError>) -> Option<T>
where
    T: std::str::FromStr<Err = crate::models::task::ChoiceError>,
{
    match value?.parse() {
        Ok(choice) => Some(choice),
        Err(e) => {
            errors.push(FieldError::new(field, e.to_string()));
            None
        }
    }
}

/// Records a field error unless `user_id` is absent or a board participant
async fn check_participant(
    store: &dyn KanbanStore,
    board: &Board,
    field: &str,
    user_id: Option<i64>,
    errors: &mut Vec<FieldError>,
) -> KanbanResult<()> {
    let Some(user_id) = user_id else {
        return Ok(());
    };

    if store.find_user(user_id).await?.is_none() {
        errors.push(FieldError::new(field, "Invalid user ID."));
    } else if !is_eligible_assignee(user_id, board) {
        errors.push(FieldError::new(field, "User is not a member of this board."));
    }

    Ok(())
}
