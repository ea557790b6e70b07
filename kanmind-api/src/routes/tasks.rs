/// Task endpoints
///
/// - `POST /api/tasks/`
/// - `GET /api/tasks/assigned-to-me/`
/// - `GET /api/tasks/reviewing/`
/// - `GET|PUT|PATCH|DELETE /api/tasks/:task_id/`
///
/// Lists and creation return the task with its board and comment count.
/// Single-task reads and updates omit both.

use crate::{app::AppState, error::ApiResult, extract::{PathParam, Payload}};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use kanmind_shared::{
    auth::middleware::AuthContext,
    models::{
        task::{TaskPriority, TaskStatus},
        user::UserSummary,
    },
    services::tasks::{self, NewTask, TaskChanges, TaskView},
};
use serde::Serialize;

/// Task as returned to clients
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<i64>,

    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<i64>,
}

impl TaskResponse {
    /// Board ID and comment count included
    pub fn full(view: TaskView) -> Self {
        let board = view.task.board_id;
        let comments = view.task.comments_count;
        Self {
            board: Some(board),
            comments_count: Some(comments),
            ..Self::detail(view)
        }
    }

    /// Nested under a board: comment count but no board ID
    pub fn on_board(view: TaskView) -> Self {
        let comments = view.task.comments_count;
        Self {
            comments_count: Some(comments),
            ..Self::detail(view)
        }
    }

    /// Single task read or update
    pub fn detail(view: TaskView) -> Self {
        let TaskView {
            task,
            assignee,
            reviewer,
        } = view;

        Self {
            id: task.id,
            board: None,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            assignee,
            reviewer,
            due_date: task.due_date,
            comments_count: None,
        }
    }
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Payload(req): Payload<NewTask>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let view = tasks::create(state.store.as_ref(), auth.user_id, req).await?;

    Ok((StatusCode::CREATED, Json(TaskResponse::full(view))))
}

pub async fn assigned_to_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let views = tasks::assigned_to(state.store.as_ref(), auth.user_id).await?;

    Ok(Json(views.into_iter().map(TaskResponse::full).collect()))
}

pub async fn reviewing(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let views = tasks::reviewing(state.store.as_ref(), auth.user_id).await?;

    Ok(Json(views.into_iter().map(TaskResponse::full).collect()))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(task_id): PathParam<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let view = tasks::get(state.store.as_ref(), auth.user_id, task_id).await?;

    Ok(Json(TaskResponse::detail(view)))
}

/// PUT: `title` is required
pub async fn replace_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(task_id): PathParam<i64>,
    Payload(req): Payload<TaskChanges>,
) -> ApiResult<Json<TaskResponse>> {
    let view = tasks::update(state.store.as_ref(), auth.user_id, task_id, req, true).await?;

    Ok(Json(TaskResponse::detail(view)))
}

/// PATCH: every field optional
pub async fn patch_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(task_id): PathParam<i64>,
    Payload(req): Payload<TaskChanges>,
) -> ApiResult<Json<TaskResponse>> {
    let view = tasks::update(state.store.as_ref(), auth.user_id, task_id, req, false).await?;

    Ok(Json(TaskResponse::detail(view)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(task_id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    tasks::delete(state.store.as_ref(), auth.user_id, task_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
