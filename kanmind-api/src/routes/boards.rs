/// Board endpoints
///
/// - `GET /api/boards/` - Boards the user owns or belongs to, with counts
/// - `POST /api/boards/` - Create a board owned by the user
/// - `GET /api/boards/:board_id/` - Board with members and tasks
/// - `PUT|PATCH /api/boards/:board_id/` - Update title and/or replace members
/// - `DELETE /api/boards/:board_id/` - Owner only

use super::tasks::TaskResponse;
use crate::{app::AppState, error::ApiResult, extract::{PathParam, Payload}};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use kanmind_shared::{
    auth::middleware::AuthContext,
    models::{board::BoardSummary, user::UserSummary},
    services::boards::{self, BoardDetail, BoardInput, BoardUpdate},
};
use serde::Serialize;

/// Board with members and tasks expanded
#[derive(Debug, Serialize)]
pub struct BoardDetailResponse {
    pub id: i64,
    pub title: String,
    pub owner_id: i64,
    pub members: Vec<UserSummary>,
    pub tasks: Vec<TaskResponse>,
}

impl From<BoardDetail> for BoardDetailResponse {
    fn from(detail: BoardDetail) -> Self {
        Self {
            id: detail.board.id,
            title: detail.board.title,
            owner_id: detail.board.owner_id,
            members: detail.members,
            tasks: detail.tasks.into_iter().map(TaskResponse::on_board).collect(),
        }
    }
}

/// Board after an update
#[derive(Debug, Serialize)]
pub struct BoardUpdateResponse {
    pub id: i64,
    pub title: String,
    pub owner_data: Option<UserSummary>,
    pub members_data: Vec<UserSummary>,
}

impl From<BoardUpdate> for BoardUpdateResponse {
    fn from(update: BoardUpdate) -> Self {
        Self {
            id: update.board.id,
            title: update.board.title,
            owner_data: update.owner,
            members_data: update.members,
        }
    }
}

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<BoardSummary>>> {
    let boards = boards::list(state.store.as_ref(), auth.user_id).await?;

    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Payload(req): Payload<BoardInput>,
) -> ApiResult<(StatusCode, Json<BoardSummary>)> {
    let board = boards::create(state.store.as_ref(), auth.user_id, req).await?;

    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(board_id): PathParam<i64>,
) -> ApiResult<Json<BoardDetailResponse>> {
    let detail = boards::detail(state.store.as_ref(), auth.user_id, board_id).await?;

    Ok(Json(detail.into()))
}

/// PUT: `title` is required
pub async fn replace_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(board_id): PathParam<i64>,
    Payload(req): Payload<BoardInput>,
) -> ApiResult<Json<BoardUpdateResponse>> {
    let update = boards::update(state.store.as_ref(), auth.user_id, board_id, req, true).await?;

    Ok(Json(update.into()))
}

/// PATCH: every field optional
pub async fn patch_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(board_id): PathParam<i64>,
    Payload(req): Payload<BoardInput>,
) -> ApiResult<Json<BoardUpdateResponse>> {
    let update = boards::update(state.store.as_ref(), auth.user_id, board_id, req, false).await?;

    Ok(Json(update.into()))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(board_id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    boards::delete(state.store.as_ref(), auth.user_id, board_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
