/// Comment endpoints
///
/// - `GET /api/tasks/:task_id/comments/` - Oldest first
/// - `POST /api/tasks/:task_id/comments/`
/// - `DELETE /api/tasks/:task_id/comments/:comment_id/` - Author only

use crate::{app::AppState, error::ApiResult, extract::{PathParam, Payload}};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use kanmind_shared::{
    auth::middleware::AuthContext,
    services::comments::{self, CommentView, NewComment},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,

    /// Author's full name
    pub author: String,

    pub content: String,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            created_at: view.comment.created_at,
            author: view.author,
            content: view.comment.content,
        }
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(task_id): PathParam<i64>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let views = comments::list(state.store.as_ref(), auth.user_id, task_id).await?;

    Ok(Json(views.into_iter().map(CommentResponse::from).collect()))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam(task_id): PathParam<i64>,
    Payload(req): Payload<NewComment>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let view = comments::create(state.store.as_ref(), auth.user_id, task_id, req).await?;

    Ok((StatusCode::CREATED, Json(view.into())))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PathParam((task_id, comment_id)): PathParam<(i64, i64)>,
) -> ApiResult<StatusCode> {
    comments::delete(state.store.as_ref(), auth.user_id, task_id, comment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
