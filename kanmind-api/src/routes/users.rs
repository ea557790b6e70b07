/// User lookup endpoint
///
/// `GET /api/email-check/?email=jane@example.com` returns the minimal user
/// for the first account with that email (case-insensitive), or 404.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use kanmind_shared::{
    models::user::UserSummary,
    services::accounts::{self, EmailLookup},
};

pub async fn email_check(
    State(state): State<AppState>,
    Query(query): Query<EmailLookup>,
) -> ApiResult<Json<UserSummary>> {
    let user = accounts::find_by_email(state.store.as_ref(), query).await?;

    Ok(Json(UserSummary::from(&user)))
}
