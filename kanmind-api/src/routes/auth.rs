/// Authentication endpoints
///
/// - `POST /api/registration/` - Register and receive a token (201)
/// - `POST /api/login/` - Exchange email and password for a token (200)
///
/// Both respond with the same body:
///
/// ```json
/// {
///   "token": "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b",
///   "fullname": "Jane Doe",
///   "email": "jane@example.com",
///   "user_id": 1
/// }
/// ```
///
/// Failed logins always answer with the same generic message, whether the
/// email is unknown, the password wrong or the account inactive.

use crate::{app::AppState, error::ApiResult, extract::Payload};
use axum::{extract::State, http::StatusCode, Json};
use kanmind_shared::services::accounts::{self, Credentials, Registration, Session};
use serde::Serialize;

/// Token plus user summary
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub fullname: String,
    pub email: String,
    pub user_id: i64,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            fullname: session.user.fullname(),
            email: session.user.email,
            user_id: session.user.id,
            token: session.token,
        }
    }
}

/// Registers a new account
///
/// # Request
///
/// ```json
/// {
///   "fullname": "Jane Doe",
///   "email": "jane@example.com",
///   "password": "s3cret-pass",
///   "repeated_password": "s3cret-pass"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Field validation, mismatched passwords, email in use, weak password
pub async fn registration(
    State(state): State<AppState>,
    Payload(req): Payload<Registration>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = accounts::register(
        state.store.as_ref(),
        state.tokens.as_ref(),
        &state.accounts,
        req,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Logs in with email and password
///
/// # Errors
///
/// - `400 Bad Request`: Malformed email or invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Payload(req): Payload<Credentials>,
) -> ApiResult<Json<SessionResponse>> {
    let session = accounts::login(state.store.as_ref(), state.tokens.as_ref(), req).await?;

    Ok(Json(session.into()))
}
