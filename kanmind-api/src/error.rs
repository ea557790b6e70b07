/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Domain errors convert via `From<KanbanError>`:
///
/// | KanbanError        | Status |
/// |--------------------|--------|
/// | `Validation`       | 400    |
/// | `Unauthenticated`  | 401    |
/// | `PermissionDenied` | 403    |
/// | `NotFound`         | 404    |
/// | `Store`/`Password` | 500    |

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kanmind_shared::error::{FieldError, KanbanError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), e.g. malformed JSON
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Field-scoped validation failures (400)
    ValidationError(Vec<FieldError>),

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => {
                // Single failures read better with their own message
                let message = match errors.as_slice() {
                    [only] => only.message.clone(),
                    _ => "Request validation failed".to_string(),
                };
                (StatusCode::BAD_REQUEST, "validation_error", message, Some(errors))
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert domain errors to API errors
impl From<KanbanError> for ApiError {
    fn from(err: KanbanError) -> Self {
        match err {
            KanbanError::Validation(fields) => ApiError::ValidationError(fields),
            KanbanError::NotFound(msg) => ApiError::NotFound(msg),
            KanbanError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            KanbanError::Unauthenticated(msg) => ApiError::Unauthorized(msg),
            KanbanError::Store(err) => ApiError::InternalError(format!("Store error: {}", err)),
            KanbanError::Password(err) => {
                ApiError::InternalError(format!("Password operation failed: {}", err))
            }
        }
    }
}

/// Convert JSON body rejections to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Unparsable IDs in the URL match no resource
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_server_error() {
            return ApiError::InternalError(rejection.body_text());
        }
        ApiError::NotFound("Not found.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanmind_shared::store::StoreError;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Board not found.".to_string());
        assert_eq!(err.to_string(), "Not found: Board not found.");
    }

    #[test]
    fn test_kanban_error_status_mapping() {
        let cases = [
            (KanbanError::field("title", "required"), StatusCode::BAD_REQUEST),
            (KanbanError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (KanbanError::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
            (KanbanError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (
                KanbanError::Store(StoreError::Unavailable("lock poisoned".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let err = ApiError::ValidationError(vec![
            FieldError::new("title", "This field is required."),
            FieldError::new("status", "\"x\" is not a valid choice."),
        ]);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["details"][0]["field"], "title");
        assert_eq!(json["details"][1]["field"], "status");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::InternalError("connection refused".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);

        assert!(!text.contains("connection refused"));
        assert!(!text.contains("details"));
    }
}
