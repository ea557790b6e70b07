/// Token authentication middleware for Axum
///
/// Extracts the opaque token from the `Authorization` header, resolves it to
/// a user through a [`TokenIssuer`], and adds an [`AuthContext`] to the
/// request extensions. Requests without a valid token are rejected with
/// 401 before any handler or authorization predicate runs.
///
/// Both `Authorization: Token <key>` and `Authorization: Bearer <key>` are
/// accepted.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use kanmind_shared::auth::middleware::{create_token_middleware, AuthContext};
/// use kanmind_shared::store::{memory::MemoryStore, TokenIssuer};
///
/// async fn protected_handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
///
/// let issuer: Arc<dyn TokenIssuer> = Arc::new(MemoryStore::new());
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(middleware::from_fn(create_token_middleware(issuer)));
/// ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::token::validate_token_format;
use crate::store::TokenIssuer;

/// Authentication context added to request extensions
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: i64,
}

impl AuthContext {
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Error type for authentication middleware
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,

    /// Header present but not `Token <key>` / `Bearer <key>`
    #[error("Invalid token header. {0}")]
    InvalidFormat(String),

    /// Unknown token or inactive user
    #[error("Invalid token.")]
    InvalidToken,

    /// Token lookup failed
    #[error("Token lookup failed: {0}")]
    StoreError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::StoreError(e) => {
                tracing::error!(error = %e, "Token lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            _ => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Extracts the token key from an `Authorization` header value
///
/// # Errors
///
/// Returns `AuthError::InvalidFormat` if the scheme is not `Token` or
/// `Bearer`, or if the key is empty or contains spaces. A key that is not
/// 40 hex characters fails with `AuthError::InvalidToken` without a lookup.
pub fn extract_token(header_value: &str) -> Result<&str, AuthError> {
    let key = header_value
        .strip_prefix("Token ")
        .or_else(|| header_value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AuthError::InvalidFormat("Expected 'Token <key>' or 'Bearer <key>'.".to_string())
        })?
        .trim();

    if key.is_empty() {
        return Err(AuthError::InvalidFormat("No credentials provided.".to_string()));
    }

    if key.contains(char::is_whitespace) {
        return Err(AuthError::InvalidFormat(
            "Token string should not contain spaces.".to_string(),
        ));
    }

    if !validate_token_format(key) {
        return Err(AuthError::InvalidToken);
    }

    Ok(key)
}

/// Token authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - Authorization header is missing
/// - Header format is invalid
/// - Token does not resolve to an active user
pub async fn token_auth_middleware(
    issuer: Arc<dyn TokenIssuer>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let key = extract_token(auth_header)?;

    let user_id = issuer
        .resolve(key)
        .await
        .map_err(|e| AuthError::StoreError(e.to_string()))?
        .ok_or(AuthError::InvalidToken)?;

    tracing::debug!(user_id, "Authenticated request");

    req.extensions_mut().insert(AuthContext::new(user_id));

    Ok(next.run(req).await)
}

/// Creates a token authentication middleware closure
///
/// Captures the issuer so the result can be passed to
/// `axum::middleware::from_fn`.
pub fn create_token_middleware(
    issuer: Arc<dyn TokenIssuer>,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>> + Clone
{
    move |req, next| {
        let issuer = issuer.clone();
        Box::pin(token_auth_middleware(issuer, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_schemes() {
        let key = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(extract_token(&format!("Token {key}")), Ok(key));
        assert_eq!(extract_token(&format!("Bearer {key}")), Ok(key));
    }

    #[test]
    fn test_extract_token_rejects_malformed_keys() {
        assert_eq!(extract_token("Token abc123"), Err(AuthError::InvalidToken));
        assert_eq!(extract_token(&format!("Token {}", "z".repeat(40))), Err(AuthError::InvalidToken));
        assert_eq!(extract_token(&format!("Bearer {}", "a".repeat(41))), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_extract_token_rejects_bad_headers() {
        assert!(matches!(extract_token("Basic dXNlcjpwYXNz"), Err(AuthError::InvalidFormat(_))));
        assert!(matches!(extract_token("Token "), Err(AuthError::InvalidFormat(_))));
        assert!(matches!(extract_token("Token a b"), Err(AuthError::InvalidFormat(_))));
        assert!(matches!(extract_token("abc123"), Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidFormat("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::StoreError("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
