/// Request extractors
///
/// `Payload<T>` behaves like `axum::Json<T>` but rejects malformed bodies
/// with the same JSON error shape as every other failure. `PathParam<T>`
/// does the same for URL segments, so `/api/boards/abc/` is a JSON 404.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON request body with `ApiError` rejections
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// URL path parameters with `ApiError` rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);
