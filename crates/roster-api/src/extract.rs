//! Request body extractor with JSON error bodies.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// Like [`axum::Json`], but a malformed body (unknown field, non-numeric
/// amount, missing field) is answered with `400 {"error": …}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
