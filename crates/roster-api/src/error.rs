//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use roster_core::{Error as CoreError, identity::AuthFailure};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("authentication required")]
  Unauthenticated,
}

impl ApiError {
  /// Wrap a collaborator failure as [`CoreError::Remote`].
  pub fn remote(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Core(CoreError::remote(e))
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthenticated => StatusCode::UNAUTHORIZED,
      Self::Core(e) => match e {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Conflict(_)
        | CoreError::DuplicateAttendance { .. }
        | CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CoreError::Auth(AuthFailure::TooManyAttempts) => StatusCode::TOO_MANY_REQUESTS,
        CoreError::Auth(AuthFailure::InvalidResetToken) => StatusCode::BAD_REQUEST,
        CoreError::Auth(AuthFailure::InvalidCredentials) => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Integrity(_) | CoreError::PasswordHash(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
        CoreError::Remote(_) => StatusCode::SERVICE_UNAVAILABLE,
      },
    }
  }
}

impl From<AuthFailure> for ApiError {
  fn from(failure: AuthFailure) -> Self { Self::Core(CoreError::Auth(failure)) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"roster\""),
      );
    }
    res
  }
}
