//! Unauthenticated password recovery.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/password-reset` | Body: `{"email"}`; always `202` |
//! | `POST` | `/auth/password-reset/complete` | Body: `{"token","new_password"}` |

use axum::{extract::State, http::StatusCode};
use roster_core::identity::{complete_password_reset, request_password_reset};
use serde::Deserialize;

use crate::{AppState, Backend, error::ApiError, extract::ApiJson};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetRequest {
  pub email: String,
}

/// `POST /auth/password-reset`
///
/// Whether the email is registered, and whether the message went out, are
/// not disclosed.
pub async fn request_reset<S: Backend>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<ResetRequest>,
) -> Result<StatusCode, ApiError> {
  request_password_reset(state.store.as_ref(), state.mailer.as_ref(), &body.email).await?;
  Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetCompletion {
  pub token:        String,
  pub new_password: String,
}

/// `POST /auth/password-reset/complete`
pub async fn complete_reset<S: Backend>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<ResetCompletion>,
) -> Result<StatusCode, ApiError> {
  complete_password_reset(state.store.as_ref(), &body.token, &body.new_password).await?;
  Ok(StatusCode::NO_CONTENT)
}
