//! HTTP Basic-auth extractors.
//!
//! Credentials are checked by the identity provider on every request; there
//! are no sessions. The principal's role comes from the `admin_emails`
//! setting.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use roster_core::{
  Error as CoreError,
  identity::{Principal, Role},
};

use crate::{AppState, Backend, error::ApiError};

/// The authenticated principal behind a request.
pub struct Authenticated(pub Principal);

/// An authenticated principal with the admin role.
pub struct AdminOnly(pub Principal);

/// Split an `Authorization: Basic …` header into email and password.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthenticated)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthenticated)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthenticated)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthenticated)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthenticated)?;
  Ok((email.to_owned(), password.to_owned()))
}

impl<S: Backend> FromRequestParts<AppState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;

    let account = state
      .store
      .sign_in(&email, &password)
      .await
      .map_err(ApiError::remote)?
      .inspect_err(|failure| tracing::info!(%email, %failure, "sign-in refused"))?;

    let role = if state.config.is_admin(&account.email) {
      Role::Admin
    } else {
      Role::Employee
    };
    Ok(Authenticated(Principal { account, role }))
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for AdminOnly {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Authenticated(principal) = Authenticated::from_request_parts(parts, state).await?;
    if !principal.is_admin() {
      return Err(CoreError::Forbidden("admin role required".into()).into());
    }
    Ok(AdminOnly(principal))
  }
}
