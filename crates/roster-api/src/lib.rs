//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any store that is both an
//! [`EmployeeStore`] and an [`IdentityProvider`]. Requests authenticate with
//! HTTP Basic credentials checked against the identity provider; TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = roster_api::api_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod attendance;
pub mod auth;
pub mod employees;
pub mod error;
pub mod extract;
pub mod leave;
pub mod mailer;
pub mod me;
pub mod password;
pub mod salary;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use chrono::{DateTime, FixedOffset, Offset as _, Utc};
use roster_core::{identity::IdentityProvider, store::EmployeeStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use mailer::{MailConfig, Mailer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Settings the API layer needs at request time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
  /// Accounts with these emails are admins; everyone else is an employee.
  #[serde(default)]
  pub admin_emails:       Vec<String>,
  /// Offset of the canonical timezone from UTC. Attendance dates are
  /// calendar days in this zone.
  #[serde(default)]
  pub utc_offset_minutes: i32,
}

impl ApiConfig {
  /// Whether `email` is listed in `admin_emails`. Matching is exact, like
  /// account and employee lookup.
  pub fn is_admin(&self, email: &str) -> bool {
    self.admin_emails.iter().any(|admin| admin == email)
  }

  /// The canonical timezone; out-of-range offsets fall back to UTC.
  pub fn timezone(&self) -> FixedOffset {
    FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| {
      tracing::warn!(minutes = self.utc_offset_minutes, "invalid utc offset, using UTC");
      Utc.fix()
    })
  }

  /// The current instant in the canonical timezone.
  pub fn now_local(&self) -> DateTime<FixedOffset> { Utc::now().with_timezone(&self.timezone()) }
}

// ─── Application state ────────────────────────────────────────────────────────

/// A store that plays both the document-store and identity-provider roles.
pub trait Backend: EmployeeStore + IdentityProvider + 'static {}

impl<T: EmployeeStore + IdentityProvider + 'static> Backend for T {}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
  pub mailer: Arc<Mailer>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      config: self.config.clone(),
      mailer: self.mailer.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be served directly or nested into any parent
/// router regardless of its own state type.
pub fn api_router<S: Backend>(state: AppState<S>) -> Router<()> {
  Router::new()
    // Self-service
    .route("/me", get(me::whoami::<S>))
    .route("/me/profile", put(me::update_profile::<S>))
    .route("/me/password", post(me::change_password::<S>))
    .route("/me/attendance", get(me::attendance_history::<S>).post(me::mark_attendance::<S>))
    .route("/me/leave", get(me::leave_requests::<S>).post(me::submit_leave::<S>))
    .route("/me/salary", get(me::current_salary::<S>))
    // Administration
    .route("/dashboard", get(employees::dashboard::<S>))
    .route("/employees", get(employees::list::<S>).put(employees::upsert::<S>))
    .route("/employees/{id}", get(employees::get_one::<S>))
    .route("/attendance", get(attendance::report::<S>))
    .route("/leave", get(leave::list::<S>))
    .route("/employees/{id}/leave/{leave_id}/decision", post(leave::decide::<S>))
    .route("/employees/{id}/salary", get(salary::current::<S>).put(salary::upsert::<S>))
    .route("/employees/{id}/salary/history", get(salary::history::<S>))
    // Password recovery
    .route("/auth/password-reset", post(password::request_reset::<S>))
    .route("/auth/password-reset/complete", post(password::complete_reset::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
