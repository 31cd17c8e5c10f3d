//! Error types for `roster-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::{identity::AuthFailure, leave::LeaveStatus};

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or malformed input, detected before any remote call.
  #[error("validation failed: {0}")]
  Validation(String),

  /// The identity provider and the document store disagree on existence.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("attendance already marked for employee {employee_id} on {date}")]
  DuplicateAttendance { employee_id: Uuid, date: NaiveDate },

  #[error("leave request cannot move from {from} to {to}")]
  InvalidTransition { from: LeaveStatus, to: LeaveStatus },

  #[error("authentication failed: {0}")]
  Auth(#[from] AuthFailure),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// The store holds data that breaks an invariant, e.g. two employees
  /// sharing one email address.
  #[error("data integrity violation: {0}")]
  Integrity(String),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  /// A collaborator (store, identity provider, notifier) failed.
  #[error("remote collaborator unavailable: {0}")]
  Remote(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a collaborator error into [`Error::Remote`].
  pub fn remote(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Remote(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
