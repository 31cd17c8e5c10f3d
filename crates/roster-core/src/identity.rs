//! Identity-provider abstraction, principals, and the identity resolver that
//! maps an authenticated email to its employee record.

use std::{collections::BTreeMap, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  Error, Result,
  employee::Employee,
  notify::{Delivery, Notifier, Template},
  password::validate_password,
  store::EmployeeStore,
};

/// Display name used when a principal has no employee profile.
pub const GUEST_DISPLAY_NAME: &str = "Guest User";

// ─── Accounts ────────────────────────────────────────────────────────────────

/// An identity-provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub account_id: Uuid,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

/// Why the identity provider refused a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
  #[error("invalid credentials")]
  InvalidCredentials,
  #[error("too many failed attempts; try again later")]
  TooManyAttempts,
  #[error("password reset token is invalid or expired")]
  InvalidResetToken,
}

/// Result of a credential check: the value, or the reason it was refused.
pub type AuthOutcome<T> = std::result::Result<T, AuthFailure>;

/// A single-use password reset token issued by the identity provider.
#[derive(Debug, Clone)]
pub struct PasswordReset {
  pub account_id: Uuid,
  pub email:      String,
  /// Plaintext token; only its digest is persisted.
  pub token:      String,
  pub expires_at: DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the authentication service.
///
/// Credential refusals are reported in-band as [`AuthFailure`]; the
/// associated `Error` is reserved for the provider itself failing.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether any account is registered for `email`.
  fn account_exists<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Create an account. Returns `None` if the email is already in use.
  fn create_account<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<AuthOutcome<Account>, Self::Error>> + Send + 'a;

  /// Issue a reset token. Returns `None` if no account has this email.
  fn send_password_reset<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<PasswordReset>, Self::Error>> + Send + 'a;

  /// Consume a reset token and set a new password.
  fn complete_password_reset<'a>(
    &'a self,
    token: &'a str,
    new_password: &'a str,
  ) -> impl Future<Output = Result<AuthOutcome<()>, Self::Error>> + Send + 'a;

  /// Replace the password after re-checking the current one.
  fn change_password<'a>(
    &'a self,
    email: &'a str,
    current_password: &'a str,
    new_password: &'a str,
  ) -> impl Future<Output = Result<AuthOutcome<()>, Self::Error>> + Send + 'a;
}

// ─── Principals ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Employee,
}

/// The authenticated actor behind a request.
#[derive(Debug, Clone)]
pub struct Principal {
  pub account: Account,
  pub role:    Role,
}

impl Principal {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// What an authenticated email maps to in the employee store.
#[derive(Debug, Clone)]
pub enum ResolvedIdentity {
  Employee(Box<Employee>),
  /// No employee profile exists; the principal may read but not write.
  Guest,
}

impl ResolvedIdentity {
  pub fn display_name(&self) -> String {
    match self {
      Self::Employee(e) => e.display_name(),
      Self::Guest => GUEST_DISPLAY_NAME.to_owned(),
    }
  }

  pub fn employee(&self) -> Option<&Employee> {
    match self {
      Self::Employee(e) => Some(e),
      Self::Guest => None,
    }
  }

  /// The employee record, or [`Error::Forbidden`] for a guest.
  pub fn into_employee(self) -> Result<Employee> {
    match self {
      Self::Employee(e) => Ok(*e),
      Self::Guest => Err(Error::Forbidden("no employee profile".into())),
    }
  }
}

/// Look up the single employee whose email equals `email` exactly.
///
/// More than one match means the store has lost its email uniqueness and is
/// reported as [`Error::Integrity`].
pub async fn resolve_employee<S: EmployeeStore>(
  store: &S,
  email: &str,
) -> Result<ResolvedIdentity> {
  let mut matches = store
    .find_employees_by_email(email)
    .await
    .map_err(Error::remote)?;

  match matches.len() {
    0 => Ok(ResolvedIdentity::Guest),
    1 => Ok(ResolvedIdentity::Employee(Box::new(matches.remove(0)))),
    n => Err(Error::Integrity(format!(
      "{n} employee records share the email {email:?}"
    ))),
  }
}

// ─── Credential operations ───────────────────────────────────────────────────

/// Change a signed-in principal's password at the identity provider.
pub async fn change_password<I: IdentityProvider>(
  identity: &I,
  email: &str,
  current_password: &str,
  new_password: &str,
) -> Result<()> {
  validate_password(new_password)?;
  identity
    .change_password(email, current_password, new_password)
    .await
    .map_err(Error::remote)??;
  tracing::info!(email, "password changed");
  Ok(())
}

/// Issue a reset token for `email` and deliver it.
///
/// Unknown emails are not reported to the caller; the returned
/// [`Delivery`] is [`Delivery::NotAttempted`] for them.
pub async fn request_password_reset<I, N>(
  identity: &I,
  notifier: &N,
  email: &str,
) -> Result<Delivery>
where
  I: IdentityProvider,
  N: Notifier,
{
  if email.trim().is_empty() {
    return Err(Error::Validation("email is required".into()));
  }

  let Some(reset) = identity
    .send_password_reset(email)
    .await
    .map_err(Error::remote)?
  else {
    tracing::info!(email, "password reset requested for unknown email");
    return Ok(Delivery::NotAttempted);
  };

  let variables = BTreeMap::from([
    ("to_email".to_owned(), reset.email.clone()),
    ("reset_token".to_owned(), reset.token),
    ("expires_at".to_owned(), reset.expires_at.to_rfc3339()),
  ]);

  Ok(Delivery::attempt(notifier, Template::PasswordReset, &reset.email, &variables).await)
}

pub async fn complete_password_reset<I: IdentityProvider>(
  identity: &I,
  token: &str,
  new_password: &str,
) -> Result<()> {
  validate_password(new_password)?;
  identity
    .complete_password_reset(token, new_password)
    .await
    .map_err(Error::remote)??;
  Ok(())
}
