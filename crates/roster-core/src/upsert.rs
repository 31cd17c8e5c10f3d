//! The employee upsert: create-or-update keyed by email.
//!
//! Creation goes through the identity provider first so the new record can
//! carry the account id as its `uid`. Updates merge the candidate profile
//! into the stored one and never touch the identity provider.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  employee::{Employee, Profile},
  identity::{IdentityProvider, ResolvedIdentity, resolve_employee},
  notify::{Delivery, Notifier, Template},
  password::{hash_password, validate_password},
  store::EmployeeStore,
};

/// Candidate data for an upsert.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpsertRequest {
  /// Lookup key.
  pub email:    String,
  /// Mandatory when creating; optional when updating. Empty counts as
  /// absent.
  #[serde(default)]
  pub password: Option<String>,
  #[serde(default)]
  pub profile:  Profile,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpsertOutcome {
  pub employee: Employee,
  pub created:  bool,
  /// Welcome notification result; [`Delivery::NotAttempted`] on update.
  pub welcome:  Delivery,
}

/// Create the employee for `request.email`, or merge into the existing one.
pub async fn upsert_employee<S, I, N>(
  store: &S,
  identity: &I,
  notifier: &N,
  request: UpsertRequest,
  now: DateTime<Utc>,
) -> Result<UpsertOutcome>
where
  S: EmployeeStore,
  I: IdentityProvider,
  N: Notifier,
{
  if request.email.trim().is_empty() {
    return Err(Error::Validation("email is required".into()));
  }

  let UpsertRequest { email, password, profile } = request;
  let password = password.filter(|p| !p.is_empty());

  match resolve_employee(store, &email).await? {
    ResolvedIdentity::Guest => {
      create(store, identity, notifier, email, password, profile, now).await
    }
    ResolvedIdentity::Employee(existing) => {
      update(store, *existing, password, profile, now).await
    }
  }
}

async fn create<S, I, N>(
  store: &S,
  identity: &I,
  notifier: &N,
  email: String,
  password: Option<String>,
  profile: Profile,
  now: DateTime<Utc>,
) -> Result<UpsertOutcome>
where
  S: EmployeeStore,
  I: IdentityProvider,
  N: Notifier,
{
  let password = password
    .ok_or_else(|| Error::Validation("password is required for a new employee".into()))?;
  validate_password(&password)?;

  let email_in_use = || {
    Error::Conflict(format!(
      "an account for {email} exists without an employee record"
    ))
  };

  if identity
    .account_exists(&email)
    .await
    .map_err(Error::remote)?
  {
    return Err(email_in_use());
  }

  let password_hash = hash_password(&password)?;

  let account = identity
    .create_account(&email, &password)
    .await
    .map_err(Error::remote)?
    .ok_or_else(email_in_use)?;

  let employee = Employee {
    employee_id: account.account_id,
    uid: account.account_id,
    email: email.clone(),
    profile,
    password_hash: Some(password_hash),
    created_at: now,
    updated_at: now,
  };

  if let Err(e) = store.insert_employee(employee.clone()).await {
    tracing::error!(%email, account_id = %account.account_id, error = %e, "account created but employee write failed");
    return Err(Error::remote(e));
  }
  tracing::info!(%email, employee_id = %employee.employee_id, "employee created");

  let variables = BTreeMap::from([
    ("to_email".to_owned(), email.clone()),
    ("employee_email".to_owned(), email.clone()),
    ("employee_password".to_owned(), password),
  ]);
  let welcome = Delivery::attempt(notifier, Template::Welcome, &email, &variables).await;

  Ok(UpsertOutcome { employee, created: true, welcome })
}

async fn update<S: EmployeeStore>(
  store: &S,
  mut employee: Employee,
  password: Option<String>,
  profile: Profile,
  now: DateTime<Utc>,
) -> Result<UpsertOutcome> {
  if let Some(password) = password {
    validate_password(&password)?;
    employee.password_hash = Some(hash_password(&password)?);
    tracing::warn!(
      email = %employee.email,
      "stored password hash replaced; identity-provider credential left unchanged"
    );
  }

  employee.profile.merge(profile);
  employee.updated_at = now;

  store
    .update_employee(employee.clone())
    .await
    .map_err(Error::remote)?;
  tracing::info!(email = %employee.email, employee_id = %employee.employee_id, "employee updated");

  Ok(UpsertOutcome { employee, created: false, welcome: Delivery::NotAttempted })
}

#[cfg(test)]
mod tests {
  use std::{
    convert::Infallible,
    sync::atomic::{AtomicUsize, Ordering},
  };

  use chrono::NaiveDate;
  use uuid::Uuid;

  use super::*;
  use crate::{
    attendance::{AttendanceQuery, AttendanceRecord},
    employee::EmployeeQuery,
    identity::{Account, AuthFailure, AuthOutcome, PasswordReset},
    leave::{LeaveQuery, LeaveRequest},
    notify::DeliveryReceipt,
    salary::SalaryRecord,
  };

  /// A store whose email index has lost uniqueness.
  struct SharedEmailStore {
    employees: Vec<Employee>,
    writes:    AtomicUsize,
  }

  impl SharedEmailStore {
    fn with_copies(email: &str, copies: usize) -> Self {
      let employees = (0..copies)
        .map(|_| {
          let id = Uuid::new_v4();
          Employee {
            employee_id: id,
            uid: id,
            email: email.to_owned(),
            profile: Profile::default(),
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
          }
        })
        .collect();
      Self { employees, writes: AtomicUsize::new(0) }
    }
  }

  impl EmployeeStore for SharedEmailStore {
    type Error = Infallible;

    async fn find_employees_by_email(&self, email: &str) -> Result<Vec<Employee>, Infallible> {
      Ok(self.employees.iter().filter(|e| e.email == email).cloned().collect())
    }

    async fn get_employee(&self, employee_id: Uuid) -> Result<Option<Employee>, Infallible> {
      Ok(self.employees.iter().find(|e| e.employee_id == employee_id).cloned())
    }

    async fn list_employees(&self, _query: &EmployeeQuery) -> Result<Vec<Employee>, Infallible> {
      Ok(self.employees.clone())
    }

    async fn insert_employee(&self, _employee: Employee) -> Result<(), Infallible> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }

    async fn update_employee(&self, _employee: Employee) -> Result<(), Infallible> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }

    async fn find_attendance(
      &self,
      _employee_id: Uuid,
      _date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, Infallible> {
      Ok(None)
    }

    async fn insert_attendance(&self, _record: AttendanceRecord) -> Result<bool, Infallible> {
      Ok(true)
    }

    async fn list_attendance(
      &self,
      _query: &AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, Infallible> {
      Ok(Vec::new())
    }

    async fn insert_leave(&self, _request: LeaveRequest) -> Result<(), Infallible> { Ok(()) }

    async fn get_leave(
      &self,
      _employee_id: Uuid,
      _leave_id: Uuid,
    ) -> Result<Option<LeaveRequest>, Infallible> {
      Ok(None)
    }

    async fn update_leave(&self, _request: LeaveRequest) -> Result<(), Infallible> { Ok(()) }

    async fn list_leave(&self, _query: &LeaveQuery) -> Result<Vec<LeaveRequest>, Infallible> {
      Ok(Vec::new())
    }

    async fn current_salary(&self, _employee_id: Uuid) -> Result<Option<SalaryRecord>, Infallible> {
      Ok(None)
    }

    async fn record_salary(&self, _record: SalaryRecord) -> Result<(), Infallible> { Ok(()) }

    async fn salary_history(&self, _employee_id: Uuid) -> Result<Vec<SalaryRecord>, Infallible> {
      Ok(Vec::new())
    }
  }

  /// Counts every call; refuses everything.
  #[derive(Default)]
  struct CountingIdentity {
    calls: AtomicUsize,
  }

  impl CountingIdentity {
    fn touch(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }
  }

  impl IdentityProvider for CountingIdentity {
    type Error = Infallible;

    async fn account_exists(&self, _email: &str) -> Result<bool, Infallible> {
      self.touch();
      Ok(false)
    }

    async fn create_account(
      &self,
      _email: &str,
      _password: &str,
    ) -> Result<Option<Account>, Infallible> {
      self.touch();
      Ok(None)
    }

    async fn sign_in(
      &self,
      _email: &str,
      _password: &str,
    ) -> Result<AuthOutcome<Account>, Infallible> {
      self.touch();
      Ok(Err(AuthFailure::InvalidCredentials))
    }

    async fn send_password_reset(&self, _email: &str) -> Result<Option<PasswordReset>, Infallible> {
      self.touch();
      Ok(None)
    }

    async fn complete_password_reset(
      &self,
      _token: &str,
      _new_password: &str,
    ) -> Result<AuthOutcome<()>, Infallible> {
      self.touch();
      Ok(Err(AuthFailure::InvalidResetToken))
    }

    async fn change_password(
      &self,
      _email: &str,
      _current_password: &str,
      _new_password: &str,
    ) -> Result<AuthOutcome<()>, Infallible> {
      self.touch();
      Ok(Err(AuthFailure::InvalidCredentials))
    }
  }

  struct SilentNotifier;

  impl Notifier for SilentNotifier {
    type Error = Infallible;

    async fn send(
      &self,
      _template: Template,
      _recipient: &str,
      _variables: &BTreeMap<String, String>,
    ) -> Result<DeliveryReceipt, Infallible> {
      Ok(DeliveryReceipt { provider: "silent".into(), status: "OK".into() })
    }
  }

  #[tokio::test]
  async fn shared_email_is_an_integrity_error() {
    let store = SharedEmailStore::with_copies("dup@x.com", 2);

    let err = resolve_employee(&store, "dup@x.com").await.unwrap_err();
    assert!(matches!(err, Error::Integrity(_)));

    assert!(matches!(
      resolve_employee(&store, "other@x.com").await,
      Ok(ResolvedIdentity::Guest)
    ));
  }

  #[tokio::test]
  async fn upsert_stops_on_shared_email() {
    let store = SharedEmailStore::with_copies("dup@x.com", 2);
    let identity = CountingIdentity::default();
    let request = UpsertRequest {
      email:    "dup@x.com".into(),
      password: Some("secret1".into()),
      profile:  Profile::default(),
    };

    let err = upsert_employee(&store, &identity, &SilentNotifier, request, Utc::now())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Integrity(_)));
    assert_eq!(identity.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn request_rejects_unknown_fields() {
    let json = r#"{"email":"a@x.com","role":"admin"}"#;
    assert!(serde_json::from_str::<UpsertRequest>(json).is_err());
  }

  #[test]
  fn request_defaults_optional_parts() {
    let req: UpsertRequest = serde_json::from_str(r#"{"email":"a@x.com"}"#).unwrap();
    assert!(req.password.is_none());
    assert_eq!(req.profile, Profile::default());
  }
}
