//! Leave requests and their status state machine.
//!
//! ```text
//!             ┌──────────► approved ◄─┐
//!   pending ──┤                       │ reversal
//!             └──────────► rejected ◄─┘
//! ```
//!
//! Nothing ever returns to `pending`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::EmployeeStore};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
  Pending,
  Approved,
  Rejected,
}

impl LeaveStatus {
  /// Whether a review may move a request from `self` to `next`.
  ///
  /// Re-applying the current decision is allowed and refreshes the review
  /// time.
  pub fn can_become(self, next: LeaveStatus) -> bool {
    !matches!(next, LeaveStatus::Pending)
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// A leave request owned by one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
  pub leave_id:    Uuid,
  pub employee_id: Uuid,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
  pub reason:      String,
  pub status:      LeaveStatus,
  pub created_at:  DateTime<Utc>,
  /// Set by every admin decision; `None` while pending.
  pub reviewed_at: Option<DateTime<Utc>>,
}

/// Input for a new leave request. Fields are optional so that a missing one
/// surfaces as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewLeave {
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
  pub reason:     Option<String>,
}

impl LeaveRequest {
  /// Validate `input` and open a pending request.
  pub fn open(employee_id: Uuid, input: NewLeave, now: DateTime<Utc>) -> Result<Self> {
    let (Some(start_date), Some(end_date)) = (input.start_date, input.end_date) else {
      return Err(Error::Validation("start and end dates are required".into()));
    };
    let reason = input
      .reason
      .map(|r| r.trim().to_owned())
      .filter(|r| !r.is_empty())
      .ok_or_else(|| Error::Validation("a reason is required".into()))?;
    if start_date > end_date {
      return Err(Error::Validation(format!(
        "end date {end_date} is before start date {start_date}"
      )));
    }

    Ok(Self {
      leave_id: Uuid::new_v4(),
      employee_id,
      start_date,
      end_date,
      reason,
      status: LeaveStatus::Pending,
      created_at: now,
      reviewed_at: None,
    })
  }

  /// Apply an admin decision.
  pub fn review(&mut self, next: LeaveStatus, at: DateTime<Utc>) -> Result<()> {
    if !self.status.can_become(next) {
      return Err(Error::InvalidTransition { from: self.status, to: next });
    }
    self.status = next;
    self.reviewed_at = Some(at);
    Ok(())
  }

  /// Inclusive length in calendar days.
  pub fn days(&self) -> i64 { (self.end_date - self.start_date).num_days() + 1 }
}

/// Parameters for [`EmployeeStore::list_leave`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaveQuery {
  pub employee_id: Option<Uuid>,
  pub status:      Option<LeaveStatus>,
}

impl LeaveQuery {
  pub fn contains(&self, request: &LeaveRequest) -> bool {
    self.employee_id.is_none_or(|id| id == request.employee_id)
      && self.status.is_none_or(|s| s == request.status)
  }
}

/// A request annotated for the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveEntry {
  #[serde(flatten)]
  pub request:       LeaveRequest,
  pub employee_name: String,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Submit a new request on behalf of `employee_id`.
///
/// Overlap with the employee's other requests is not checked.
pub async fn submit_leave<S: EmployeeStore>(
  store: &S,
  employee_id: Uuid,
  input: NewLeave,
  now: DateTime<Utc>,
) -> Result<LeaveRequest> {
  let request = LeaveRequest::open(employee_id, input, now)?;

  if store
    .get_employee(employee_id)
    .await
    .map_err(Error::remote)?
    .is_none()
  {
    return Err(Error::NotFound(format!("employee {employee_id}")));
  }

  store
    .insert_leave(request.clone())
    .await
    .map_err(Error::remote)?;

  tracing::info!(%employee_id, leave_id = %request.leave_id, days = request.days(), "leave requested");
  Ok(request)
}

/// Record an admin decision (or reversal) on a request.
pub async fn review_leave<S: EmployeeStore>(
  store: &S,
  employee_id: Uuid,
  leave_id: Uuid,
  next: LeaveStatus,
  now: DateTime<Utc>,
) -> Result<LeaveRequest> {
  let mut request = store
    .get_leave(employee_id, leave_id)
    .await
    .map_err(Error::remote)?
    .ok_or_else(|| Error::NotFound(format!("leave request {leave_id}")))?;

  let previous = request.status;
  request.review(next, now)?;

  store
    .update_leave(request.clone())
    .await
    .map_err(Error::remote)?;

  tracing::info!(%employee_id, %leave_id, from = %previous, to = %next, "leave reviewed");
  Ok(request)
}

/// Requests matching `query`, newest first, with employee names attached.
pub async fn list_leave<S: EmployeeStore>(
  store: &S,
  query: &LeaveQuery,
) -> Result<Vec<LeaveEntry>> {
  let mut requests = store.list_leave(query).await.map_err(Error::remote)?;
  requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

  let mut entries = Vec::with_capacity(requests.len());
  for request in requests {
    let employee_name = store
      .get_employee(request.employee_id)
      .await
      .map_err(Error::remote)?
      .map(|e| e.display_name())
      .unwrap_or_else(|| "Unnamed Employee".to_owned());
    entries.push(LeaveEntry { request, employee_name });
  }
  Ok(entries)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn input(start: NaiveDate, end: NaiveDate, reason: &str) -> NewLeave {
    NewLeave { start_date: Some(start), end_date: Some(end), reason: Some(reason.into()) }
  }

  fn pending() -> LeaveRequest {
    LeaveRequest::open(Uuid::new_v4(), input(day(2024, 1, 5), day(2024, 1, 10), "trip"), Utc::now())
      .unwrap()
  }

  #[test]
  fn opens_pending_without_review() {
    let r = pending();
    assert_eq!(r.status, LeaveStatus::Pending);
    assert!(r.reviewed_at.is_none());
    assert_eq!(r.days(), 6);
  }

  #[test]
  fn end_before_start_is_rejected() {
    let err = LeaveRequest::open(
      Uuid::new_v4(),
      input(day(2024, 1, 10), day(2024, 1, 5), "trip"),
      Utc::now(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn single_day_leave_is_allowed() {
    let r = LeaveRequest::open(
      Uuid::new_v4(),
      input(day(2024, 2, 1), day(2024, 2, 1), "doctor"),
      Utc::now(),
    )
    .unwrap();
    assert_eq!(r.days(), 1);
  }

  #[test]
  fn missing_fields_are_rejected() {
    let no_reason = NewLeave { reason: Some("   ".into()), ..input(day(2024, 1, 1), day(2024, 1, 2), "") };
    let no_dates = NewLeave { reason: Some("trip".into()), ..Default::default() };
    assert!(matches!(LeaveRequest::open(Uuid::new_v4(), no_reason, Utc::now()), Err(Error::Validation(_))));
    assert!(matches!(LeaveRequest::open(Uuid::new_v4(), no_dates, Utc::now()), Err(Error::Validation(_))));
  }

  #[test]
  fn decision_and_reversal_update_review_time() {
    let mut r = pending();
    let t1 = Utc::now();
    r.review(LeaveStatus::Approved, t1).unwrap();
    assert_eq!(r.status, LeaveStatus::Approved);
    assert_eq!(r.reviewed_at, Some(t1));

    let t2 = t1 + chrono::Duration::minutes(5);
    r.review(LeaveStatus::Rejected, t2).unwrap();
    assert_eq!(r.status, LeaveStatus::Rejected);
    assert_eq!(r.reviewed_at, Some(t2));

    r.review(LeaveStatus::Approved, t2).unwrap();
    assert_eq!(r.status, LeaveStatus::Approved);
  }

  #[test]
  fn never_returns_to_pending() {
    let mut r = pending();
    assert!(matches!(
      r.review(LeaveStatus::Pending, Utc::now()),
      Err(Error::InvalidTransition { from: LeaveStatus::Pending, to: LeaveStatus::Pending })
    ));

    r.review(LeaveStatus::Rejected, Utc::now()).unwrap();
    let before = r.clone();
    assert!(r.review(LeaveStatus::Pending, Utc::now()).is_err());
    assert_eq!(r, before);
  }

  #[test]
  fn status_sequence_never_contains_pending_after_decision() {
    let mut r = pending();
    let mut seen = vec![r.status];
    for next in [
      LeaveStatus::Approved,
      LeaveStatus::Pending,
      LeaveStatus::Rejected,
      LeaveStatus::Pending,
      LeaveStatus::Approved,
    ] {
      let _ = r.review(next, Utc::now());
      seen.push(r.status);
    }
    let first_decision = seen.iter().position(|s| *s != LeaveStatus::Pending).unwrap();
    assert!(seen[first_decision..].iter().all(|s| *s != LeaveStatus::Pending));
  }
}
