//! Attendance records and the one-entry-per-day guard.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::EmployeeStore};

// ─── Types ───────────────────────────────────────────────────────────────────

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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceStatus {
  Present,
  Absent,
  Late,
  HalfDay,
}

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub attendance_id: Uuid,
  pub employee_id:   Uuid,
  pub date:          NaiveDate,
  pub status:        AttendanceStatus,
  /// Local wall-clock time of marking, `HH:MM`.
  pub time:          String,
  pub captured_at:   DateTime<Utc>,
}

/// Parameters for [`EmployeeStore::list_attendance`]. Both bounds inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceQuery {
  pub employee_id: Option<Uuid>,
  pub from:        Option<NaiveDate>,
  pub to:          Option<NaiveDate>,
}

impl AttendanceQuery {
  pub fn validate(&self) -> Result<()> {
    if let (Some(from), Some(to)) = (self.from, self.to)
      && from > to
    {
      return Err(Error::Validation(format!(
        "range start {from} is after range end {to}"
      )));
    }
    Ok(())
  }

  pub fn contains(&self, record: &AttendanceRecord) -> bool {
    self.employee_id.is_none_or(|id| id == record.employee_id)
      && self.from.is_none_or(|from| record.date >= from)
      && self.to.is_none_or(|to| record.date <= to)
  }
}

// ─── Marking ─────────────────────────────────────────────────────────────────

/// Mark attendance for the calendar day of `now`.
///
/// `now` carries the canonical timezone; its local date is the attendance
/// date, so backdating is impossible through this path. The store write is
/// conditional on (employee, date), so a concurrent duplicate loses with
/// [`Error::DuplicateAttendance`] just like a sequential one.
pub async fn mark_attendance<S: EmployeeStore>(
  store: &S,
  employee_id: Uuid,
  status: AttendanceStatus,
  now: DateTime<FixedOffset>,
) -> Result<AttendanceRecord> {
  let date = now.date_naive();

  if store
    .get_employee(employee_id)
    .await
    .map_err(Error::remote)?
    .is_none()
  {
    return Err(Error::NotFound(format!("employee {employee_id}")));
  }

  let duplicate = || Error::DuplicateAttendance { employee_id, date };

  if store
    .find_attendance(employee_id, date)
    .await
    .map_err(Error::remote)?
    .is_some()
  {
    return Err(duplicate());
  }

  let record = AttendanceRecord {
    attendance_id: Uuid::new_v4(),
    employee_id,
    date,
    status,
    time: now.format("%H:%M").to_string(),
    captured_at: now.with_timezone(&Utc),
  };

  let inserted = store
    .insert_attendance(record.clone())
    .await
    .map_err(Error::remote)?;
  if !inserted {
    return Err(duplicate());
  }

  tracing::info!(%employee_id, %date, %status, "attendance marked");
  Ok(record)
}

/// An employee's own history, newest day first.
pub async fn attendance_history<S: EmployeeStore>(
  store: &S,
  employee_id: Uuid,
) -> Result<Vec<AttendanceRecord>> {
  let query = AttendanceQuery { employee_id: Some(employee_id), ..Default::default() };
  let mut records = store.list_attendance(&query).await.map_err(Error::remote)?;
  records.sort_by(|a, b| b.date.cmp(&a.date));
  Ok(records)
}

// ─── Reporting ───────────────────────────────────────────────────────────────

/// Per-status tallies within a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
  pub present:  usize,
  pub absent:   usize,
  pub late:     usize,
  pub half_day: usize,
}

impl StatusCounts {
  fn add(&mut self, status: AttendanceStatus) {
    match status {
      AttendanceStatus::Present => self.present += 1,
      AttendanceStatus::Absent => self.absent += 1,
      AttendanceStatus::Late => self.late += 1,
      AttendanceStatus::HalfDay => self.half_day += 1,
    }
  }
}

/// One employee's slice of an attendance report.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeAttendance {
  pub employee_id:   Uuid,
  pub employee_name: String,
  pub counts:        StatusCounts,
  /// Oldest day first.
  pub records:       Vec<AttendanceRecord>,
}

/// Attendance in a date range grouped by employee. Employees without any
/// record in the range are omitted.
pub async fn attendance_report<S: EmployeeStore>(
  store: &S,
  query: &AttendanceQuery,
) -> Result<Vec<EmployeeAttendance>> {
  query.validate()?;

  let records = store.list_attendance(query).await.map_err(Error::remote)?;

  let mut grouped: BTreeMap<Uuid, Vec<AttendanceRecord>> = BTreeMap::new();
  for record in records {
    grouped.entry(record.employee_id).or_default().push(record);
  }

  let mut report = Vec::with_capacity(grouped.len());
  for (employee_id, mut records) in grouped {
    records.sort_by(|a, b| a.date.cmp(&b.date));

    let mut counts = StatusCounts::default();
    for r in &records {
      counts.add(r.status);
    }

    let employee_name = store
      .get_employee(employee_id)
      .await
      .map_err(Error::remote)?
      .map(|e| e.display_name())
      .unwrap_or_else(|| "Unknown".to_owned());

    report.push(EmployeeAttendance { employee_id, employee_name, counts, records });
  }

  report.sort_by(|a, b| a.employee_name.cmp(&b.employee_name));
  Ok(report)
}
