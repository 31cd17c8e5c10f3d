//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings and calendar
//! dates as `YYYY-MM-DD`, so lexical order equals chronological order. Money is stored
//! as decimal strings. The employee profile is stored as compact JSON.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use roster_core::{
  attendance::{AttendanceRecord, AttendanceStatus},
  employee::{Employee, EmploymentType, Profile},
  identity::Account,
  leave::{LeaveRequest, LeaveStatus},
  salary::SalaryRecord,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_variant<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownVariant { kind, value: s.to_owned() })
}

pub fn decode_attendance_status(s: &str) -> Result<AttendanceStatus> {
  decode_variant("attendance status", s)
}

pub fn decode_leave_status(s: &str) -> Result<LeaveStatus> { decode_variant("leave status", s) }

pub fn encode_employment_type(t: EmploymentType) -> &'static str { t.as_str() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `employees` row.
pub struct RawEmployee {
  pub employee_id:   String,
  pub uid:           String,
  pub email:         String,
  pub profile_json:  String,
  pub password_hash: Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

/// Column list matching [`RawEmployee::from_row`].
pub const EMPLOYEE_COLUMNS: &str =
  "employee_id, uid, email, profile_json, password_hash, created_at, updated_at";

impl RawEmployee {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id:   row.get(0)?,
      uid:           row.get(1)?,
      email:         row.get(2)?,
      profile_json:  row.get(3)?,
      password_hash: row.get(4)?,
      created_at:    row.get(5)?,
      updated_at:    row.get(6)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    let profile: Profile = serde_json::from_str(&self.profile_json)?;
    Ok(Employee {
      employee_id: decode_uuid(&self.employee_id)?,
      uid: decode_uuid(&self.uid)?,
      email: self.email,
      profile,
      password_hash: self.password_hash,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from an `attendance` row.
pub struct RawAttendance {
  pub attendance_id: String,
  pub employee_id:   String,
  pub date:          String,
  pub status:        String,
  pub time:          String,
  pub captured_at:   String,
}

pub const ATTENDANCE_COLUMNS: &str =
  "attendance_id, employee_id, date, status, time, captured_at";

impl RawAttendance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendance_id: row.get(0)?,
      employee_id:   row.get(1)?,
      date:          row.get(2)?,
      status:        row.get(3)?,
      time:          row.get(4)?,
      captured_at:   row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      attendance_id: decode_uuid(&self.attendance_id)?,
      employee_id:   decode_uuid(&self.employee_id)?,
      date:          decode_date(&self.date)?,
      status:        decode_attendance_status(&self.status)?,
      time:          self.time,
      captured_at:   decode_dt(&self.captured_at)?,
    })
  }
}

/// Raw strings read directly from a `leave_requests` row.
pub struct RawLeave {
  pub leave_id:    String,
  pub employee_id: String,
  pub start_date:  String,
  pub end_date:    String,
  pub reason:      String,
  pub status:      String,
  pub created_at:  String,
  pub reviewed_at: Option<String>,
}

pub const LEAVE_COLUMNS: &str =
  "leave_id, employee_id, start_date, end_date, reason, status, created_at, reviewed_at";

impl RawLeave {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      leave_id:    row.get(0)?,
      employee_id: row.get(1)?,
      start_date:  row.get(2)?,
      end_date:    row.get(3)?,
      reason:      row.get(4)?,
      status:      row.get(5)?,
      created_at:  row.get(6)?,
      reviewed_at: row.get(7)?,
    })
  }

  pub fn into_request(self) -> Result<LeaveRequest> {
    Ok(LeaveRequest {
      leave_id:    decode_uuid(&self.leave_id)?,
      employee_id: decode_uuid(&self.employee_id)?,
      start_date:  decode_date(&self.start_date)?,
      end_date:    decode_date(&self.end_date)?,
      reason:      self.reason,
      status:      decode_leave_status(&self.status)?,
      created_at:  decode_dt(&self.created_at)?,
      reviewed_at: self.reviewed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read from `salary_current` or `salary_history`.
pub struct RawSalary {
  pub employee_id:       String,
  pub basic_salary:      String,
  pub allowances:        String,
  pub deductions:        String,
  pub in_hand_salary:    String,
  pub pay_date:          String,
  pub increment_percent: String,
  pub updated_at:        String,
}

/// Shared by both salary tables.
pub const SALARY_COLUMNS: &str = "employee_id, basic_salary, allowances, deductions, \
   in_hand_salary, pay_date, increment_percent, updated_at";

impl RawSalary {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id:       row.get(0)?,
      basic_salary:      row.get(1)?,
      allowances:        row.get(2)?,
      deductions:        row.get(3)?,
      in_hand_salary:    row.get(4)?,
      pay_date:          row.get(5)?,
      increment_percent: row.get(6)?,
      updated_at:        row.get(7)?,
    })
  }

  /// Encode `record` for insertion; field order matches [`SALARY_COLUMNS`].
  pub fn from_record(record: &SalaryRecord) -> Self {
    Self {
      employee_id:       encode_uuid(record.employee_id),
      basic_salary:      encode_decimal(record.basic_salary),
      allowances:        encode_decimal(record.allowances),
      deductions:        encode_decimal(record.deductions),
      in_hand_salary:    encode_decimal(record.in_hand_salary),
      pay_date:          encode_date(record.pay_date),
      increment_percent: encode_decimal(record.increment_percent),
      updated_at:        encode_dt(record.updated_at),
    }
  }

  pub fn into_record(self) -> Result<SalaryRecord> {
    Ok(SalaryRecord {
      employee_id:       decode_uuid(&self.employee_id)?,
      basic_salary:      decode_decimal(&self.basic_salary)?,
      allowances:        decode_decimal(&self.allowances)?,
      deductions:        decode_decimal(&self.deductions)?,
      in_hand_salary:    decode_decimal(&self.in_hand_salary)?,
      pay_date:          decode_date(&self.pay_date)?,
      increment_percent: decode_decimal(&self.increment_percent)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:      String,
  pub email:           String,
  pub password_hash:   String,
  pub created_at:      String,
  pub failed_attempts: u32,
  pub locked_until:    Option<String>,
}

pub const ACCOUNT_COLUMNS: &str =
  "account_id, email, password_hash, created_at, failed_attempts, locked_until";

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:      row.get(0)?,
      email:           row.get(1)?,
      password_hash:   row.get(2)?,
      created_at:      row.get(3)?,
      failed_attempts: row.get(4)?,
      locked_until:    row.get(5)?,
    })
  }

  pub fn account(&self) -> Result<Account> {
    Ok(Account {
      account_id: decode_uuid(&self.account_id)?,
      email:      self.email.clone(),
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn locked_until(&self) -> Result<Option<DateTime<Utc>>> {
    self.locked_until.as_deref().map(decode_dt).transpose()
  }
}
