//! [`SqliteStore`] — the SQLite implementation of [`EmployeeStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use roster_core::{
  attendance::{AttendanceQuery, AttendanceRecord},
  employee::{Employee, EmployeeQuery},
  leave::{LeaveQuery, LeaveRequest},
  salary::SalaryRecord,
  store::EmployeeStore,
};

use crate::{
  Error, Result,
  encode::{
    ATTENDANCE_COLUMNS, EMPLOYEE_COLUMNS, LEAVE_COLUMNS, RawAttendance, RawEmployee, RawLeave,
    RawSalary, SALARY_COLUMNS, encode_date, encode_dt, encode_employment_type, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Roster store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── EmployeeStore impl ──────────────────────────────────────────────────────

impl EmployeeStore for SqliteStore {
  type Error = Error;

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn find_employees_by_email(&self, email: &str) -> Result<Vec<Employee>> {
    let email = email.to_owned();

    let raws: Vec<RawEmployee> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![email], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmployee::into_employee).collect()
  }

  async fn get_employee(&self, employee_id: Uuid) -> Result<Option<Employee>> {
    let id_str = encode_uuid(employee_id);

    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1"),
              rusqlite::params![id_str],
              RawEmployee::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_employees(&self, query: &EmployeeQuery) -> Result<Vec<Employee>> {
    // The employment type is a real column; free text is matched in Rust
    // against the decoded profile.
    let type_str = query.employment_type.map(encode_employment_type);

    let raws: Vec<RawEmployee> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees
           WHERE (?1 IS NULL OR employment_type = ?1)
           ORDER BY created_at, email"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![type_str], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let employees = raws
      .into_iter()
      .map(RawEmployee::into_employee)
      .collect::<Result<Vec<_>>>()?;

    Ok(employees.into_iter().filter(|e| query.accepts(e)).collect())
  }

  async fn insert_employee(&self, employee: Employee) -> Result<()> {
    let id_str       = encode_uuid(employee.employee_id);
    let uid_str      = encode_uuid(employee.uid);
    let type_str     = employee.profile.employment_type.map(encode_employment_type);
    let profile_json = serde_json::to_string(&employee.profile)?;
    let created_str  = encode_dt(employee.created_at);
    let updated_str  = encode_dt(employee.updated_at);
    let email        = employee.email;
    let hash         = employee.password_hash;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees (
             employee_id, uid, email, employment_type, profile_json,
             password_hash, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            uid_str,
            email,
            type_str,
            profile_json,
            hash,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn update_employee(&self, employee: Employee) -> Result<()> {
    let id_str       = encode_uuid(employee.employee_id);
    let type_str     = employee.profile.employment_type.map(encode_employment_type);
    let profile_json = serde_json::to_string(&employee.profile)?;
    let updated_str  = encode_dt(employee.updated_at);
    let hash         = employee.password_hash;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE employees
           SET employment_type = ?2, profile_json = ?3, password_hash = ?4, updated_at = ?5
           WHERE employee_id = ?1",
          rusqlite::params![id_str, type_str, profile_json, hash, updated_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::EmployeeNotFound(employee.employee_id));
    }
    Ok(())
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn find_attendance(
    &self,
    employee_id: Uuid,
    date: NaiveDate,
  ) -> Result<Option<AttendanceRecord>> {
    let id_str   = encode_uuid(employee_id);
    let date_str = encode_date(date);

    let raw: Option<RawAttendance> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ATTENDANCE_COLUMNS} FROM attendance
                 WHERE employee_id = ?1 AND date = ?2"
              ),
              rusqlite::params![id_str, date_str],
              RawAttendance::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAttendance::into_record).transpose()
  }

  async fn insert_attendance(&self, record: AttendanceRecord) -> Result<bool> {
    let id_str       = encode_uuid(record.attendance_id);
    let employee_str = encode_uuid(record.employee_id);
    let date_str     = encode_date(record.date);
    let status_str   = record.status.to_string();
    let captured_str = encode_dt(record.captured_at);
    let time         = record.time;

    // `UNIQUE (employee_id, date)` turns a second write for the same day into
    // a no-op rather than an error.
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO attendance (
             attendance_id, employee_id, date, status, time, captured_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, employee_str, date_str, status_str, time, captured_str],
        )?)
      })
      .await?;

    Ok(inserted == 1)
  }

  async fn list_attendance(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>> {
    let id_str   = query.employee_id.map(encode_uuid);
    let from_str = query.from.map(encode_date);
    let to_str   = query.to.map(encode_date);

    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTENDANCE_COLUMNS} FROM attendance
           WHERE (?1 IS NULL OR employee_id = ?1)
             AND (?2 IS NULL OR date >= ?2)
             AND (?3 IS NULL OR date <= ?3)
           ORDER BY date DESC, captured_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, from_str, to_str], RawAttendance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendance::into_record).collect()
  }

  // ── Leave ─────────────────────────────────────────────────────────────────

  async fn insert_leave(&self, request: LeaveRequest) -> Result<()> {
    let id_str       = encode_uuid(request.leave_id);
    let employee_str = encode_uuid(request.employee_id);
    let start_str    = encode_date(request.start_date);
    let end_str      = encode_date(request.end_date);
    let status_str   = request.status.to_string();
    let created_str  = encode_dt(request.created_at);
    let reviewed_str = request.reviewed_at.map(encode_dt);
    let reason       = request.reason;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO leave_requests (
             leave_id, employee_id, start_date, end_date, reason,
             status, created_at, reviewed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            employee_str,
            start_str,
            end_str,
            reason,
            status_str,
            created_str,
            reviewed_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_leave(&self, employee_id: Uuid, leave_id: Uuid) -> Result<Option<LeaveRequest>> {
    let employee_str = encode_uuid(employee_id);
    let leave_str    = encode_uuid(leave_id);

    let raw: Option<RawLeave> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {LEAVE_COLUMNS} FROM leave_requests
                 WHERE employee_id = ?1 AND leave_id = ?2"
              ),
              rusqlite::params![employee_str, leave_str],
              RawLeave::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLeave::into_request).transpose()
  }

  async fn update_leave(&self, request: LeaveRequest) -> Result<()> {
    let id_str       = encode_uuid(request.leave_id);
    let employee_str = encode_uuid(request.employee_id);
    let status_str   = request.status.to_string();
    let reviewed_str = request.reviewed_at.map(encode_dt);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE leave_requests SET status = ?3, reviewed_at = ?4
           WHERE leave_id = ?1 AND employee_id = ?2",
          rusqlite::params![id_str, employee_str, status_str, reviewed_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::LeaveNotFound(request.leave_id));
    }
    Ok(())
  }

  async fn list_leave(&self, query: &LeaveQuery) -> Result<Vec<LeaveRequest>> {
    let id_str     = query.employee_id.map(encode_uuid);
    let status_str = query.status.map(|s| s.to_string());

    let raws: Vec<RawLeave> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LEAVE_COLUMNS} FROM leave_requests
           WHERE (?1 IS NULL OR employee_id = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, status_str], RawLeave::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLeave::into_request).collect()
  }

  // ── Salary ────────────────────────────────────────────────────────────────

  async fn current_salary(&self, employee_id: Uuid) -> Result<Option<SalaryRecord>> {
    let id_str = encode_uuid(employee_id);

    let raw: Option<RawSalary> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SALARY_COLUMNS} FROM salary_current WHERE employee_id = ?1"),
              rusqlite::params![id_str],
              RawSalary::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSalary::into_record).transpose()
  }

  async fn record_salary(&self, record: SalaryRecord) -> Result<()> {
    let raw      = RawSalary::from_record(&record);
    let entry_id = encode_uuid(Uuid::new_v4());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT OR REPLACE INTO salary_current ({SALARY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          rusqlite::params![
            raw.employee_id,
            raw.basic_salary,
            raw.allowances,
            raw.deductions,
            raw.in_hand_salary,
            raw.pay_date,
            raw.increment_percent,
            raw.updated_at,
          ],
        )?;
        tx.execute(
          &format!(
            "INSERT INTO salary_history (entry_id, {SALARY_COLUMNS})
             VALUES (?9, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          rusqlite::params![
            raw.employee_id,
            raw.basic_salary,
            raw.allowances,
            raw.deductions,
            raw.in_hand_salary,
            raw.pay_date,
            raw.increment_percent,
            raw.updated_at,
            entry_id,
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn salary_history(&self, employee_id: Uuid) -> Result<Vec<SalaryRecord>> {
    let id_str = encode_uuid(employee_id);

    let raws: Vec<RawSalary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SALARY_COLUMNS} FROM salary_history
           WHERE employee_id = ?1
           ORDER BY updated_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawSalary::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSalary::into_record).collect()
  }
}
