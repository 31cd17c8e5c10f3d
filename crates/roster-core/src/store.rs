//! The `EmployeeStore` trait: the document-store seam.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! The reconciliation rules in this crate and the API layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  attendance::{AttendanceQuery, AttendanceRecord},
  employee::{Employee, EmployeeQuery},
  leave::{LeaveQuery, LeaveRequest},
  salary::SalaryRecord,
};

/// Abstraction over the employee document store.
///
/// Attendance, leave and salary records are owned by an employee and only
/// exist beneath one.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EmployeeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Employees ─────────────────────────────────────────────────────────

  /// All employees whose email equals `email` exactly (case-sensitive).
  fn find_employees_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + 'a;

  fn get_employee(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn list_employees<'a>(
    &'a self,
    query: &'a EmployeeQuery,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + 'a;

  /// Persist a new employee. Fails if the id or email is taken.
  fn insert_employee(
    &self,
    employee: Employee,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Overwrite an existing employee's mutable fields (profile, legacy
  /// password hash, `updated_at`).
  fn update_employee(
    &self,
    employee: Employee,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  fn find_attendance(
    &self,
    employee_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Insert unless a record for the same (employee, date) exists.
  ///
  /// Returns `false` when the slot was already taken. Implementations must
  /// make the check and the write a single atomic step.
  fn insert_attendance(
    &self,
    record: AttendanceRecord,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_attendance<'a>(
    &'a self,
    query: &'a AttendanceQuery,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + 'a;

  // ── Leave ─────────────────────────────────────────────────────────────

  fn insert_leave(
    &self,
    request: LeaveRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_leave(
    &self,
    employee_id: Uuid,
    leave_id: Uuid,
  ) -> impl Future<Output = Result<Option<LeaveRequest>, Self::Error>> + Send + '_;

  /// Persist a request's `status` and `reviewed_at`.
  fn update_leave(
    &self,
    request: LeaveRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_leave<'a>(
    &'a self,
    query: &'a LeaveQuery,
  ) -> impl Future<Output = Result<Vec<LeaveRequest>, Self::Error>> + Send + 'a;

  // ── Salary ────────────────────────────────────────────────────────────

  fn current_salary(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Option<SalaryRecord>, Self::Error>> + Send + '_;

  /// Replace the current snapshot and append `record` to the history.
  /// History entries are never updated or deleted.
  fn record_salary(
    &self,
    record: SalaryRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn salary_history(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SalaryRecord>, Self::Error>> + Send + '_;
}
