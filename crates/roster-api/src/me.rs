//! Self-service handlers for the signed-in principal.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Resolved identity; guests have no `employee` |
//! | `PUT`  | `/me/profile` | Body: profile fields to merge |
//! | `POST` | `/me/password` | Body: `{"current_password", "new_password"}` |
//! | `GET`  | `/me/attendance` | Own history, newest first |
//! | `POST` | `/me/attendance` | Body: `{"status":"present"}` |
//! | `GET`  | `/me/leave` | Own requests, newest first |
//! | `POST` | `/me/leave` | Body: `{"start_date","end_date","reason"}` |
//! | `GET`  | `/me/salary` | Current snapshot or `null` |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use roster_core::{
  attendance::{self, AttendanceRecord, AttendanceStatus},
  employee::{Employee, Profile},
  identity::{self, ResolvedIdentity, Role, resolve_employee},
  leave::{self, LeaveEntry, LeaveQuery, NewLeave},
  salary::{self, SalaryRecord},
  upsert::{UpsertOutcome, UpsertRequest, upsert_employee},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, Backend, auth::Authenticated, error::ApiError, extract::ApiJson};

async fn own_record<S: Backend>(state: &AppState<S>, email: &str) -> Result<Employee, ApiError> {
  Ok(resolve_employee(state.store.as_ref(), email).await?.into_employee()?)
}

// ─── Identity ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Me {
  pub email:        String,
  pub role:         Role,
  pub display_name: String,
  pub employee:     Option<Employee>,
}

/// `GET /me`
pub async fn whoami<S: Backend>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
) -> Result<Json<Me>, ApiError> {
  let resolved = resolve_employee(state.store.as_ref(), &principal.account.email).await?;
  let display_name = resolved.display_name();
  let employee = match resolved {
    ResolvedIdentity::Employee(e) => Some(*e),
    ResolvedIdentity::Guest => None,
  };

  Ok(Json(Me {
    email: principal.account.email,
    role: principal.role,
    display_name,
    employee,
  }))
}

/// `PUT /me/profile`
///
/// Runs the upsert's update path for the caller's own record. Principals
/// without an employee record get `403`.
pub async fn update_profile<S: Backend>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  ApiJson(profile): ApiJson<Profile>,
) -> Result<Json<UpsertOutcome>, ApiError> {
  let email = principal.account.email;
  own_record(&state, &email).await?;

  let request = UpsertRequest { email, password: None, profile };
  let outcome = upsert_employee(
    state.store.as_ref(),
    state.store.as_ref(),
    state.mailer.as_ref(),
    request,
    Utc::now(),
  )
  .await?;
  Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordChange {
  pub current_password: String,
  pub new_password:     String,
}

/// `POST /me/password`
pub async fn change_password<S: Backend>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  ApiJson(body): ApiJson<PasswordChange>,
) -> Result<StatusCode, ApiError> {
  identity::change_password(
    state.store.as_ref(),
    &principal.account.email,
    &body.current_password,
    &body.new_password,
  )
  .await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Attendance ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkBody {
  pub status: AttendanceStatus,
}

/// `POST /me/attendance` — the date is today in the canonical timezone.
pub async fn mark_attendance<S: Backend>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  ApiJson(body): ApiJson<MarkBody>,
) -> Result<impl IntoResponse, ApiError> {
  let employee = own_record(&state, &principal.account.email).await?;
  let record = attendance::mark_attendance(
    state.store.as_ref(),
    employee.employee_id,
    body.status,
    state.config.now_local(),
  )
  .await?;
  Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /me/attendance`
pub async fn attendance_history<S: Backend>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
  let employee = own_record(&state, &principal.account.email).await?;
  let records = attendance::attendance_history(state.store.as_ref(), employee.employee_id).await?;
  Ok(Json(records))
}

// ─── Leave ────────────────────────────────────────────────────────────────────

/// `POST /me/leave`
pub async fn submit_leave<S: Backend>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  ApiJson(body): ApiJson<NewLeave>,
) -> Result<impl IntoResponse, ApiError> {
  let employee = own_record(&state, &principal.account.email).await?;
  let request =
    leave::submit_leave(state.store.as_ref(), employee.employee_id, body, Utc::now()).await?;
  Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /me/leave`
pub async fn leave_requests<S: Backend>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
) -> Result<Json<Vec<LeaveEntry>>, ApiError> {
  let employee = own_record(&state, &principal.account.email).await?;
  let query = LeaveQuery { employee_id: Some(employee.employee_id), status: None };
  Ok(Json(leave::list_leave(state.store.as_ref(), &query).await?))
}

// ─── Salary ───────────────────────────────────────────────────────────────────

/// `GET /me/salary`
pub async fn current_salary<S: Backend>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
) -> Result<Json<Option<SalaryRecord>>, ApiError> {
  let employee = own_record(&state, &principal.account.email).await?;
  Ok(Json(salary::current_salary(state.store.as_ref(), employee.employee_id).await?))
}
