//! `GET /attendance[?employee_id=…][&from=YYYY-MM-DD][&to=YYYY-MM-DD]`
//!
//! Admin report grouped by employee. Both bounds are inclusive.

use axum::{
  Json,
  extract::{Query, State},
};
use roster_core::attendance::{AttendanceQuery, EmployeeAttendance, attendance_report};

use crate::{AppState, Backend, auth::AdminOnly, error::ApiError};

pub async fn report<S: Backend>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<EmployeeAttendance>>, ApiError> {
  Ok(Json(attendance_report(state.store.as_ref(), &query).await?))
}
