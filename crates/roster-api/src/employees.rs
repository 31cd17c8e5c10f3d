//! Admin handlers for the employee directory.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dashboard` | Head counts |
//! | `GET`  | `/employees` | Optional `?text=` and `?employment_type=FTE\|Intern` |
//! | `PUT`  | `/employees` | Upsert keyed by email; `201` when created |
//! | `GET`  | `/employees/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use roster_core::{
  Error as CoreError,
  employee::{Employee, EmployeeQuery, EmployeeSummary},
  upsert::{UpsertRequest, upsert_employee},
};
use uuid::Uuid;

use crate::{AppState, Backend, auth::AdminOnly, error::ApiError, extract::ApiJson};

/// `GET /dashboard`
pub async fn dashboard<S: Backend>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
) -> Result<Json<EmployeeSummary>, ApiError> {
  let employees = state
    .store
    .list_employees(&EmployeeQuery::default())
    .await
    .map_err(ApiError::remote)?;
  Ok(Json(EmployeeSummary::tally(&employees)))
}

/// `GET /employees[?text=…][&employment_type=…]`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Query(query): Query<EmployeeQuery>,
) -> Result<Json<Vec<Employee>>, ApiError> {
  let employees = state
    .store
    .list_employees(&query)
    .await
    .map_err(ApiError::remote)?;
  Ok(Json(employees))
}

/// `PUT /employees`
pub async fn upsert<S: Backend>(
  State(state): State<AppState<S>>,
  AdminOnly(admin): AdminOnly,
  ApiJson(request): ApiJson<UpsertRequest>,
) -> Result<impl IntoResponse, ApiError> {
  tracing::debug!(admin = %admin.account.email, email = %request.email, "upsert requested");

  let outcome = upsert_employee(
    state.store.as_ref(),
    state.store.as_ref(),
    state.mailer.as_ref(),
    request,
    Utc::now(),
  )
  .await?;

  let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(outcome)))
}

/// `GET /employees/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError> {
  let employee = state
    .store
    .get_employee(id)
    .await
    .map_err(ApiError::remote)?
    .ok_or_else(|| CoreError::NotFound(format!("employee {id}")))?;
  Ok(Json(employee))
}
