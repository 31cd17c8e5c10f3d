//! Admin handlers for leave requests.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/leave` | Optional `?status=pending\|approved\|rejected`, `?employee_id=` |
//! | `POST` | `/employees/{id}/leave/{leave_id}/decision` | Body: `{"status":"approved"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use roster_core::leave::{LeaveEntry, LeaveQuery, LeaveRequest, LeaveStatus, list_leave, review_leave};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Backend, auth::AdminOnly, error::ApiError, extract::ApiJson};

/// `GET /leave`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Query(query): Query<LeaveQuery>,
) -> Result<Json<Vec<LeaveEntry>>, ApiError> {
  Ok(Json(list_leave(state.store.as_ref(), &query).await?))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Decision {
  pub status: LeaveStatus,
}

/// `POST /employees/{id}/leave/{leave_id}/decision`
///
/// Decisions may be reversed; moving back to `pending` answers `409`.
pub async fn decide<S: Backend>(
  State(state): State<AppState<S>>,
  AdminOnly(admin): AdminOnly,
  Path((employee_id, leave_id)): Path<(Uuid, Uuid)>,
  ApiJson(body): ApiJson<Decision>,
) -> Result<Json<LeaveRequest>, ApiError> {
  let request =
    review_leave(state.store.as_ref(), employee_id, leave_id, body.status, Utc::now()).await?;
  tracing::debug!(admin = %admin.account.email, %leave_id, status = %request.status, "leave decided");
  Ok(Json(request))
}
