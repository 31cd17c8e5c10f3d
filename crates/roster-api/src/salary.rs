//! Admin handlers for salary snapshots.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/employees/{id}/salary` | Current snapshot or `null` |
//! | `PUT`  | `/employees/{id}/salary` | Body: `SalaryInput`; amounts must be numeric |
//! | `GET`  | `/employees/{id}/salary/history` | Oldest first |

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use roster_core::salary::{self, SalaryInput, SalaryRecord};
use uuid::Uuid;

use crate::{AppState, Backend, auth::AdminOnly, error::ApiError, extract::ApiJson};

pub async fn current<S: Backend>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Path(id): Path<Uuid>,
) -> Result<Json<Option<SalaryRecord>>, ApiError> {
  Ok(Json(salary::current_salary(state.store.as_ref(), id).await?))
}

pub async fn upsert<S: Backend>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Path(id): Path<Uuid>,
  ApiJson(input): ApiJson<SalaryInput>,
) -> Result<Json<SalaryRecord>, ApiError> {
  Ok(Json(salary::upsert_salary(state.store.as_ref(), id, &input, Utc::now()).await?))
}

pub async fn history<S: Backend>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<SalaryRecord>>, ApiError> {
  Ok(Json(salary::salary_history(state.store.as_ref(), id).await?))
}
