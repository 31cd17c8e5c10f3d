//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use roster_core::identity::IdentityProvider;
use roster_store_sqlite::SqliteStore;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiConfig, AppState, Mailer, api_router};

const ADMIN: (&str, &str) = ("admin@x.com", "adminpass");

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store.create_account(ADMIN.0, ADMIN.1).await.unwrap().unwrap();

  AppState {
    store:  Arc::new(store),
    config: Arc::new(ApiConfig {
      admin_emails:       vec![ADMIN.0.to_owned()],
      utc_offset_minutes: 330,
    }),
    mailer: Arc::new(Mailer::Log),
  }
}

fn auth_header((user, pass): (&str, &str)) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn call(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  creds: Option<(&str, &str)>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(creds) = creds {
    builder = builder.header(header::AUTHORIZATION, auth_header(creds));
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  api_router(state.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

async fn hire(state: &AppState<SqliteStore>, email: &str, first: &str) -> String {
  let resp = call(
    state,
    "PUT",
    "/employees",
    Some(ADMIN),
    Some(json!({
      "email": email,
      "password": "secret1",
      "profile": { "first_name": first, "last_name": "Tester", "employment_type": "FTE" }
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = json_body(resp).await;
  body["employee"]["employee_id"].as_str().unwrap().to_owned()
}

// ─── Authentication ───────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credentials_are_401_with_challenge() {
  let state = make_state().await;
  let resp = call(&state, "GET", "/me", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn wrong_password_is_401_then_429() {
  let state = make_state().await;
  for _ in 0..4 {
    let resp = call(&state, "GET", "/me", Some((ADMIN.0, "nope")), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
  let resp = call(&state, "GET", "/me", Some((ADMIN.0, "nope")), None).await;
  assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn employees_cannot_reach_admin_routes() {
  let state = make_state().await;
  hire(&state, "a@x.com", "Ada").await;

  let resp = call(&state, "GET", "/dashboard", Some(("a@x.com", "secret1")), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  assert!(json_body(resp).await["error"].is_string());
}

// ─── Identity & profile ───────────────────────────────────────────────────────

#[tokio::test]
async fn admin_without_profile_is_a_guest() {
  let state = make_state().await;
  let resp = call(&state, "GET", "/me", Some(ADMIN), None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(resp).await;
  assert_eq!(body["role"], "admin");
  assert_eq!(body["display_name"], "Guest User");
  assert!(body["employee"].is_null());

  // Guests cannot self-serve writes.
  let resp = call(&state, "PUT", "/me/profile", Some(ADMIN), Some(json!({ "city": "Pune" }))).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_email_in_other_case_is_an_employee() {
  let state = make_state().await;
  hire(&state, "ADMIN@x.com", "Cas").await;

  let resp = call(&state, "GET", "/me", Some(("ADMIN@x.com", "secret1")), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["role"], "employee");
  assert_eq!(body["employee"]["email"], "ADMIN@x.com");

  let resp = call(&state, "GET", "/dashboard", Some(("ADMIN@x.com", "secret1")), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn upsert_create_then_update() {
  let state = make_state().await;
  let id = hire(&state, "b@x.com", "Bea").await;

  let resp = call(
    &state,
    "PUT",
    "/employees",
    Some(ADMIN),
    Some(json!({ "email": "b@x.com", "profile": { "city": "Pune" } })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["created"], false);
  assert_eq!(body["welcome"]["status"], "not_attempted");
  assert_eq!(body["employee"]["profile"]["first_name"], "Bea");
  assert_eq!(body["employee"]["profile"]["city"], "Pune");
  assert!(body["employee"].get("password_hash").is_none());

  let resp = call(&state, "GET", &format!("/employees/{id}"), Some(ADMIN), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn new_employee_without_password_is_400() {
  let state = make_state().await;
  let resp = call(&state, "PUT", "/employees", Some(ADMIN), Some(json!({ "email": "c@x.com" }))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_fields_are_400() {
  let state = make_state().await;
  let resp = call(
    &state,
    "PUT",
    "/employees",
    Some(ADMIN),
    Some(json!({ "email": "c@x.com", "password": "secret1", "role": "admin" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
async fn employee_updates_own_profile() {
  let state = make_state().await;
  hire(&state, "d@x.com", "Dan").await;

  let resp = call(
    &state,
    "PUT",
    "/me/profile",
    Some(("d@x.com", "secret1")),
    Some(json!({ "skills": "rust" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(call(&state, "GET", "/me", Some(("d@x.com", "secret1")), None).await).await;
  assert_eq!(body["role"], "employee");
  assert_eq!(body["display_name"], "Dan Tester");
  assert_eq!(body["employee"]["profile"]["skills"], "rust");
}

#[tokio::test]
async fn dashboard_and_search() {
  let state = make_state().await;
  hire(&state, "e@x.com", "Eli").await;
  hire(&state, "f@x.com", "Fox").await;

  let body = json_body(call(&state, "GET", "/dashboard", Some(ADMIN), None).await).await;
  assert_eq!(body["total"], 2);
  assert_eq!(body["full_time"], 2);
  assert_eq!(body["interns"], 0);

  let body = json_body(call(&state, "GET", "/employees?text=fox", Some(ADMIN), None).await).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["email"], "f@x.com");
}

#[tokio::test]
async fn unknown_employee_is_404() {
  let state = make_state().await;
  let uri = format!("/employees/{}", uuid::Uuid::new_v4());
  let resp = call(&state, "GET", &uri, Some(ADMIN), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ─── Attendance ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn attendance_is_marked_once_per_day() {
  let state = make_state().await;
  hire(&state, "g@x.com", "Gil").await;
  let me = Some(("g@x.com", "secret1"));

  let before = state.config.now_local().date_naive().to_string();
  let resp = call(&state, "POST", "/me/attendance", me, Some(json!({ "status": "present" }))).await;
  let after = state.config.now_local().date_naive().to_string();
  assert_eq!(resp.status(), StatusCode::CREATED);
  let record = json_body(resp).await;
  let date = record["date"].as_str().unwrap();
  assert!(date == before || date == after, "{date} not in [{before}, {after}]");

  let resp = call(&state, "POST", "/me/attendance", me, Some(json!({ "status": "late" }))).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  let history = json_body(call(&state, "GET", "/me/attendance", me, None).await).await;
  assert_eq!(history.as_array().unwrap().len(), 1);

  let report = json_body(call(&state, "GET", "/attendance", Some(ADMIN), None).await).await;
  assert_eq!(report[0]["employee_name"], "Gil Tester");
  assert_eq!(report[0]["counts"]["present"], 1);
}

#[tokio::test]
async fn inverted_report_range_is_400() {
  let state = make_state().await;
  let resp = call(
    &state,
    "GET",
    "/attendance?from=2024-03-10&to=2024-03-01",
    Some(ADMIN),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ─── Leave ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn leave_request_review_cycle() {
  let state = make_state().await;
  let id = hire(&state, "h@x.com", "Hana").await;
  let me = Some(("h@x.com", "secret1"));

  let resp = call(
    &state,
    "POST",
    "/me/leave",
    me,
    Some(json!({ "start_date": "2024-01-10", "end_date": "2024-01-05", "reason": "trip" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = call(
    &state,
    "POST",
    "/me/leave",
    me,
    Some(json!({ "start_date": "2024-01-05", "end_date": "2024-01-10", "reason": "trip" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let leave_id = json_body(resp).await["leave_id"].as_str().unwrap().to_owned();

  let pending = json_body(call(&state, "GET", "/leave?status=pending", Some(ADMIN), None).await).await;
  assert_eq!(pending.as_array().unwrap().len(), 1);
  assert_eq!(pending[0]["employee_name"], "Hana Tester");

  let decision = format!("/employees/{id}/leave/{leave_id}/decision");
  let resp = call(&state, "POST", &decision, Some(ADMIN), Some(json!({ "status": "approved" }))).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["status"], "approved");

  let resp = call(&state, "POST", &decision, Some(ADMIN), Some(json!({ "status": "pending" }))).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  let mine = json_body(call(&state, "GET", "/me/leave", me, None).await).await;
  assert_eq!(mine[0]["status"], "approved");
}

// ─── Salary ───────────────────────────────────────────────────────────────────

fn money(v: &Value) -> Decimal { v.as_str().unwrap().parse().unwrap() }

#[tokio::test]
async fn salary_upsert_and_history() {
  let state = make_state().await;
  let id = hire(&state, "i@x.com", "Ike").await;
  let uri = format!("/employees/{id}/salary");

  let resp = call(
    &state,
    "PUT",
    &uri,
    Some(ADMIN),
    Some(json!({
      "basic_salary": 50000, "allowances": 5000, "deductions": 2000,
      "pay_date": "2024-06-30", "increment_percent": 0
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(money(&json_body(resp).await["in_hand_salary"]), "4416.67".parse().unwrap());

  let resp = call(
    &state,
    "PUT",
    &uri,
    Some(ADMIN),
    Some(json!({
      "basic_salary": 50000, "allowances": 5000, "deductions": 2000,
      "pay_date": "2024-07-31", "increment_percent": 10
    })),
  )
  .await;
  let body = json_body(resp).await;
  assert_eq!(money(&body["basic_salary"]), "55000".parse().unwrap());
  assert_eq!(money(&body["in_hand_salary"]), "4833.33".parse().unwrap());

  let history = json_body(call(&state, "GET", &format!("{uri}/history"), Some(ADMIN), None).await).await;
  assert_eq!(history.as_array().unwrap().len(), 2);

  let mine = json_body(call(&state, "GET", "/me/salary", Some(("i@x.com", "secret1")), None).await).await;
  assert_eq!(money(&mine["basic_salary"]), "55000".parse().unwrap());
}

#[tokio::test]
async fn non_numeric_salary_is_400() {
  let state = make_state().await;
  let id = hire(&state, "j@x.com", "Jo").await;
  let resp = call(
    &state,
    "PUT",
    &format!("/employees/{id}/salary"),
    Some(ADMIN),
    Some(json!({ "basic_salary": "abc", "pay_date": "2024-06-30" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_salary_is_400() {
  let state = make_state().await;
  let id = hire(&state, "k@x.com", "Kai").await;
  let uri = format!("/employees/{id}/salary");

  let resp = call(
    &state,
    "PUT",
    &uri,
    Some(ADMIN),
    Some(json!({
      "basic_salary": "79228162514264337593543950335", "allowances": "1",
      "pay_date": "2024-06-30"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = call(
    &state,
    "PUT",
    &uri,
    Some(ADMIN),
    Some(json!({ "basic_salary": 50000, "pay_date": "2024-06-30" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = call(
    &state,
    "PUT",
    &uri,
    Some(ADMIN),
    Some(json!({
      "basic_salary": 50000, "pay_date": "2024-07-31",
      "increment_percent": "10000000000000000000000000000"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let history = json_body(call(&state, "GET", &format!("{uri}/history"), Some(ADMIN), None).await).await;
  assert_eq!(history.as_array().unwrap().len(), 1);
}

// ─── Passwords ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_request_is_always_accepted() {
  let state = make_state().await;
  for email in [ADMIN.0, "nobody@x.com"] {
    let resp = call(&state, "POST", "/auth/password-reset", None, Some(json!({ "email": email }))).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
  }

  let resp = call(
    &state,
    "POST",
    "/auth/password-reset/complete",
    None,
    Some(json!({ "token": "bogus", "new_password": "newpass1" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn change_own_password() {
  let state = make_state().await;
  hire(&state, "k@x.com", "Kai").await;

  let resp = call(
    &state,
    "POST",
    "/me/password",
    Some(("k@x.com", "secret1")),
    Some(json!({ "current_password": "secret1", "new_password": "short" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = call(
    &state,
    "POST",
    "/me/password",
    Some(("k@x.com", "secret1")),
    Some(json!({ "current_password": "secret1", "new_password": "longer1" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = call(&state, "GET", "/me", Some(("k@x.com", "longer1")), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
}
