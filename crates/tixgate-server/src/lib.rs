//! HTTP server for tixgate.
//!
//! Wraps the JSON API from `tixgate-api` with HTTP Basic authentication and
//! request tracing, backed by any [`TicketStore`].

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use serde::Deserialize;
use tixgate_core::store::TicketStore;
use tower_http::trace::TraceLayer;

use auth::{AccountConfig, AuthConfig, require_caller};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub accounts:   Vec<AccountConfig>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state used to assemble the router.
#[derive(Clone)]
pub struct AppState<S: TicketStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server [`Router`]: an unauthenticated `/health` probe plus the
/// authenticated API under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TicketStore + 'static,
{
  let api = tixgate_api::api_router(state.store.clone())
    .layer(middleware::from_fn_with_state(state.auth.clone(), require_caller));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tixgate_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  fn account(username: &str, password: &str, uid: &str) -> AccountConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AccountConfig {
      username:      username.to_string(),
      password_hash: hash,
      uid:           uid.to_string(),
    }
  }

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store: Arc::new(store),
      auth:  Arc::new(AuthConfig {
        accounts: vec![
          account("door", "secret", "org-1"),
          account("rival", "secret", "org-2"),
          account("ada", "secret", "u1"),
        ],
      }),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn send(
    state:  AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    user:   Option<&str>,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder.header(header::AUTHORIZATION, auth_header(user, "secret"));
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp   = router(state).oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value  = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn issue(state: &AppState<SqliteStore>, ticket_id: &str) {
    let (status, _) = send(
      state.clone(),
      "POST",
      "/api/tickets",
      Some("door"),
      Some(json!({
        "event_id":      "ev-1",
        "ticket_id":     ticket_id,
        "attendee_uid":  "u1",
        "full_name":     "Ada Lovelace",
        "email":         "ada@example.com",
        "ticket_type":   "VIP",
        "purchase_date": "2026-09-01",
        "purchase_time": "12:00:00",
        "reference":     "REF-0001",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  // ── Health / auth ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_needs_no_auth() {
    let state = make_state().await;
    let resp = router(state)
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let state = make_state().await;
    let resp = router(state)
      .oneshot(
        Request::post("/api/events/ev-1/verify")
          .header(header::CONTENT_TYPE, "application/json")
          .body(Body::from(r#"{"ticket_id":"T1"}"#))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  // ── Verify ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn verify_then_rescan() {
    let state = make_state().await;
    issue(&state, "T1").await;
    let body = json!({ "ticket_id": "T1" });

    let (status, first) =
      send(state.clone(), "POST", "/api/events/ev-1/verify", Some("door"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["result"], "success");
    assert_eq!(first["ticket"]["full_name"], "Ada Lovelace");
    assert_eq!(first["ticket"]["is_verified"], false);
    assert_eq!(first["ticket"]["verification"]["verified_by"], "org-1");

    let (status, second) =
      send(state, "POST", "/api/events/ev-1/verify", Some("door"), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["result"], "already_verified");
    assert_eq!(second["ticket"]["is_verified"], true);
  }

  #[tokio::test]
  async fn verify_unknown_ticket_returns_404_outcome() {
    let state = make_state().await;
    let (status, body) = send(
      state,
      "POST",
      "/api/events/ev-1/verify",
      Some("door"),
      Some(json!({ "ticket_id": "T404" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["result"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("T404"));
  }

  #[tokio::test]
  async fn verify_is_scoped_to_the_callers_events() {
    let state = make_state().await;
    issue(&state, "T1").await;
    let (status, body) = send(
      state,
      "POST",
      "/api/events/ev-1/verify",
      Some("rival"),
      Some(json!({ "ticket_id": "T1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["result"], "not_found");
  }

  #[tokio::test]
  async fn verify_blank_ticket_id_is_bad_request() {
    let state = make_state().await;
    let (status, body) = send(
      state,
      "POST",
      "/api/events/ev-1/verify",
      Some("door"),
      Some(json!({ "ticket_id": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("ticket_id"));
  }

  // ── Door views / history ────────────────────────────────────────────────────

  #[tokio::test]
  async fn roster_and_summary_reflect_check_in() {
    let state = make_state().await;
    issue(&state, "T1").await;
    issue(&state, "T2").await;
    send(
      state.clone(),
      "POST",
      "/api/events/ev-1/verify",
      Some("door"),
      Some(json!({ "ticket_id": "T2" })),
    )
    .await;

    let (status, roster) =
      send(state.clone(), "GET", "/api/events/ev-1/attendees", Some("door"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster.as_array().unwrap().len(), 2);

    let (status, summary) =
      send(state, "GET", "/api/events/ev-1/summary", Some("door"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      summary,
      json!({ "event_id": "ev-1", "total": 2, "verified": 1, "remaining": 1 })
    );
  }

  #[tokio::test]
  async fn duplicate_issue_is_conflict() {
    let state = make_state().await;
    issue(&state, "T1").await;
    let (status, _) = send(
      state,
      "POST",
      "/api/tickets",
      Some("door"),
      Some(json!({
        "event_id": "ev-1", "ticket_id": "T1", "attendee_uid": "u1",
        "full_name": "Ada Lovelace", "email": "ada@example.com", "ticket_type": "VIP",
        "purchase_date": "2026-09-01", "purchase_time": "12:00:00", "reference": "REF-0001",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn reused_ticket_id_on_another_event_is_conflict() {
    let state = make_state().await;
    issue(&state, "T1").await;
    let (status, body) = send(
      state.clone(),
      "POST",
      "/api/tickets",
      Some("door"),
      Some(json!({
        "event_id": "ev-2", "ticket_id": "T1", "attendee_uid": "u1",
        "full_name": "Ada Lovelace", "email": "ada@example.com", "ticket_type": "VIP",
        "purchase_date": "2026-09-02", "purchase_time": "12:00:00", "reference": "REF-0002",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("T1")), "{body}");

    let (_, roster) =
      send(state, "GET", "/api/events/ev-2/attendees", Some("door"), None).await;
    assert_eq!(roster, json!([]));
  }

  #[tokio::test]
  async fn padded_ticket_id_is_issued_trimmed() {
    let state = make_state().await;
    issue(&state, " T1 ").await;
    let (status, body) = send(
      state,
      "POST",
      "/api/events/ev-1/verify",
      Some("door"),
      Some(json!({ "ticket_id": "T1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "success");
  }

  #[tokio::test]
  async fn attendee_sees_verification_in_history() {
    let state = make_state().await;
    issue(&state, "T1").await;
    send(
      state.clone(),
      "POST",
      "/api/events/ev-1/verify",
      Some("door"),
      Some(json!({ "ticket_id": "T1" })),
    )
    .await;

    let (status, history) = send(state, "GET", "/api/history", Some("ada"), None).await;
    assert_eq!(status, StatusCode::OK);
    let records = history.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["verified"], true);
    assert_eq!(records[0]["key"]["ticket_id"], "T1");
  }
}
