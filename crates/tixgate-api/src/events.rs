//! Handlers for `/events/{event_id}/...` endpoints, scoped to the caller's own
//! events.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/events/:event_id/verify` | Body: `{"ticket_id":"..."}`; returns a [`VerificationOutcome`] |
//! | `GET`  | `/events/:event_id/attendees` | Door roster, ordered by name |
//! | `GET`  | `/events/:event_id/summary` | Verified / total counts |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tixgate_core::{
  store::TicketStore,
  ticket::AttendeeRecord,
  verify::{VerificationOutcome, VerifyRequest, verify_ticket},
};

use crate::{caller::Caller, error::ApiError};

// ─── Verify ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  /// Typed by the agent or decoded from a QR code by the scanner.
  pub ticket_id: String,
}

/// HTTP status for each outcome. The body is always the outcome itself.
pub fn outcome_status(outcome: &VerificationOutcome) -> StatusCode {
  match outcome {
    VerificationOutcome::Success { .. } => StatusCode::OK,
    VerificationOutcome::AlreadyVerified { .. } => StatusCode::OK,
    VerificationOutcome::NotFound { .. } => StatusCode::NOT_FOUND,
    VerificationOutcome::InvalidData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    VerificationOutcome::Inconsistent { .. } => StatusCode::CONFLICT,
    VerificationOutcome::TransientError { .. } => StatusCode::SERVICE_UNAVAILABLE,
  }
}

/// `POST /events/:event_id/verify`
pub async fn verify<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(event_id): Path<String>,
  Json(body): Json<VerifyBody>,
) -> Result<(StatusCode, Json<VerificationOutcome>), ApiError>
where
  S: TicketStore,
{
  // The organiser scanning the ticket is also the verifying agent.
  let request =
    VerifyRequest::new(&caller.uid, &event_id, &body.ticket_id, &caller.uid)?;
  let outcome = verify_ticket(store.as_ref(), &request).await;
  Ok((outcome_status(&outcome), Json(outcome)))
}

// ─── Roster ───────────────────────────────────────────────────────────────────

/// `GET /events/:event_id/attendees`
pub async fn attendees<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(event_id): Path<String>,
) -> Result<Json<Vec<AttendeeRecord>>, ApiError>
where
  S: TicketStore,
{
  let roster = store
    .list_attendees(&caller.uid, &event_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(roster))
}

// ─── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct EventSummary {
  pub event_id:  String,
  pub total:     u64,
  pub verified:  u64,
  pub remaining: u64,
}

/// `GET /events/:event_id/summary`
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Path(event_id): Path<String>,
) -> Result<Json<EventSummary>, ApiError>
where
  S: TicketStore,
{
  let counts = store
    .check_in_summary(&caller.uid, &event_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(EventSummary {
    event_id,
    total: counts.total,
    verified: counts.verified,
    remaining: counts.remaining(),
  }))
}
