//! Handlers for ticket purchase and ticket history.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/tickets` | Body: [`IssueTicketBody`]; the caller is the organiser; returns 201, or 409 if the ticket ID is taken |
//! | `GET`  | `/history` | The caller's own tickets, newest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tixgate_core::{
  store::{IssueOutcome, NewTicket, TicketStore},
  ticket::{TicketDetails, TicketHistoryRecord},
};

use crate::{caller::Caller, error::ApiError};

// ─── Issue ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /tickets`.
#[derive(Debug, Deserialize)]
pub struct IssueTicketBody {
  pub event_id:     String,
  /// Omit to let the store generate one.
  pub ticket_id:    Option<String>,
  pub attendee_uid: String,
  #[serde(flatten)]
  pub details:      TicketDetails,
}

/// `POST /tickets` — returns 201 + both stored records.
pub async fn issue<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  Json(body): Json<IssueTicketBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TicketStore,
{
  if body.event_id.trim().is_empty() || body.attendee_uid.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "event_id and attendee_uid are required".to_owned(),
    ));
  }

  let outcome = store
    .issue_ticket(NewTicket {
      organizer_uid: caller.uid,
      event_id:      body.event_id,
      ticket_id:     body.ticket_id,
      attendee_uid:  body.attendee_uid,
      details:       body.details,
    })
    .await
    .map_err(ApiError::store)?;

  match outcome {
    IssueOutcome::Issued(issued) => Ok((StatusCode::CREATED, Json(issued))),
    IssueOutcome::Duplicate { ticket_id } => Err(ApiError::Conflict(format!(
      "ticket {ticket_id} has already been issued"
    ))),
  }
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
) -> Result<Json<Vec<TicketHistoryRecord>>, ApiError>
where
  S: TicketStore,
{
  let records = store
    .list_history(&caller.uid)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}
