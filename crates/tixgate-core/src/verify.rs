//! The ticket verification protocol.
//!
//! Given a ticket ID and the organiser's selected event, look the ticket up,
//! reject unknown or corrupt tickets, and mark a valid unverified ticket as
//! verified in both of its records. Repeated scans of a checked-in ticket
//! resolve to [`VerificationOutcome::AlreadyVerified`] and write nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  store::{CommitOutcome, TicketStore},
  ticket::{AttendeeKey, TicketView, VerificationStamp},
};

/// Message returned for every store failure. Details go to the log only.
const TRANSIENT_MESSAGE: &str = "verification failed, please retry";

// ─── Request ─────────────────────────────────────────────────────────────────

/// A validated verification request. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
  organizer_uid: String,
  event_id:      String,
  ticket_id:     String,
  agent_id:      String,
}

impl VerifyRequest {
  /// Validate and build a request. Surrounding whitespace is trimmed from
  /// every field, so scanner line endings never reach the store.
  pub fn new(
    organizer_uid: &str,
    event_id: &str,
    ticket_id: &str,
    agent_id: &str,
  ) -> Result<Self> {
    Ok(Self {
      organizer_uid: non_empty("organizer_uid", organizer_uid)?,
      event_id:      non_empty("event_id", event_id)?,
      ticket_id:     non_empty("ticket_id", ticket_id)?,
      agent_id:      non_empty("agent_id", agent_id)?,
    })
  }

  pub fn organizer_uid(&self) -> &str { &self.organizer_uid }

  pub fn event_id(&self) -> &str { &self.event_id }

  pub fn ticket_id(&self) -> &str { &self.ticket_id }

  pub fn agent_id(&self) -> &str { &self.agent_id }

  pub fn attendee_key(&self) -> AttendeeKey {
    AttendeeKey::new(&self.organizer_uid, &self.event_id, &self.ticket_id)
  }
}

fn non_empty(field: &'static str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyField(field));
  }
  Ok(trimmed.to_owned())
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// The terminal result of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VerificationOutcome {
  /// The ticket was valid and is now verified. `ticket.is_verified` carries
  /// the value from before the update.
  Success { ticket: TicketView },
  /// The ticket had been checked in before. Nothing was written.
  AlreadyVerified { ticket: TicketView },
  /// No such ticket for this event.
  NotFound { message: String },
  /// The attendee record has no usable back-reference to its account.
  InvalidData { message: String },
  /// The attendee record exists but its history record does not.
  Inconsistent { message: String },
  /// The store failed; the attempt may be retried by hand.
  TransientError { message: String },
}

/// Variant names of [`VerificationOutcome`], for logs and summaries.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
  Success,
  AlreadyVerified,
  NotFound,
  InvalidData,
  Inconsistent,
  TransientError,
}

impl VerificationOutcome {
  pub fn kind(&self) -> OutcomeKind {
    match self {
      Self::Success { .. } => OutcomeKind::Success,
      Self::AlreadyVerified { .. } => OutcomeKind::AlreadyVerified,
      Self::NotFound { .. } => OutcomeKind::NotFound,
      Self::InvalidData { .. } => OutcomeKind::InvalidData,
      Self::Inconsistent { .. } => OutcomeKind::Inconsistent,
      Self::TransientError { .. } => OutcomeKind::TransientError,
    }
  }

  /// The ticket, for the two outcomes that carry one.
  pub fn ticket(&self) -> Option<&TicketView> {
    match self {
      Self::Success { ticket } | Self::AlreadyVerified { ticket } => {
        Some(ticket)
      }
      _ => None,
    }
  }

  /// A human-readable message for any outcome.
  pub fn message(&self) -> String {
    match self {
      Self::Success { ticket } => format!(
        "ticket {} verified: {} ({})",
        ticket.ticket_id, ticket.full_name, ticket.ticket_type
      ),
      Self::AlreadyVerified { ticket } => match &ticket.verification {
        Some(stamp) => format!(
          "ticket {} was already verified on {} at {}",
          ticket.ticket_id, stamp.verified_date, stamp.verified_time
        ),
        None => format!("ticket {} was already verified", ticket.ticket_id),
      },
      Self::NotFound { message }
      | Self::InvalidData { message }
      | Self::Inconsistent { message }
      | Self::TransientError { message } => message.clone(),
    }
  }

  pub fn transient() -> Self {
    Self::TransientError { message: TRANSIENT_MESSAGE.to_owned() }
  }

  fn not_found(key: &AttendeeKey) -> Self {
    Self::NotFound {
      message: format!(
        "ticket {} was not found for event {}",
        key.ticket_id, key.event_id
      ),
    }
  }

  fn invalid_data(key: &AttendeeKey) -> Self {
    Self::InvalidData {
      message: format!(
        "invalid ticket data: ticket {} has no attendee reference",
        key.ticket_id
      ),
    }
  }

  fn inconsistent(key: &AttendeeKey) -> Self {
    Self::Inconsistent {
      message: format!(
        "data inconsistency: ticket {} has no matching history record",
        key.ticket_id
      ),
    }
  }
}

// ─── Protocol ────────────────────────────────────────────────────────────────

/// Verify a ticket, stamping it with the current time.
pub async fn verify_ticket<S: TicketStore>(
  store: &S,
  request: &VerifyRequest,
) -> VerificationOutcome {
  verify_ticket_at(store, request, Utc::now()).await
}

/// Verify a ticket, stamping it with `now`.
///
/// Never fails: store errors are logged and reported as
/// [`VerificationOutcome::TransientError`].
pub async fn verify_ticket_at<S: TicketStore>(
  store: &S,
  request: &VerifyRequest,
  now: DateTime<Utc>,
) -> VerificationOutcome {
  let outcome = match run(store, request, now).await {
    Ok(outcome) => outcome,
    Err(e) => {
      tracing::error!(
        event_id = request.event_id(),
        ticket_id = request.ticket_id(),
        error = %e,
        "ticket store failed during verification"
      );
      VerificationOutcome::transient()
    }
  };

  let kind = outcome.kind();
  match kind {
    OutcomeKind::InvalidData | OutcomeKind::Inconsistent => tracing::warn!(
      event_id = request.event_id(),
      ticket_id = request.ticket_id(),
      outcome = %kind,
      "ticket data is corrupt"
    ),
    _ => tracing::info!(
      event_id = request.event_id(),
      ticket_id = request.ticket_id(),
      agent_id = request.agent_id(),
      outcome = %kind,
      "verification finished"
    ),
  }

  outcome
}

async fn run<S: TicketStore>(
  store: &S,
  request: &VerifyRequest,
  now: DateTime<Utc>,
) -> Result<VerificationOutcome, S::Error> {
  let key = request.attendee_key();

  let Some(attendee) = store.get_attendee(&key).await? else {
    return Ok(VerificationOutcome::not_found(&key));
  };

  let Some(history_key) = attendee.history_key() else {
    return Ok(VerificationOutcome::invalid_data(&key));
  };

  if attendee.verified {
    return Ok(VerificationOutcome::AlreadyVerified { ticket: attendee.view() });
  }

  if store.get_history(&history_key).await?.is_none() {
    return Ok(VerificationOutcome::inconsistent(&key));
  }

  let stamp = VerificationStamp::at(now, request.agent_id());

  match store.commit_verification(&key, &history_key, &stamp).await? {
    CommitOutcome::Applied => {
      let mut ticket = attendee.view();
      ticket.verification = Some(stamp);
      Ok(VerificationOutcome::Success { ticket })
    }
    // Another scan committed between our read and our write.
    CommitOutcome::AlreadyVerified => match store.get_attendee(&key).await? {
      Some(current) => {
        Ok(VerificationOutcome::AlreadyVerified { ticket: current.view() })
      }
      None => Ok(VerificationOutcome::not_found(&key)),
    },
    CommitOutcome::AttendeeMissing => Ok(VerificationOutcome::not_found(&key)),
    CommitOutcome::HistoryMissing => {
      Ok(VerificationOutcome::inconsistent(&key))
    }
  }
}
