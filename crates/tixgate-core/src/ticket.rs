//! Ticket records — the two denormalised copies of a ticket's state.
//!
//! Every ticket lives twice: once under the organiser's event
//! ([`AttendeeRecord`]) and once under the purchasing account
//! ([`TicketHistoryRecord`]). Both copies carry the same `verified` flag and
//! must always agree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Locates an [`AttendeeRecord`] inside an organiser's event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendeeKey {
  pub organizer_uid: String,
  pub event_id:      String,
  pub ticket_id:     String,
}

impl AttendeeKey {
  pub fn new(
    organizer_uid: impl Into<String>,
    event_id: impl Into<String>,
    ticket_id: impl Into<String>,
  ) -> Self {
    Self {
      organizer_uid: organizer_uid.into(),
      event_id:      event_id.into(),
      ticket_id:     ticket_id.into(),
    }
  }
}

/// Locates a [`TicketHistoryRecord`] inside an attendee's account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryKey {
  pub account_uid: String,
  pub ticket_id:   String,
}

impl HistoryKey {
  pub fn new(
    account_uid: impl Into<String>,
    ticket_id: impl Into<String>,
  ) -> Self {
    Self { account_uid: account_uid.into(), ticket_id: ticket_id.into() }
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

/// Attendee and purchase information, copied into both records at purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetails {
  pub full_name:     String,
  pub email:         String,
  pub ticket_type:   String,
  /// Display string, as recorded by the checkout flow.
  pub purchase_date: String,
  /// Display string, as recorded by the checkout flow.
  pub purchase_time: String,
  /// Human-readable reference printed on the ticket.
  pub reference:     String,
}

/// Verification metadata, written once when a ticket is checked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationStamp {
  /// `%Y-%m-%d`, UTC.
  pub verified_date: String,
  /// `%H:%M:%S`, UTC.
  pub verified_time: String,
  /// Account ID of the agent who scanned the ticket.
  pub verified_by:   String,
  pub verified_at:   DateTime<Utc>,
}

impl VerificationStamp {
  /// Build a stamp for `agent_id` at `now`, splitting the date and time into
  /// separate display strings.
  pub fn at(now: DateTime<Utc>, agent_id: impl Into<String>) -> Self {
    Self {
      verified_date: now.format("%Y-%m-%d").to_string(),
      verified_time: now.format("%H:%M:%S").to_string(),
      verified_by:   agent_id.into(),
      verified_at:   now,
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// The event-scoped copy of a ticket, owned by the organiser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeRecord {
  pub key:          AttendeeKey,
  /// Back-reference to the purchasing account. `None` or blank means the
  /// record was denormalised incorrectly.
  pub attendee_uid: Option<String>,
  pub details:      TicketDetails,
  pub verified:     bool,
  pub verification: Option<VerificationStamp>,
}

impl AttendeeRecord {
  /// The back-reference, if present and non-blank.
  pub fn attendee_uid(&self) -> Option<&str> {
    self
      .attendee_uid
      .as_deref()
      .map(str::trim)
      .filter(|uid| !uid.is_empty())
  }

  /// The key of the matching history record, if the back-reference is usable.
  pub fn history_key(&self) -> Option<HistoryKey> {
    self
      .attendee_uid()
      .map(|uid| HistoryKey::new(uid, self.key.ticket_id.clone()))
  }

  pub fn view(&self) -> TicketView {
    TicketView::from_parts(
      &self.key.ticket_id,
      &self.details,
      self.verified,
      self.verification.clone(),
    )
  }
}

/// The account-scoped copy of a ticket, owned by the attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHistoryRecord {
  pub key:           HistoryKey,
  pub organizer_uid: String,
  pub event_id:      String,
  pub details:       TicketDetails,
  pub verified:      bool,
  pub verification:  Option<VerificationStamp>,
}

impl TicketHistoryRecord {
  pub fn view(&self) -> TicketView {
    TicketView::from_parts(
      &self.key.ticket_id,
      &self.details,
      self.verified,
      self.verification.clone(),
    )
  }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// The denormalised ticket shown to the agent at the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketView {
  pub ticket_id:     String,
  pub full_name:     String,
  pub email:         String,
  pub ticket_type:   String,
  pub purchase_date: String,
  pub purchase_time: String,
  pub reference:     String,
  pub is_verified:   bool,
  pub verification:  Option<VerificationStamp>,
}

impl TicketView {
  fn from_parts(
    ticket_id: &str,
    details: &TicketDetails,
    is_verified: bool,
    verification: Option<VerificationStamp>,
  ) -> Self {
    Self {
      ticket_id: ticket_id.to_owned(),
      full_name: details.full_name.clone(),
      email: details.email.clone(),
      ticket_type: details.ticket_type.clone(),
      purchase_date: details.purchase_date.clone(),
      purchase_time: details.purchase_time.clone(),
      reference: details.reference.clone(),
      is_verified,
      verification,
    }
  }
}
