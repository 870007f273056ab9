//! The `TicketStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `tixgate-store-sqlite`).
//! Higher layers (`tixgate-api`, `tixgate-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::ticket::{
  AttendeeKey, AttendeeRecord, HistoryKey, TicketDetails, TicketHistoryRecord,
  VerificationStamp,
};

// ─── Inputs and results ──────────────────────────────────────────────────────

/// Input to [`TicketStore::issue_ticket`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
  pub organizer_uid: String,
  pub event_id:      String,
  /// Externally generated ticket ID. The store generates one when absent.
  pub ticket_id:     Option<String>,
  pub attendee_uid:  String,
  pub details:       TicketDetails,
}

/// Both records written by [`TicketStore::issue_ticket`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedTicket {
  pub attendee: AttendeeRecord,
  pub history:  TicketHistoryRecord,
}

/// What [`TicketStore::issue_ticket`] did.
#[derive(Debug, Clone)]
pub enum IssueOutcome {
  /// Both records were written.
  Issued(IssuedTicket),
  /// An attendee record for this event, or a history record for this
  /// account, already carries the ticket ID; nothing was written.
  Duplicate { ticket_id: String },
}

/// What [`TicketStore::commit_verification`] found at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
  /// Both records now read `verified = true`.
  Applied,
  /// The attendee record was already verified; nothing was written.
  AlreadyVerified,
  /// The attendee record no longer exists; nothing was written.
  AttendeeMissing,
  /// The history record does not exist; nothing was written.
  HistoryMissing,
}

/// Check-in progress for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInSummary {
  pub total:    u64,
  pub verified: u64,
}

impl CheckInSummary {
  pub fn remaining(&self) -> u64 { self.total.saturating_sub(self.verified) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a tixgate ticket store backend.
///
/// Records are created once at purchase and mutated once at verification.
/// Nothing in this trait deletes a record.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TicketStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve an attendee record. Returns `None` if not found.
  fn get_attendee<'a>(
    &'a self,
    key: &'a AttendeeKey,
  ) -> impl Future<Output = Result<Option<AttendeeRecord>, Self::Error>> + Send + 'a;

  /// Retrieve a ticket-history record. Returns `None` if not found.
  fn get_history<'a>(
    &'a self,
    key: &'a HistoryKey,
  ) -> impl Future<Output = Result<Option<TicketHistoryRecord>, Self::Error>>
  + Send
  + 'a;

  // ── Verification ──────────────────────────────────────────────────────

  /// Apply `stamp` to both the attendee and history records atomically.
  ///
  /// The write happens only if the attendee record still reads
  /// `verified = false` and the history record exists at commit time;
  /// otherwise nothing is written and the returned [`CommitOutcome`] says why.
  fn commit_verification<'a>(
    &'a self,
    attendee: &'a AttendeeKey,
    history: &'a HistoryKey,
    stamp: &'a VerificationStamp,
  ) -> impl Future<Output = Result<CommitOutcome, Self::Error>> + Send + 'a;

  // ── Purchase ──────────────────────────────────────────────────────────

  /// Create both records for a newly purchased ticket, unverified.
  ///
  /// The ticket ID is trimmed before use. If either record key is already
  /// taken, nothing is written and [`IssueOutcome::Duplicate`] is returned.
  fn issue_ticket(
    &self,
    input: NewTicket,
  ) -> impl Future<Output = Result<IssueOutcome, Self::Error>> + Send + '_;

  // ── Door views ────────────────────────────────────────────────────────

  /// All attendee records for an event, ordered by full name.
  fn list_attendees<'a>(
    &'a self,
    organizer_uid: &'a str,
    event_id: &'a str,
  ) -> impl Future<Output = Result<Vec<AttendeeRecord>, Self::Error>> + Send + 'a;

  /// Verified and total ticket counts for an event.
  fn check_in_summary<'a>(
    &'a self,
    organizer_uid: &'a str,
    event_id: &'a str,
  ) -> impl Future<Output = Result<CheckInSummary, Self::Error>> + Send + 'a;

  /// An account's own ticket history, newest purchase first.
  fn list_history<'a>(
    &'a self,
    account_uid: &'a str,
  ) -> impl Future<Output = Result<Vec<TicketHistoryRecord>, Self::Error>>
  + Send
  + 'a;
}
