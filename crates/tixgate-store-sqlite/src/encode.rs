//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. The verification stamp is
//! spread over four nullable columns that are either all set or all NULL.

use chrono::{DateTime, Utc};
use tixgate_core::ticket::{
  AttendeeKey, AttendeeRecord, HistoryKey, TicketDetails, TicketHistoryRecord,
  VerificationStamp,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const ATTENDEE_COLUMNS: &str = "organizer_uid, event_id, ticket_id, \
  attendee_uid, full_name, email, ticket_type, purchase_date, purchase_time, \
  reference, verified, verified_date, verified_time, verified_by, verified_at";

pub const HISTORY_COLUMNS: &str = "account_uid, ticket_id, organizer_uid, \
  event_id, full_name, email, ticket_type, purchase_date, purchase_time, \
  reference, verified, verified_date, verified_time, verified_by, verified_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns shared by both tables, starting at `full_name`.
pub struct RawTicketColumns {
  pub full_name:     String,
  pub email:         String,
  pub ticket_type:   String,
  pub purchase_date: String,
  pub purchase_time: String,
  pub reference:     String,
  pub verified:      bool,
  pub verified_date: Option<String>,
  pub verified_time: Option<String>,
  pub verified_by:   Option<String>,
  pub verified_at:   Option<String>,
}

impl RawTicketColumns {
  /// Read the shared columns, which start at index `at`.
  fn from_row(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      full_name:     row.get(at)?,
      email:         row.get(at + 1)?,
      ticket_type:   row.get(at + 2)?,
      purchase_date: row.get(at + 3)?,
      purchase_time: row.get(at + 4)?,
      reference:     row.get(at + 5)?,
      verified:      row.get(at + 6)?,
      verified_date: row.get(at + 7)?,
      verified_time: row.get(at + 8)?,
      verified_by:   row.get(at + 9)?,
      verified_at:   row.get(at + 10)?,
    })
  }

  fn into_parts(
    self,
  ) -> Result<(TicketDetails, bool, Option<VerificationStamp>)> {
    let stamp = match (
      self.verified_date,
      self.verified_time,
      self.verified_by,
      self.verified_at,
    ) {
      (Some(verified_date), Some(verified_time), Some(verified_by), Some(at)) => {
        Some(VerificationStamp {
          verified_date,
          verified_time,
          verified_by,
          verified_at: decode_dt(&at)?,
        })
      }
      _ => None,
    };

    let details = TicketDetails {
      full_name:     self.full_name,
      email:         self.email,
      ticket_type:   self.ticket_type,
      purchase_date: self.purchase_date,
      purchase_time: self.purchase_time,
      reference:     self.reference,
    };

    Ok((details, self.verified, stamp))
  }
}

/// Raw values read from an `attendees` row selected with [`ATTENDEE_COLUMNS`].
pub struct RawAttendee {
  pub organizer_uid: String,
  pub event_id:      String,
  pub ticket_id:     String,
  pub attendee_uid:  Option<String>,
  pub ticket:        RawTicketColumns,
}

impl RawAttendee {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      organizer_uid: row.get(0)?,
      event_id:      row.get(1)?,
      ticket_id:     row.get(2)?,
      attendee_uid:  row.get(3)?,
      ticket:        RawTicketColumns::from_row(row, 4)?,
    })
  }

  pub fn into_record(self) -> Result<AttendeeRecord> {
    let (details, verified, verification) = self.ticket.into_parts()?;
    Ok(AttendeeRecord {
      key: AttendeeKey {
        organizer_uid: self.organizer_uid,
        event_id:      self.event_id,
        ticket_id:     self.ticket_id,
      },
      attendee_uid: self.attendee_uid,
      details,
      verified,
      verification,
    })
  }
}

/// Raw values read from a `ticket_history` row selected with
/// [`HISTORY_COLUMNS`].
pub struct RawHistory {
  pub account_uid:   String,
  pub ticket_id:     String,
  pub organizer_uid: String,
  pub event_id:      String,
  pub ticket:        RawTicketColumns,
}

impl RawHistory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_uid:   row.get(0)?,
      ticket_id:     row.get(1)?,
      organizer_uid: row.get(2)?,
      event_id:      row.get(3)?,
      ticket:        RawTicketColumns::from_row(row, 4)?,
    })
  }

  pub fn into_record(self) -> Result<TicketHistoryRecord> {
    let (details, verified, verification) = self.ticket.into_parts()?;
    Ok(TicketHistoryRecord {
      key: HistoryKey {
        account_uid: self.account_uid,
        ticket_id:   self.ticket_id,
      },
      organizer_uid: self.organizer_uid,
      event_id: self.event_id,
      details,
      verified,
      verification,
    })
  }
}
