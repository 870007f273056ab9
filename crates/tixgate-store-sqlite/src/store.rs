//! [`SqliteStore`] — the SQLite implementation of [`TicketStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use tixgate_core::{
  store::{
    CheckInSummary, CommitOutcome, IssueOutcome, IssuedTicket, NewTicket, TicketStore,
  },
  ticket::{
    AttendeeKey, AttendeeRecord, HistoryKey, TicketHistoryRecord,
    VerificationStamp,
  },
};

use crate::{
  Error, Result,
  encode::{ATTENDEE_COLUMNS, HISTORY_COLUMNS, RawAttendee, RawHistory, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tixgate ticket store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the store, bypassing every invariant.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── TicketStore impl ────────────────────────────────────────────────────────

impl TicketStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_attendee(&self, key: &AttendeeKey) -> Result<Option<AttendeeRecord>> {
    let key = key.clone();

    let raw: Option<RawAttendee> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ATTENDEE_COLUMNS} FROM attendees
               WHERE organizer_uid = ?1 AND event_id = ?2 AND ticket_id = ?3"
            ),
            rusqlite::params![key.organizer_uid, key.event_id, key.ticket_id],
            RawAttendee::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAttendee::into_record).transpose()
  }

  async fn get_history(&self, key: &HistoryKey) -> Result<Option<TicketHistoryRecord>> {
    let key = key.clone();

    let raw: Option<RawHistory> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {HISTORY_COLUMNS} FROM ticket_history
               WHERE account_uid = ?1 AND ticket_id = ?2"
            ),
            rusqlite::params![key.account_uid, key.ticket_id],
            RawHistory::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawHistory::into_record).transpose()
  }

  // ── Verification ──────────────────────────────────────────────────────────

  async fn commit_verification(
    &self,
    attendee: &AttendeeKey,
    history:  &HistoryKey,
    stamp:    &VerificationStamp,
  ) -> Result<CommitOutcome> {
    let attendee = attendee.clone();
    let history  = history.clone();
    let date     = stamp.verified_date.clone();
    let time     = stamp.verified_time.clone();
    let by       = stamp.verified_by.clone();
    let at       = encode_dt(stamp.verified_at);

    let outcome = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so the guard read and both
        // updates see the same snapshot.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let verified: Option<bool> = tx
          .query_row(
            "SELECT verified FROM attendees
             WHERE organizer_uid = ?1 AND event_id = ?2 AND ticket_id = ?3",
            rusqlite::params![
              attendee.organizer_uid,
              attendee.event_id,
              attendee.ticket_id
            ],
            |r| r.get(0),
          )
          .optional()?;

        match verified {
          None => return Ok(CommitOutcome::AttendeeMissing),
          Some(true) => return Ok(CommitOutcome::AlreadyVerified),
          Some(false) => {}
        }

        let history_rows = tx.execute(
          "UPDATE ticket_history
           SET verified = 1, verified_date = ?3, verified_time = ?4,
               verified_by = ?5, verified_at = ?6
           WHERE account_uid = ?1 AND ticket_id = ?2",
          rusqlite::params![history.account_uid, history.ticket_id, date, time, by, at],
        )?;
        if history_rows == 0 {
          // Dropping `tx` rolls back.
          return Ok(CommitOutcome::HistoryMissing);
        }

        let attendee_rows = tx.execute(
          "UPDATE attendees
           SET verified = 1, verified_date = ?4, verified_time = ?5,
               verified_by = ?6, verified_at = ?7
           WHERE organizer_uid = ?1 AND event_id = ?2 AND ticket_id = ?3
             AND verified = 0",
          rusqlite::params![
            attendee.organizer_uid,
            attendee.event_id,
            attendee.ticket_id,
            date,
            time,
            by,
            at
          ],
        )?;
        if attendee_rows == 0 {
          return Ok(CommitOutcome::AlreadyVerified);
        }

        tx.commit()?;
        Ok(CommitOutcome::Applied)
      })
      .await?;

    Ok(outcome)
  }

  // ── Purchase ──────────────────────────────────────────────────────────────

  async fn issue_ticket(&self, input: NewTicket) -> Result<IssueOutcome> {
    let ticket_id = input
      .ticket_id
      .map(|id| id.trim().to_owned())
      .filter(|id| !id.is_empty())
      .unwrap_or_else(|| Uuid::new_v4().hyphenated().to_string());

    let attendee = AttendeeRecord {
      key:          AttendeeKey::new(&input.organizer_uid, &input.event_id, &ticket_id),
      attendee_uid: Some(input.attendee_uid.clone()),
      details:      input.details.clone(),
      verified:     false,
      verification: None,
    };
    let history = TicketHistoryRecord {
      key:           HistoryKey::new(&input.attendee_uid, &ticket_id),
      organizer_uid: input.organizer_uid,
      event_id:      input.event_id,
      details:       input.details,
      verified:      false,
      verification:  None,
    };

    let a = attendee.clone();
    let h = history.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let attendee_taken = tx
          .query_row(
            "SELECT 1 FROM attendees
             WHERE organizer_uid = ?1 AND event_id = ?2 AND ticket_id = ?3",
            rusqlite::params![a.key.organizer_uid, a.key.event_id, a.key.ticket_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        let history_taken = tx
          .query_row(
            "SELECT 1 FROM ticket_history
             WHERE account_uid = ?1 AND ticket_id = ?2",
            rusqlite::params![h.key.account_uid, h.key.ticket_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if attendee_taken || history_taken {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO attendees (
             organizer_uid, event_id, ticket_id, attendee_uid,
             full_name, email, ticket_type, purchase_date, purchase_time, reference
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            a.key.organizer_uid,
            a.key.event_id,
            a.key.ticket_id,
            a.attendee_uid,
            a.details.full_name,
            a.details.email,
            a.details.ticket_type,
            a.details.purchase_date,
            a.details.purchase_time,
            a.details.reference,
          ],
        )?;

        tx.execute(
          "INSERT INTO ticket_history (
             account_uid, ticket_id, organizer_uid, event_id,
             full_name, email, ticket_type, purchase_date, purchase_time, reference
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            h.key.account_uid,
            h.key.ticket_id,
            h.organizer_uid,
            h.event_id,
            h.details.full_name,
            h.details.email,
            h.details.ticket_type,
            h.details.purchase_date,
            h.details.purchase_time,
            h.details.reference,
          ],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      tracing::debug!(ticket_id = %ticket_id, "duplicate ticket not issued");
      return Ok(IssueOutcome::Duplicate { ticket_id });
    }

    tracing::debug!(
      event_id = %attendee.key.event_id,
      ticket_id = %attendee.key.ticket_id,
      "ticket issued"
    );

    Ok(IssueOutcome::Issued(IssuedTicket { attendee, history }))
  }

  // ── Door views ────────────────────────────────────────────────────────────

  async fn list_attendees(
    &self,
    organizer_uid: &str,
    event_id:      &str,
  ) -> Result<Vec<AttendeeRecord>> {
    let organizer_uid = organizer_uid.to_owned();
    let event_id      = event_id.to_owned();

    let raws: Vec<RawAttendee> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTENDEE_COLUMNS} FROM attendees
           WHERE organizer_uid = ?1 AND event_id = ?2
           ORDER BY full_name, ticket_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![organizer_uid, event_id], RawAttendee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendee::into_record).collect()
  }

  async fn check_in_summary(
    &self,
    organizer_uid: &str,
    event_id:      &str,
  ) -> Result<CheckInSummary> {
    let organizer_uid = organizer_uid.to_owned();
    let event_id      = event_id.to_owned();

    let (total, verified): (i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(verified), 0) FROM attendees
           WHERE organizer_uid = ?1 AND event_id = ?2",
          rusqlite::params![organizer_uid, event_id],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
      })
      .await?;

    Ok(CheckInSummary {
      total:    total.max(0) as u64,
      verified: verified.max(0) as u64,
    })
  }

  async fn list_history(&self, account_uid: &str) -> Result<Vec<TicketHistoryRecord>> {
    let account_uid = account_uid.to_owned();

    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {HISTORY_COLUMNS} FROM ticket_history
           WHERE account_uid = ?1
           ORDER BY purchase_date DESC, purchase_time DESC, ticket_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![account_uid], RawHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_record).collect()
  }
}
