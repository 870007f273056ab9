//! SQL schema for the tixgate SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Event-scoped copy, owned by the organiser.
CREATE TABLE IF NOT EXISTS attendees (
    organizer_uid TEXT NOT NULL,
    event_id      TEXT NOT NULL,
    ticket_id     TEXT NOT NULL,
    attendee_uid  TEXT,             -- back-reference to ticket_history.account_uid
    full_name     TEXT NOT NULL,
    email         TEXT NOT NULL,
    ticket_type   TEXT NOT NULL,
    purchase_date TEXT NOT NULL,
    purchase_time TEXT NOT NULL,
    reference     TEXT NOT NULL,
    verified      INTEGER NOT NULL DEFAULT 0 CHECK (verified IN (0, 1)),
    verified_date TEXT,
    verified_time TEXT,
    verified_by   TEXT,
    verified_at   TEXT,             -- RFC 3339 UTC
    PRIMARY KEY (organizer_uid, event_id, ticket_id)
);

-- Account-scoped copy, owned by the attendee.
CREATE TABLE IF NOT EXISTS ticket_history (
    account_uid   TEXT NOT NULL,
    ticket_id     TEXT NOT NULL,
    organizer_uid TEXT NOT NULL,
    event_id      TEXT NOT NULL,
    full_name     TEXT NOT NULL,
    email         TEXT NOT NULL,
    ticket_type   TEXT NOT NULL,
    purchase_date TEXT NOT NULL,
    purchase_time TEXT NOT NULL,
    reference     TEXT NOT NULL,
    verified      INTEGER NOT NULL DEFAULT 0 CHECK (verified IN (0, 1)),
    verified_date TEXT,
    verified_time TEXT,
    verified_by   TEXT,
    verified_at   TEXT,
    PRIMARY KEY (account_uid, ticket_id)
);

CREATE INDEX IF NOT EXISTS attendees_event_idx ON attendees(organizer_uid, event_id);

PRAGMA user_version = 1;
";
