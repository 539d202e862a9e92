//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are never physically deleted; is_deleted marks a soft delete.
CREATE TABLE IF NOT EXISTS people (
    id            TEXT PRIMARY KEY,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,   -- ISO 8601 calendar date
    created_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond width
    created_by    TEXT,
    updated_at    TEXT,
    updated_by    TEXT,
    is_deleted    INTEGER NOT NULL DEFAULT 0,
    deleted_at    TEXT,
    deleted_by    TEXT
);

CREATE INDEX IF NOT EXISTS people_live_created_idx ON people(is_deleted, created_at);
CREATE INDEX IF NOT EXISTS people_dob_idx          ON people(date_of_birth);

PRAGMA user_version = 1;
";
