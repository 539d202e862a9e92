//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with a fixed microsecond width so that text order
//! equals time order. Dates are ISO 8601. UUIDs are hyphenated lowercase.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use roster_core::person::Person;
use uuid::Uuid;

use crate::{Error, Result};

/// Column list shared by every `SELECT` that feeds [`raw_person`].
pub const PERSON_COLUMNS: &str = "id, first_name, last_name, date_of_birth, \
   created_at, created_by, updated_at, updated_by, \
   is_deleted, deleted_at, deleted_by";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row ──────────────────────────────────────────────────────────────────

/// A `people` row exactly as read from SQLite, before parsing.
pub struct RawPerson {
  pub id:            String,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: String,
  pub created_at:    String,
  pub created_by:    Option<String>,
  pub updated_at:    Option<String>,
  pub updated_by:    Option<String>,
  pub is_deleted:    bool,
  pub deleted_at:    Option<String>,
  pub deleted_by:    Option<String>,
}

/// Row mapper for queries selecting [`PERSON_COLUMNS`].
pub fn raw_person(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPerson> {
  Ok(RawPerson {
    id:            row.get(0)?,
    first_name:    row.get(1)?,
    last_name:     row.get(2)?,
    date_of_birth: row.get(3)?,
    created_at:    row.get(4)?,
    created_by:    row.get(5)?,
    updated_at:    row.get(6)?,
    updated_by:    row.get(7)?,
    is_deleted:    row.get(8)?,
    deleted_at:    row.get(9)?,
    deleted_by:    row.get(10)?,
  })
}

impl RawPerson {
  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:            decode_uuid(&self.id)?,
      first_name:    self.first_name,
      last_name:     self.last_name,
      date_of_birth: decode_date(&self.date_of_birth)?,
      created_at:    decode_dt(&self.created_at)?,
      created_by:    self.created_by,
      updated_at:    self.updated_at.as_deref().map(decode_dt).transpose()?,
      updated_by:    self.updated_by,
      is_deleted:    self.is_deleted,
      deleted_at:    self.deleted_at.as_deref().map(decode_dt).transpose()?,
      deleted_by:    self.deleted_by,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_have_fixed_width() {
    let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let b = a + chrono::Duration::microseconds(1);
    assert_eq!(encode_dt(a), "2026-01-02T03:04:05.000000Z");
    assert_eq!(encode_dt(a).len(), encode_dt(b).len());
    assert!(encode_dt(a) < encode_dt(b));
  }

  #[test]
  fn timestamp_roundtrip_at_store_precision() {
    let t = now();
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
  }

  #[test]
  fn rejects_malformed_date() {
    assert!(matches!(decode_date("1995-13-01"), Err(Error::DateParse(_))));
    assert_eq!(
      decode_date(&encode_date(NaiveDate::from_ymd_opt(1995, 1, 1).unwrap()))
        .unwrap(),
      NaiveDate::from_ymd_opt(1995, 1, 1).unwrap()
    );
  }
}
