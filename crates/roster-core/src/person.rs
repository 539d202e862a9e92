//! Person: the one record type the service tracks.
//!
//! Age is never stored. It is derived from the date of birth and the calendar
//! date at read time, so a record read tomorrow may report a different age
//! than the same record read today.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Person ──────────────────────────────────────────────────────────────────

/// A tracked individual together with its audit and soft-delete columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:            Uuid,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: NaiveDate,

  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  pub created_by: Option<String>,
  pub updated_at: Option<DateTime<Utc>>,
  pub updated_by: Option<String>,

  /// Soft-deleted rows stay addressable by id so they can be restored.
  pub is_deleted: bool,
  pub deleted_at: Option<DateTime<Utc>>,
  pub deleted_by: Option<String>,
}

impl Person {
  /// Build a fresh, never-updated record for `input`.
  pub fn new(input: PersonInput, actor: &str, now: DateTime<Utc>) -> Self {
    Self {
      id:            Uuid::new_v4(),
      first_name:    input.first_name,
      last_name:     input.last_name,
      date_of_birth: input.date_of_birth,
      created_at:    now,
      created_by:    Some(actor.to_owned()),
      updated_at:    None,
      updated_by:    None,
      is_deleted:    false,
      deleted_at:    None,
      deleted_by:    None,
    }
  }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  /// Age in whole years on `today`.
  pub fn age_on(&self, today: NaiveDate) -> u32 {
    age_on(self.date_of_birth, today)
  }

  /// The most recent audit timestamp among creation and update. Deletion
  /// does not count.
  pub fn last_touched(&self) -> DateTime<Utc> {
    self.updated_at.unwrap_or(self.created_at)
  }
}

// ─── PersonInput ─────────────────────────────────────────────────────────────

/// The mutable fields of a [`Person`], already checked.
///
/// Request bodies arrive as [`PersonForm`](crate::validate::PersonForm) and
/// become a `PersonInput` only through validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonInput {
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: NaiveDate,
}

/// Parse `YYYY-MM-DD`, an RFC 3339 timestamp, or a naive ISO 8601 timestamp.
pub fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    .or_else(|| {
      NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
    })
}

// ─── Date arithmetic ─────────────────────────────────────────────────────────

/// Shift `date` by whole years. Feb 29 lands on Feb 28 in non-leap years.
pub fn shift_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
  let months = Months::new(years.unsigned_abs().checked_mul(12)?);
  if years >= 0 {
    date.checked_add_months(months)
  } else {
    date.checked_sub_months(months)
  }
}

/// Whole years between `date_of_birth` and `today`, never negative.
///
/// The naive year difference is reduced by one when the birthday has not yet
/// been reached in `today`'s year.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
  let mut age = today.year() - date_of_birth.year();
  if shift_years(today, -age).is_some_and(|anchor| date_of_birth > anchor) {
    age -= 1;
  }
  u32::try_from(age).unwrap_or(0)
}

/// The next date, on or after `today`, on which the birthday falls.
///
/// A Feb 29 birthday is observed on Mar 1 in non-leap years, which is the
/// first day [`age_on`] counts the extra year.
pub fn next_birthday(date_of_birth: NaiveDate, today: NaiveDate) -> NaiveDate {
  let this_year = anniversary_in(date_of_birth, today.year());
  if this_year >= today {
    this_year
  } else {
    anniversary_in(date_of_birth, today.year() + 1)
  }
}

fn anniversary_in(date_of_birth: NaiveDate, year: i32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, date_of_birth.month(), date_of_birth.day())
    .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
    .unwrap_or(NaiveDate::MAX)
}
