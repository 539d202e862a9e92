//! The `PersonStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! Higher layers (`roster-api`, `roster-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{
  page::{PageRequest, PagedResult},
  person::{Person, PersonInput, shift_years},
  validate::ValidationErrors,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// The column a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
  #[default]
  CreatedAt,
  FirstName,
  LastName,
  /// Ordered by computed age: ascending puts the youngest first.
  Age,
}

impl SortField {
  /// Parse the `sortBy` parameter. Unknown or missing values fall back to
  /// creation order.
  pub fn from_param(value: Option<&str>) -> Self {
    match value.map(str::to_ascii_lowercase).as_deref() {
      Some("firstname") => Self::FirstName,
      Some("lastname") => Self::LastName,
      Some("age") => Self::Age,
      _ => Self::CreatedAt,
    }
  }
}

/// Inclusive bounds on computed age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgeRange {
  pub min: Option<u32>,
  pub max: Option<u32>,
}

/// Date-of-birth bounds equivalent to an [`AgeRange`] on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DobBounds {
  /// Inclusive lower bound (from the maximum age).
  pub earliest: Option<NaiveDate>,
  /// Inclusive upper bound (from the minimum age).
  pub latest:   Option<NaiveDate>,
}

impl AgeRange {
  pub fn is_unbounded(&self) -> bool {
    self.min.is_none() && self.max.is_none()
  }

  /// Translate the age bounds into date-of-birth bounds on `today`, so the
  /// filter can be evaluated by the storage engine.
  ///
  /// `age >= min` holds exactly when the birth date is on or before `today`
  /// shifted back `min` years; `age <= max` holds exactly when it is after
  /// `today` shifted back `max + 1` years.
  pub fn dob_bounds(&self, today: NaiveDate) -> DobBounds {
    let back = |years: u32| {
      i32::try_from(years)
        .ok()
        .and_then(|y| shift_years(today, -y))
    };
    DobBounds {
      earliest: self
        .max
        .and_then(|max| back(max.saturating_add(1)))
        .and_then(|d| d.checked_add_days(Days::new(1))),
      latest:   self.min.map(|min| back(min).unwrap_or(NaiveDate::MIN)),
    }
  }

  /// Check raw `minAge`/`maxAge` query values.
  pub fn new(
    min: Option<i64>,
    max: Option<i64>,
  ) -> Result<Self, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut convert = |field: &str, value: Option<i64>| match value {
      None => None,
      Some(v) => match u32::try_from(v) {
        Ok(v) => Some(v),
        Err(_) => {
          errors.add(field, "Age bounds must not be negative");
          None
        }
      },
    };
    let range = Self {
      min: convert("minAge", min),
      max: convert("maxAge", max),
    };
    errors.into_result().map(|()| range)
  }
}

/// Parameters for [`PersonStore::list_people`].
#[derive(Debug, Clone, Default)]
pub struct PersonQuery {
  /// Substring matched against first or last name, case-insensitively.
  pub search:     Option<String>,
  pub sort_by:    SortField,
  pub descending: bool,
  pub page:       PageRequest,
  /// Applied before counting and paging.
  pub age:        AgeRange,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a person store backend.
///
/// Soft-deleted records are invisible to every read except
/// [`PersonStore::restore_person`] and `all_people(true)`.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PersonStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new person with a fresh id; `created_by` is set to `actor`.
  fn create_person(
    &self,
    input: PersonInput,
    actor: &str,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send;

  /// Retrieve a live person by id. Returns `None` if absent or soft-deleted.
  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Overwrite the mutable fields of a live person.
  ///
  /// Returns `None` if the person is absent or soft-deleted.
  fn update_person(
    &self,
    id: Uuid,
    input: PersonInput,
    actor: &str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send;

  /// Mark a live person as deleted. Returns `false` if the person is absent
  /// or already deleted.
  fn soft_delete_person(
    &self,
    id: Uuid,
    actor: &str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Clear the deleted flag on a person, bypassing the delete filter.
  ///
  /// Returns `None` only if the id was never stored.
  fn restore_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// One page of live people matching `query`, with age computed on `today`.
  fn list_people<'a>(
    &'a self,
    query: &'a PersonQuery,
    today: NaiveDate,
  ) -> impl Future<Output = Result<PagedResult<Person>, Self::Error>> + Send + 'a;

  /// Every stored person, optionally including soft-deleted ones.
  fn all_people(
    &self,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::person::age_on;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn sort_field_parses_case_insensitively() {
    assert_eq!(SortField::from_param(Some("FirstName")), SortField::FirstName);
    assert_eq!(SortField::from_param(Some("lastname")), SortField::LastName);
    assert_eq!(SortField::from_param(Some("AGE")), SortField::Age);
    assert_eq!(SortField::from_param(Some("height")), SortField::CreatedAt);
    assert_eq!(SortField::from_param(None), SortField::CreatedAt);
  }

  #[test]
  fn dob_bounds_agree_with_age_on() {
    let today = d(2026, 10, 19);
    let range = AgeRange { min: Some(30), max: Some(40) };
    let bounds = range.dob_bounds(today);
    let earliest = bounds.earliest.unwrap();
    let latest = bounds.latest.unwrap();

    assert_eq!(age_on(latest, today), 30);
    assert_eq!(age_on(latest.succ_opt().unwrap(), today), 29);
    assert_eq!(age_on(earliest, today), 40);
    assert_eq!(age_on(earliest.pred_opt().unwrap(), today), 41);
  }

  #[test]
  fn unbounded_range_has_no_bounds() {
    let range = AgeRange::default();
    assert!(range.is_unbounded());
    assert_eq!(range.dob_bounds(d(2026, 10, 19)), DobBounds::default());
  }

  #[test]
  fn negative_age_bounds_are_rejected() {
    let err = AgeRange::new(Some(-1), Some(20)).unwrap_err();
    assert!(err.fields().contains_key("minAge"));
    assert_eq!(
      AgeRange::new(Some(18), None).unwrap(),
      AgeRange { min: Some(18), max: None }
    );
  }
}
