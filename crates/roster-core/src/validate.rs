//! Field-level validation for person input.
//!
//! Errors are collected per field rather than short-circuiting, so a client
//! can show every problem with a form at once.

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use thiserror::Error;

use crate::person::{PersonInput, age_on, parse_lenient_date};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_AGE_YEARS: u32 = 150;

static NAME_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z' -]+$").expect("valid name regex"));

// ─── ValidationErrors ────────────────────────────────────────────────────────

/// A map from JSON field name to the messages describing what is wrong with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("{}", Summary(.fields))]
pub struct ValidationErrors {
  fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self
      .fields
      .entry(field.to_owned())
      .or_default()
      .push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.fields.is_empty() }

  pub fn fields(&self) -> &BTreeMap<String, Vec<String>> { &self.fields }

  /// `Ok(())` when nothing was recorded.
  pub fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

struct Summary<'a>(&'a BTreeMap<String, Vec<String>>);

impl fmt::Display for Summary<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field}: {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

// ─── Request body ────────────────────────────────────────────────────────────

/// One body field as received: absent, a string, or some other JSON value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RawField {
  #[default]
  Missing,
  Text(String),
  Malformed,
}

impl RawField {
  /// The text as sent, if the field held a non-blank string.
  fn text(&self) -> Option<&str> {
    match self {
      Self::Text(s) if !s.trim().is_empty() => Some(s),
      _ => None,
    }
  }
}

impl<'de> Deserialize<'de> for RawField {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
      Text(String),
      Null(()),
      Other(IgnoredAny),
    }
    Ok(match Repr::deserialize(deserializer)? {
      Repr::Text(s) => Self::Text(s),
      Repr::Null(()) => Self::Missing,
      Repr::Other(_) => Self::Malformed,
    })
  }
}

/// The body of both create and update, before any field is trusted.
///
/// Every field is optional at this stage so that missing or mistyped values
/// are reported per field instead of failing the whole body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonForm {
  pub first_name:    RawField,
  pub last_name:     RawField,
  /// A plain date or a full timestamp; only the date part is kept.
  pub date_of_birth: RawField,
}

/// Turn a received body into a [`PersonInput`], collecting every problem.
pub fn validate_form(
  form: &PersonForm,
  today: NaiveDate,
) -> Result<PersonInput, ValidationErrors> {
  let mut errors = ValidationErrors::default();
  let first_name = form.first_name.text().unwrap_or_default();
  let last_name = form.last_name.text().unwrap_or_default();
  check_name(&mut errors, "firstName", "First name", first_name);
  check_name(&mut errors, "lastName", "Last name", last_name);

  let date_of_birth = match &form.date_of_birth {
    RawField::Text(raw) if !raw.trim().is_empty() => parse_lenient_date(raw),
    RawField::Malformed => None,
    _ => {
      errors.add("dateOfBirth", "Date of birth is required");
      return Err(errors);
    }
  };
  let Some(date_of_birth) = date_of_birth else {
    errors.add("dateOfBirth", "Please enter a valid date");
    return Err(errors);
  };
  check_date_of_birth(&mut errors, date_of_birth, today);

  errors.into_result()?;
  Ok(PersonInput {
    first_name: first_name.to_owned(),
    last_name: last_name.to_owned(),
    date_of_birth,
  })
}

// ─── Rules ───────────────────────────────────────────────────────────────────

fn check_name(
  errors: &mut ValidationErrors,
  field: &str,
  label: &str,
  value: &str,
) {
  if value.trim().is_empty() {
    errors.add(field, format!("{label} is required"));
    return;
  }
  if value.chars().count() > MAX_NAME_LEN {
    errors.add(
      field,
      format!("{label} must be between 1 and {MAX_NAME_LEN} characters"),
    );
  }
  if !NAME_RE.is_match(value) {
    errors.add(
      field,
      format!(
        "{label} can only contain letters, spaces, hyphens and apostrophes"
      ),
    );
  }
}

fn check_date_of_birth(
  errors: &mut ValidationErrors,
  date_of_birth: NaiveDate,
  today: NaiveDate,
) {
  if date_of_birth >= today {
    errors.add("dateOfBirth", "Date of birth must be in the past");
    return;
  }
  if age_on(date_of_birth, today) > MAX_AGE_YEARS {
    errors.add(
      "dateOfBirth",
      format!("Age must be between 0 and {MAX_AGE_YEARS} years"),
    );
  }
}
