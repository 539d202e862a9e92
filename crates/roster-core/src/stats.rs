//! Dashboard statistics, derived from a snapshot of the person collection.
//!
//! Nothing here is cached or persisted: [`compute`] is a pure function of the
//! records handed to it and the clock values passed in.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::person::{Person, age_on, next_birthday};

/// Birthdays up to this many days ahead (inclusive) count as upcoming.
pub const BIRTHDAY_WINDOW_DAYS: i64 = 30;
pub const MAX_UPCOMING_BIRTHDAYS: usize = 10;
pub const MAX_RECENT_ACTIVITIES: usize = 5;
/// Growth is measured against the population this many days ago.
pub const GROWTH_WINDOW_DAYS: i64 = 30;

/// Fixed, non-overlapping age buckets as `(label, min, max)`.
pub const AGE_BUCKETS: [(&str, u32, u32); 5] = [
  ("18-25", 18, 25),
  ("26-35", 26, 35),
  ("36-45", 36, 45),
  ("46-55", 46, 55),
  ("56+", 56, u32::MAX),
];

// ─── Snapshot types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleStats {
  pub total_count:        usize,
  /// Growth of the live population over the last [`GROWTH_WINDOW_DAYS`];
  /// `None` when there was nobody to compare against.
  pub percentage_change:  Option<f64>,
  pub average_age:        f64,
  pub median_age:         f64,
  pub youngest:           u32,
  pub oldest:             u32,
  pub upcoming_birthdays: Vec<UpcomingBirthday>,
  pub age_groups:         Vec<AgeGroup>,
  pub recent_activities:  Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBirthday {
  pub id:                  Uuid,
  pub name:                String,
  pub date_of_birth:       NaiveDate,
  /// The age the person turns on the upcoming birthday.
  pub age:                 u32,
  pub days_until_birthday: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeGroup {
  pub range:      String,
  pub count:      usize,
  pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
  Add,
  Edit,
  Delete,
}

impl ActivityKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Add => "add",
      Self::Edit => "edit",
      Self::Delete => "delete",
    }
  }

  fn details(self) -> &'static str {
    match self {
      Self::Add => "Added to system",
      Self::Edit => "Profile updated",
      Self::Delete => "Removed from system",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
  /// Stable for a given person and kind.
  pub id:           Uuid,
  #[serde(rename = "type")]
  pub kind:         ActivityKind,
  pub person_id:    Uuid,
  pub person_name:  String,
  pub performed_by: String,
  pub timestamp:    DateTime<Utc>,
  pub details:      String,
}

// ─── Computation ─────────────────────────────────────────────────────────────

/// Compute the full snapshot.
///
/// `people` may include soft-deleted records. They are excluded from every
/// current figure, but still count towards the growth baseline while they were
/// alive and surface in the activity feed as deletions.
pub fn compute(
  people: &[Person],
  today: NaiveDate,
  now: DateTime<Utc>,
) -> PeopleStats {
  let live: Vec<&Person> = people.iter().filter(|p| !p.is_deleted).collect();
  let ages: Vec<u32> = live.iter().map(|p| p.age_on(today)).collect();

  PeopleStats {
    total_count:        live.len(),
    percentage_change:  percentage_change(people, now),
    average_age:        average(&ages),
    median_age:         round1(median(&ages)),
    youngest:           ages.iter().copied().min().unwrap_or(0),
    oldest:             ages.iter().copied().max().unwrap_or(0),
    upcoming_birthdays: upcoming_birthdays(&live, today),
    age_groups:         age_groups(&ages),
    recent_activities:  recent_activities(people),
  }
}

/// Middle value of `ages`; the mean of the two middle values for an even
/// count; `0.0` when empty.
pub fn median(ages: &[u32]) -> f64 {
  if ages.is_empty() {
    return 0.0;
  }
  let mut sorted = ages.to_vec();
  sorted.sort_unstable();
  let mid = sorted.len() / 2;
  if sorted.len() % 2 == 0 {
    (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
  } else {
    f64::from(sorted[mid])
  }
}

/// Arithmetic mean rounded to one decimal; `0.0` when empty.
pub fn average(ages: &[u32]) -> f64 {
  if ages.is_empty() {
    return 0.0;
  }
  let sum: f64 = ages.iter().copied().map(f64::from).sum();
  round1(sum / ages.len() as f64)
}

/// Tally `ages` into [`AGE_BUCKETS`]. Empty input yields an empty list rather
/// than zero-filled buckets.
pub fn age_groups(ages: &[u32]) -> Vec<AgeGroup> {
  if ages.is_empty() {
    return Vec::new();
  }
  let total = ages.len() as f64;
  AGE_BUCKETS
    .iter()
    .map(|&(range, min, max)| {
      let count = ages.iter().filter(|a| (min..=max).contains(*a)).count();
      AgeGroup {
        range: range.to_owned(),
        count,
        percentage: round1(count as f64 / total * 100.0),
      }
    })
    .collect()
}

/// People whose next birthday is within [`BIRTHDAY_WINDOW_DAYS`] of `today`,
/// soonest first.
pub fn upcoming_birthdays(
  people: &[&Person],
  today: NaiveDate,
) -> Vec<UpcomingBirthday> {
  let mut upcoming: Vec<UpcomingBirthday> = people
    .iter()
    .filter_map(|p| {
      let next = next_birthday(p.date_of_birth, today);
      let days = (next - today).num_days();
      (0..=BIRTHDAY_WINDOW_DAYS).contains(&days).then(|| UpcomingBirthday {
        id:                  p.id,
        name:                p.full_name(),
        date_of_birth:       p.date_of_birth,
        age:                 age_on(p.date_of_birth, next),
        days_until_birthday: days,
      })
    })
    .collect();
  upcoming.sort_by_key(|b| b.days_until_birthday);
  upcoming.truncate(MAX_UPCOMING_BIRTHDAYS);
  upcoming
}

/// The [`MAX_RECENT_ACTIVITIES`] most recently created or updated records,
/// each reported as its newest lifecycle event, newest event first.
///
/// Records are picked by [`Person::last_touched`], so a deletion alone does
/// not bring an old record into the feed.
pub fn recent_activities(people: &[Person]) -> Vec<Activity> {
  let mut touched: Vec<&Person> = people.iter().collect();
  touched.sort_by(|a, b| b.last_touched().cmp(&a.last_touched()));
  let mut activities: Vec<Activity> = touched
    .into_iter()
    .take(MAX_RECENT_ACTIVITIES)
    .map(activity_for)
    .collect();
  activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
  activities
}

fn activity_for(person: &Person) -> Activity {
  let (kind, actor, timestamp) = match person {
    Person { is_deleted: true, deleted_at: Some(at), .. } => {
      (ActivityKind::Delete, person.deleted_by.as_deref(), *at)
    }
    Person { updated_at: Some(at), updated_by: Some(by), .. } => {
      (ActivityKind::Edit, Some(by.as_str()), *at)
    }
    _ => (
      ActivityKind::Add,
      person.created_by.as_deref(),
      person.created_at,
    ),
  };
  Activity {
    id: Uuid::new_v5(&person.id, kind.as_str().as_bytes()),
    kind,
    person_id: person.id,
    person_name: person.full_name(),
    performed_by: actor.unwrap_or("System").to_owned(),
    timestamp,
    details: kind.details().to_owned(),
  }
}

/// Growth of the live population relative to its size [`GROWTH_WINDOW_DAYS`]
/// before `now`, reconstructed from the audit columns of every record.
pub fn percentage_change(people: &[Person], now: DateTime<Utc>) -> Option<f64> {
  let cutoff = now - Duration::days(GROWTH_WINDOW_DAYS);
  let previous = people
    .iter()
    .filter(|p| p.created_at <= cutoff)
    .filter(|p| !p.is_deleted || p.deleted_at.is_some_and(|at| at > cutoff))
    .count();
  if previous == 0 {
    return None;
  }
  let current = people.iter().filter(|p| !p.is_deleted).count() as f64;
  let previous = previous as f64;
  Some(round1((current - previous) / previous * 100.0))
}

fn round1(value: f64) -> f64 { (value * 10.0).round() / 10.0 }
