//! Demo records for development databases.

use chrono::{Duration, NaiveDate};
use roster_core::person::{Person, PersonInput};

use crate::{Result, SqliteStore, encode::now};

struct Demo {
  first:         &'static str,
  last:          &'static str,
  born:          (i32, u32, u32),
  created_hours: i64,
  created_by:    &'static str,
  /// `(hours ago, by)` for records that have been edited since.
  updated:       Option<(i64, &'static str)>,
}

const fn demo(
  first: &'static str,
  last: &'static str,
  born: (i32, u32, u32),
  created_hours: i64,
  created_by: &'static str,
) -> Demo {
  Demo { first, last, born, created_hours, created_by, updated: None }
}

const DEMO_PEOPLE: [Demo; 7] = [
  demo("John", "Doe", (1985, 9, 15), 7 * 24, "Admin"),
  demo("Jane", "Smith", (1990, 9, 20), 5 * 24, "Admin"),
  demo("Alice", "Brown", (2000, 9, 25), 3 * 24, "Test User"),
  Demo {
    updated: Some((24, "Admin")),
    ..demo("Bob", "Johnson", (1995, 9, 10), 2 * 24, "Test User")
  },
  demo("Carol", "Williams", (1988, 9, 12), 12, "System"),
  demo("David", "Miller", (1992, 10, 5), 6, "Test User"),
  demo("Emma", "Davis", (1998, 11, 30), 2, "Admin"),
];

impl SqliteStore {
  /// Insert the demo people if the store holds no rows at all.
  ///
  /// Returns the number of rows inserted.
  pub async fn seed_demo_people(&self) -> Result<usize> {
    let existing: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))?)
      })
      .await?;
    if existing > 0 {
      tracing::debug!(existing, "store not empty; skipping demo seed");
      return Ok(0);
    }

    let now = now();
    for demo in &DEMO_PEOPLE {
      let (y, m, d) = demo.born;
      let Some(date_of_birth) = NaiveDate::from_ymd_opt(y, m, d) else {
        continue;
      };
      let mut person = Person::new(
        PersonInput {
          first_name: demo.first.to_owned(),
          last_name: demo.last.to_owned(),
          date_of_birth,
        },
        demo.created_by,
        now - Duration::hours(demo.created_hours),
      );
      if let Some((hours, by)) = demo.updated {
        person.updated_at = Some(now - Duration::hours(hours));
        person.updated_by = Some(by.to_owned());
      }
      self.insert_person(&person).await?;
    }

    tracing::info!(count = DEMO_PEOPLE.len(), "seeded demo people");
    Ok(DEMO_PEOPLE.len())
  }
}
