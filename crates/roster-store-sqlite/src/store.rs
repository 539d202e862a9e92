//! [`SqliteStore`], the SQLite implementation of [`PersonStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use roster_core::{
  page::PagedResult,
  person::{Person, PersonInput},
  store::{PersonQuery, PersonStore, SortField},
};

use crate::{
  Result,
  encode::{
    PERSON_COLUMNS, RawPerson, encode_date, encode_dt, encode_uuid, now,
    raw_person,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A person store backed by a single SQLite database.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// The special path `:memory:` opens a private in-memory database.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = if path.as_ref() == Path::new(":memory:") {
      tokio_rusqlite::Connection::open_in_memory().await?
    } else {
      tokio_rusqlite::Connection::open(path).await?
    };
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
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

  /// Insert a fully-built [`Person`] into the `people` table.
  pub(crate) async fn insert_person(&self, person: &Person) -> Result<()> {
    let id_str         = encode_uuid(person.id);
    let first_name     = person.first_name.clone();
    let last_name      = person.last_name.clone();
    let dob_str        = encode_date(person.date_of_birth);
    let created_at_str = encode_dt(person.created_at);
    let created_by     = person.created_by.clone();
    let updated_at_str = person.updated_at.map(encode_dt);
    let updated_by     = person.updated_by.clone();
    let is_deleted     = person.is_deleted;
    let deleted_at_str = person.deleted_at.map(encode_dt);
    let deleted_by     = person.deleted_by.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (
             id, first_name, last_name, date_of_birth,
             created_at, created_by, updated_at, updated_by,
             is_deleted, deleted_at, deleted_by
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str,
            first_name,
            last_name,
            dob_str,
            created_at_str,
            created_by,
            updated_at_str,
            updated_by,
            is_deleted,
            deleted_at_str,
            deleted_by,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch a live (not soft-deleted) row by id.
  async fn fetch_live(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);
    let sql =
      format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?1 AND is_deleted = 0");

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], raw_person)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }
}

/// `ORDER BY` clause for a listing. Every variant ends in `created_at, id` so
/// that paging over equal sort keys is deterministic.
fn order_clause(sort_by: SortField, descending: bool) -> String {
  let dir = if descending { "DESC" } else { "ASC" };
  match sort_by {
    SortField::CreatedAt => format!("created_at {dir}, id {dir}"),
    SortField::FirstName => format!("first_name COLLATE NOCASE {dir}, created_at, id"),
    SortField::LastName => format!("last_name COLLATE NOCASE {dir}, created_at, id"),
    // Younger people have later birth dates, so age order is the reverse of
    // date-of-birth order.
    SortField::Age => {
      let dob_dir = if descending { "ASC" } else { "DESC" };
      format!("date_of_birth {dob_dir}, created_at, id")
    }
  }
}

/// Turn a free-text search into a `LIKE` pattern with wildcards escaped.
fn like_pattern(search: &str) -> String {
  let mut pattern = String::with_capacity(search.len() + 2);
  pattern.push('%');
  for c in search.chars() {
    if matches!(c, '\\' | '%' | '_') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── PersonStore impl ────────────────────────────────────────────────────────

impl PersonStore for SqliteStore {
  type Error = crate::Error;

  async fn create_person(&self, input: PersonInput, actor: &str) -> Result<Person> {
    let person = Person::new(input, actor, now());
    self.insert_person(&person).await?;
    Ok(person)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    self.fetch_live(id).await
  }

  async fn update_person(
    &self,
    id:    Uuid,
    input: PersonInput,
    actor: &str,
  ) -> Result<Option<Person>> {
    let id_str         = encode_uuid(id);
    let dob_str        = encode_date(input.date_of_birth);
    let updated_at_str = encode_dt(now());
    let actor          = actor.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE people
              SET first_name = ?2, last_name = ?3, date_of_birth = ?4,
                  updated_at = ?5, updated_by = ?6
            WHERE id = ?1 AND is_deleted = 0",
          rusqlite::params![
            id_str,
            input.first_name,
            input.last_name,
            dob_str,
            updated_at_str,
            actor,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_live(id).await
  }

  async fn soft_delete_person(&self, id: Uuid, actor: &str) -> Result<bool> {
    let id_str         = encode_uuid(id);
    let deleted_at_str = encode_dt(now());
    let actor          = actor.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE people
              SET is_deleted = 1, deleted_at = ?2, deleted_by = ?3
            WHERE id = ?1 AND is_deleted = 0",
          rusqlite::params![id_str, deleted_at_str, actor],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn restore_person(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE people
              SET is_deleted = 0, deleted_at = NULL, deleted_by = NULL
            WHERE id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_live(id).await
  }

  async fn list_people(
    &self,
    query: &PersonQuery,
    today: NaiveDate,
  ) -> Result<PagedResult<Person>> {
    let pattern = query
      .search
      .as_deref()
      .filter(|s| !s.trim().is_empty())
      .map(like_pattern);
    let bounds       = query.age.dob_bounds(today);
    let earliest_str = bounds.earliest.map(encode_date);
    let latest_str   = bounds.latest.map(encode_date);
    let limit_val    = i64::from(query.page.page_size());
    let offset_val   = i64::try_from(query.page.offset()).unwrap_or(i64::MAX);
    let order        = order_clause(query.sort_by, query.descending);

    let (total, raws): (i64, Vec<RawPerson>) = self
      .conn
      .call(move |conn| {
        const FILTER: &str = "WHERE is_deleted = 0
             AND (?1 IS NULL OR first_name LIKE ?1 ESCAPE '\\'
                             OR last_name  LIKE ?1 ESCAPE '\\')
             AND (?2 IS NULL OR date_of_birth >= ?2)
             AND (?3 IS NULL OR date_of_birth <= ?3)";

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM people {FILTER}"),
          rusqlite::params![pattern, earliest_str, latest_str],
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM people {FILTER}
           ORDER BY {order}
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              pattern,
              earliest_str,
              latest_str,
              limit_val,
              offset_val,
            ],
            raw_person,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawPerson::into_person)
      .collect::<Result<Vec<_>>>()?;

    Ok(PagedResult::new(
      items,
      u64::try_from(total).unwrap_or(0),
      query.page,
    ))
  }

  async fn all_people(&self, include_deleted: bool) -> Result<Vec<Person>> {
    let sql = if include_deleted {
      format!("SELECT {PERSON_COLUMNS} FROM people ORDER BY created_at, id")
    } else {
      format!(
        "SELECT {PERSON_COLUMNS} FROM people WHERE is_deleted = 0
         ORDER BY created_at, id"
      )
    };

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], raw_person)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("an"), "%an%");
    assert_eq!(like_pattern("5%_\\"), "%5\\%\\_\\\\%");
  }

  #[test]
  fn age_order_reverses_birth_date_order() {
    assert!(order_clause(SortField::Age, false).starts_with("date_of_birth DESC"));
    assert!(order_clause(SortField::Age, true).starts_with("date_of_birth ASC"));
    assert_eq!(order_clause(SortField::CreatedAt, true), "created_at DESC, id DESC");
  }
}
