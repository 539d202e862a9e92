//! Handlers for `/people` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/people` | `?page&pageSize&search&sortBy&sortOrder&minAge&maxAge` |
//! | `GET`    | `/people/stats` | Aggregate snapshot |
//! | `GET`    | `/people/{id}` | 404 if absent or deleted |
//! | `POST`   | `/people` | 201 with `Location` |
//! | `PUT`    | `/people/{id}` | Full replacement of the editable fields |
//! | `DELETE` | `/people/{id}` | Soft delete, 204 |
//! | `PATCH`  | `/people/{id}/restore` | Undo a soft delete |

use std::{convert::Infallible, sync::Arc};

use axum::{
  Json,
  extract::{
    FromRequestParts, Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::{StatusCode, header, request::Parts},
  response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{
  Error,
  page::{PageRequest, PagedResult},
  person::Person,
  stats::{self, PeopleStats},
  store::{AgeRange, PersonQuery, PersonStore, SortField},
  validate::{PersonForm, validate_form},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{API_PREFIX, error::ApiError};

// ─── Actor ────────────────────────────────────────────────────────────────────

/// The identity recorded in audit columns for the current request.
///
/// The composition layer inserts one as a request extension after
/// authenticating; requests without one act as `"System"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
  pub const SYSTEM: &'static str = "System";

  pub fn system() -> Self { Actor(Self::SYSTEM.to_owned()) }
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(
      parts
        .extensions
        .get::<Actor>()
        .cloned()
        .unwrap_or_else(Actor::system),
    )
  }
}

// ─── View ─────────────────────────────────────────────────────────────────────

/// A person as returned to clients, with age computed at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonView {
  pub id:            Uuid,
  pub first_name:    String,
  pub last_name:     String,
  pub date_of_birth: NaiveDate,
  pub age:           u32,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
}

impl PersonView {
  pub fn new(person: Person, today: NaiveDate) -> Self {
    Self {
      age:           person.age_on(today),
      id:            person.id,
      first_name:    person.first_name,
      last_name:     person.last_name,
      date_of_birth: person.date_of_birth,
      created_at:    person.created_at,
      updated_at:    person.updated_at,
    }
  }
}

fn today() -> NaiveDate { Utc::now().date_naive() }

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub page:       Option<i64>,
  pub page_size:  Option<i64>,
  pub search:     Option<String>,
  pub sort_by:    Option<String>,
  pub sort_order: Option<String>,
  pub min_age:    Option<i64>,
  pub max_age:    Option<i64>,
}

impl ListParams {
  /// Check the raw parameters and build a store query, reporting every bad
  /// field at once.
  pub fn into_query(self) -> Result<PersonQuery, ApiError> {
    let page = PageRequest::new(self.page.unwrap_or(1), self.page_size.unwrap_or(10));
    let age = AgeRange::new(self.min_age, self.max_age);

    let (page, age) = match (page, age) {
      (Ok(page), Ok(age)) => (page, age),
      (Err(mut errors), Err(more)) => {
        for (field, messages) in more.fields() {
          for message in messages {
            errors.add(field, message.clone());
          }
        }
        return Err(errors.into());
      }
      (Err(errors), _) | (_, Err(errors)) => return Err(errors.into()),
    };

    Ok(PersonQuery {
      search: self.search.filter(|s| !s.trim().is_empty()),
      sort_by: SortField::from_param(self.sort_by.as_deref()),
      descending: self
        .sort_order
        .is_some_and(|o| o.eq_ignore_ascii_case("desc")),
      page,
      age,
    })
  }
}

/// `GET /people`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PagedResult<PersonView>>, ApiError>
where
  S: PersonStore,
{
  let Query(params) = params?;
  let query = params.into_query()?;
  let today = today();

  let page = store
    .list_people(&query, today)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page.map(|p| PersonView::new(p, today))))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /people/stats`
pub async fn stats<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<PeopleStats>, ApiError>
where
  S: PersonStore,
{
  let people = store.all_people(true).await.map_err(ApiError::store)?;
  let now = Utc::now();
  Ok(Json(stats::compute(&people, now.date_naive(), now)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /people/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PersonView>, ApiError>
where
  S: PersonStore,
{
  let Path(id) = id?;
  let person = store
    .get_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(Error::PersonNotFound(id))?;
  Ok(Json(PersonView::new(person, today())))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /people`, body: `{"firstName","lastName","dateOfBirth"}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  body: Result<Json<PersonForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: PersonStore,
{
  let Json(form) = body?;
  let today = today();
  let input = validate_form(&form, today)?;

  let person = store
    .create_person(input, &actor.0)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(id = %person.id, actor = %actor.0, "person created");

  let location = format!("{API_PREFIX}/people/{}", person.id);
  Ok((
    StatusCode::CREATED,
    [(header::LOCATION, location)],
    Json(PersonView::new(person, today)),
  ))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /people/{id}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
  actor: Actor,
  body: Result<Json<PersonForm>, JsonRejection>,
) -> Result<Json<PersonView>, ApiError>
where
  S: PersonStore,
{
  let Path(id) = id?;
  let Json(form) = body?;
  let today = today();
  let input = validate_form(&form, today)?;

  let person = store
    .update_person(id, input, &actor.0)
    .await
    .map_err(ApiError::store)?
    .ok_or(Error::PersonNotFound(id))?;
  tracing::info!(%id, actor = %actor.0, "person updated");
  Ok(Json(PersonView::new(person, today)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /people/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
  actor: Actor,
) -> Result<StatusCode, ApiError>
where
  S: PersonStore,
{
  let Path(id) = id?;
  let deleted = store
    .soft_delete_person(id, &actor.0)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(Error::PersonNotFound(id).into());
  }
  tracing::info!(%id, actor = %actor.0, "person deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Restore ──────────────────────────────────────────────────────────────────

/// `PATCH /people/{id}/restore`
pub async fn restore<S>(
  State(store): State<Arc<S>>,
  id: Result<Path<Uuid>, PathRejection>,
  actor: Actor,
) -> Result<Json<PersonView>, ApiError>
where
  S: PersonStore,
{
  let Path(id) = id?;
  let person = store
    .restore_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(Error::PersonNotFound(id))?;
  tracing::info!(%id, actor = %actor.0, "person restored");
  Ok(Json(PersonView::new(person, today())))
}
