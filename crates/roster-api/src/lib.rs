//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any [`roster_core::store::PersonStore`].
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility; the caller passes the acting identity in as an [`Actor`]
//! request extension.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest(roster_api::API_PREFIX, roster_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod people;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch},
};
use roster_core::store::PersonStore;

pub use error::ApiError;
pub use people::{Actor, PersonView};

/// The path the API router is expected to be nested under.
pub const API_PREFIX: &str = "/api/v1";

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: PersonStore + 'static,
{
  Router::new()
    .route("/people", get(people::list::<S>).post(people::create::<S>))
    .route("/people/stats", get(people::stats::<S>))
    .route(
      "/people/{id}",
      get(people::get_one::<S>)
        .put(people::update::<S>)
        .delete(people::delete::<S>),
    )
    .route("/people/{id}/restore", patch(people::restore::<S>))
    .with_state(store)
}
