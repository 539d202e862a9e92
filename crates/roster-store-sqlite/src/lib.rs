//! SQLite backend for the Roster person store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Pass `:memory:` as the path (or use
//! [`SqliteStore::open_in_memory`]) for a non-durable store.

mod encode;
mod schema;
mod seed;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
