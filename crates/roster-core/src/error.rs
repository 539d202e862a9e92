//! Error types for `roster-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::validate::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
