//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as a JSON object with a human-readable `message`;
//! validation failures add an `errors` map from field name to messages.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use roster_core::validate::ValidationErrors;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Store(Box::new(e))
  }
}

impl From<roster_core::Error> for ApiError {
  fn from(e: roster_core::Error) -> Self {
    match e {
      roster_core::Error::PersonNotFound(_) => ApiError::NotFound(e.to_string()),
      roster_core::Error::Validation(errors) => ApiError::Validation(errors),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

// A path segment that is not a UUID can never name a stored person.
impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    ApiError::NotFound(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "message": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "message": m }))).into_response()
      }
      ApiError::Validation(errors) => (
        StatusCode::BAD_REQUEST,
        Json(json!({
          "message": "One or more validation errors occurred",
          "errors": errors,
        })),
      )
        .into_response(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store operation failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "message": "An unexpected error occurred" })),
        )
          .into_response()
      }
    }
  }
}
