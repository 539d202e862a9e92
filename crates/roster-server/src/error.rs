//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or rejected bearer token.
  #[error("unauthorized")]
  Unauthorized,
  /// Login with an unknown email or a wrong password.
  #[error("invalid credentials")]
  InvalidCredentials,
  #[error("too many login attempts")]
  TooManyRequests,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("auth error: {0}")]
  Auth(#[from] AuthError),
}

fn message(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "message": message }))).into_response()
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = message(StatusCode::UNAUTHORIZED, "Unauthorized");
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        res
      }
      Error::InvalidCredentials => {
        message(StatusCode::UNAUTHORIZED, "Invalid credentials")
      }
      Error::TooManyRequests => {
        message(StatusCode::TOO_MANY_REQUESTS, "Too many login attempts")
      }
      Error::BadRequest(msg) => message(StatusCode::BAD_REQUEST, &msg),
      Error::Auth(e) => {
        tracing::error!(error = %e, "authentication failed unexpectedly");
        message(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred")
      }
    }
  }
}
