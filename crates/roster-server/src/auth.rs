//! Demo login and bearer-token verification.
//!
//! A single identity is configured at startup. A successful login yields an
//! HS256 JWT whose `name` claim becomes the actor recorded in audit columns.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::http::{HeaderMap, header};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Shortest accepted HMAC secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

// ─── Configuration ────────────────────────────────────────────────────────────

/// The one identity allowed to log in, plus token parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default = "Uuid::new_v4")]
  pub user_id:       Uuid,
  #[serde(default = "default_first_name")]
  pub first_name:    String,
  #[serde(default = "default_last_name")]
  pub last_name:     String,
  pub jwt_secret:    String,
  #[serde(default = "default_issuer")]
  pub issuer:        String,
  #[serde(default = "default_audience")]
  pub audience:      String,
  #[serde(default = "default_token_lifetime_secs")]
  pub token_lifetime_secs: u64,
}

fn default_first_name() -> String { "Test".into() }
fn default_last_name() -> String { "User".into() }
fn default_issuer() -> String { "Roster".into() }
fn default_audience() -> String { "RosterUsers".into() }
fn default_token_lifetime_secs() -> u64 { 24 * 60 * 60 }

impl AuthConfig {
  /// Reject settings that would make every login fail or every token weak.
  pub fn check(&self) -> Result<(), AuthError> {
    if self.jwt_secret.len() < MIN_SECRET_LEN {
      return Err(AuthError::Config(format!(
        "jwt_secret must be at least {MIN_SECRET_LEN} bytes"
      )));
    }
    PasswordHash::new(&self.password_hash)
      .map_err(|e| AuthError::Config(format!("bad password_hash: {e}")))?;
    Ok(())
  }

  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// Produce a PHC string suitable for `auth.password_hash`, with a fresh salt
/// and the default argon2id parameters.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| AuthError::Crypto(e.to_string()))
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AuthError {
  #[error("token expired")]
  TokenExpired,
  #[error("invalid token: {0}")]
  TokenInvalid(String),
  #[error("auth configuration: {0}")]
  Config(String),
  #[error("token encoding: {0}")]
  Crypto(String),
}

// ─── Tokens ───────────────────────────────────────────────────────────────────

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub:   String,
  pub email: String,
  /// Display name; recorded as the actor on mutations.
  pub name:  String,
  pub iss:   String,
  pub aud:   String,
  pub iat:   i64,
  pub exp:   i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
  pub id:         Uuid,
  pub email:      String,
  pub first_name: String,
  pub last_name:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token:      String,
  /// Seconds until the token expires.
  pub expires_in: u64,
  pub user:       LoginUser,
}

/// Check `email`/`password` against the configured identity.
///
/// Returns `Ok(None)` for any mismatch without saying which field was wrong.
/// The password is verified even when the email does not match.
pub fn login(
  config: &AuthConfig,
  email: &str,
  password: &str,
) -> Result<Option<LoginResponse>, AuthError> {
  let email_ok = email.to_lowercase() == config.email.to_lowercase();

  let parsed = PasswordHash::new(&config.password_hash)
    .map_err(|e| AuthError::Config(format!("bad password_hash: {e}")))?;
  let password_ok = Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok();

  if !(email_ok && password_ok) {
    return Ok(None);
  }

  let token = issue_token(config)?;
  Ok(Some(LoginResponse {
    token,
    expires_in: config.token_lifetime_secs,
    user: LoginUser {
      id:         config.user_id,
      email:      config.email.clone(),
      first_name: config.first_name.clone(),
      last_name:  config.last_name.clone(),
    },
  }))
}

/// Sign a fresh token for the configured identity.
pub fn issue_token(config: &AuthConfig) -> Result<String, AuthError> {
  let now = Utc::now().timestamp();
  let lifetime = i64::try_from(config.token_lifetime_secs).unwrap_or(i64::MAX);
  let claims = Claims {
    sub:   config.user_id.to_string(),
    email: config.email.clone(),
    name:  config.display_name(),
    iss:   config.issuer.clone(),
    aud:   config.audience.clone(),
    iat:   now,
    exp:   now.saturating_add(lifetime),
  };

  let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
  jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
    .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Verify signature, issuer, audience and expiry of `token`.
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims, AuthError> {
  let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

  let mut validation = Validation::new(Algorithm::HS256);
  validation.set_issuer(&[&config.issuer]);
  validation.set_audience(&[&config.audience]);
  validation.set_required_spec_claims(&["sub", "exp", "iss", "aud"]);

  jsonwebtoken::decode::<Claims>(token, &key, &validation)
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
      jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
      _ => AuthError::TokenInvalid(e.to_string()),
    })
}

/// The token from an `Authorization: Bearer …` header.
///
/// `Ok(None)` when the header is absent; an error when it is present but is
/// not a bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value
    .to_str()
    .map_err(|_| AuthError::TokenInvalid("non-ASCII authorization header".into()))?;
  value
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(Some)
    .ok_or_else(|| AuthError::TokenInvalid("expected a bearer token".into()))
}

#[cfg(test)]
pub(crate) mod tests {
  use argon2::{Algorithm as ArgonAlgorithm, Params, Version};
  use axum::http::HeaderValue;

  use super::*;

  /// Cheap argon2 parameters; verification reads them back from the hash.
  pub(crate) fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(
      ArgonAlgorithm::Argon2id,
      Version::V0x13,
      Params::new(8, 1, 1, None).unwrap(),
    )
    .hash_password(password.as_bytes(), &salt)
    .unwrap()
    .to_string()
  }

  pub(crate) fn test_config() -> AuthConfig {
    AuthConfig {
      email:         "test@example.com".into(),
      password_hash: hash("Password123!"),
      user_id:       Uuid::new_v4(),
      first_name:    default_first_name(),
      last_name:     default_last_name(),
      jwt_secret:    "unit-test-secret-that-is-long-enough".into(),
      issuer:        default_issuer(),
      audience:      default_audience(),
      token_lifetime_secs: default_token_lifetime_secs(),
    }
  }

  #[test]
  fn hashed_password_is_accepted_at_login() {
    let config = AuthConfig {
      password_hash: hash_password("Sesame").unwrap(),
      ..test_config()
    };
    config.check().unwrap();
    assert!(login(&config, "test@example.com", "Sesame").unwrap().is_some());
    assert!(login(&config, "test@example.com", "sesame").unwrap().is_none());
  }

  #[test]
  fn login_succeeds_with_configured_identity() {
    let config = test_config();
    let resp = login(&config, "test@example.com", "Password123!").unwrap().unwrap();
    assert!(!resp.token.is_empty());
    assert_eq!(resp.expires_in, 86_400);
    assert_eq!(resp.user.first_name, "Test");

    let claims = verify_token(&config, &resp.token).unwrap();
    assert_eq!(claims.name, "Test User");
    assert_eq!(claims.sub, config.user_id.to_string());
  }

  #[test]
  fn login_email_is_case_insensitive() {
    let config = test_config();
    assert!(login(&config, "TEST@Example.com", "Password123!").unwrap().is_some());
  }

  #[test]
  fn login_rejects_wrong_password_or_email() {
    let config = test_config();
    assert!(login(&config, "test@example.com", "password123!").unwrap().is_none());
    assert!(login(&config, "other@example.com", "Password123!").unwrap().is_none());
  }

  #[test]
  fn verify_rejects_other_secret() {
    let config = test_config();
    let token = issue_token(&config).unwrap();
    let other = AuthConfig {
      jwt_secret: "a-completely-different-secret-value".into(),
      ..config
    };
    assert!(matches!(verify_token(&other, &token), Err(AuthError::TokenInvalid(_))));
  }

  #[test]
  fn verify_rejects_wrong_audience() {
    let config = test_config();
    let token = issue_token(&config).unwrap();
    let other = AuthConfig { audience: "Someone Else".into(), ..config };
    assert!(verify_token(&other, &token).is_err());
  }

  #[test]
  fn verify_rejects_expired_token() {
    let config = test_config();
    let now = Utc::now().timestamp();
    let claims = Claims {
      sub:   "x".into(),
      email: config.email.clone(),
      name:  "Test User".into(),
      iss:   config.issuer.clone(),
      aud:   config.audience.clone(),
      iat:   now - 7200,
      exp:   now - 3600,
    };
    let token = jsonwebtoken::encode(
      &Header::new(Algorithm::HS256),
      &claims,
      &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .unwrap();
    assert!(matches!(verify_token(&config, &token), Err(AuthError::TokenExpired)));
  }

  #[test]
  fn check_rejects_short_secret() {
    let config = AuthConfig { jwt_secret: "short".into(), ..test_config() };
    assert!(matches!(config.check(), Err(AuthError::Config(_))));
    assert!(test_config().check().is_ok());
  }

  #[test]
  fn bearer_token_parsing() {
    let mut headers = HeaderMap::new();
    assert!(bearer_token(&headers).unwrap().is_none());

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
    assert_eq!(bearer_token(&headers).unwrap(), Some("abc"));

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert!(bearer_token(&headers).is_err());
  }
}
