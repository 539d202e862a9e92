//! HTTP composition layer for Roster.
//!
//! Mounts the people API under `/api/v1` behind the bearer-token actor
//! middleware, adds the demo login endpoint and a health check, and wires in
//! tracing and CORS layers.

pub mod auth;
pub mod error;
pub mod ratelimit;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Request, State, rejection::JsonRejection},
  middleware::{self, Next},
  response::Response,
  routing::{get, post},
};
use config::{ConfigError, Environment};
use roster_api::{API_PREFIX, Actor, api_router};
use roster_core::store::PersonStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use auth::{AuthConfig, LoginRequest, LoginResponse};
use ratelimit::FixedWindow;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROSTER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  /// Insert demo people when the store is empty.
  #[serde(default)]
  pub seed_demo_data:         bool,
  /// Reject `/api/v1` requests that carry no bearer token.
  #[serde(default)]
  pub require_auth:           bool,
  /// Allow any origin; for local front-end development.
  #[serde(default)]
  pub cors_permissive:        bool,
  #[serde(default = "default_login_rate_limit")]
  pub login_rate_limit:       u32,
  #[serde(default = "default_login_rate_window_secs")]
  pub login_rate_window_secs: u64,
  pub auth:                   AuthConfig,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("roster.db") }
fn default_login_rate_limit() -> u32 { 5 }
fn default_login_rate_window_secs() -> u64 { 15 * 60 }

impl ServerConfig {
  /// Read `path`, if it exists, overlaid by `ROSTER_*` environment variables
  /// such as `ROSTER_PORT=9000` or `ROSTER_AUTH__JWT_SECRET=...`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_source(config::File::from(path).required(false))
  }

  fn from_source<T>(file: T) -> Result<Self, ConfigError>
  where
    T: config::Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .add_source(file)
      .add_source(
        Environment::with_prefix("ROSTER")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers and middleware.
pub struct AppState<S: PersonStore> {
  pub store:         Arc<S>,
  pub config:        Arc<ServerConfig>,
  pub auth:          Arc<AuthConfig>,
  pub login_limiter: Arc<FixedWindow>,
}

impl<S: PersonStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let login_limiter = FixedWindow::new(
      config.login_rate_limit,
      Duration::from_secs(config.login_rate_window_secs),
    );
    Self {
      store:         Arc::new(store),
      auth:          Arc::new(config.auth.clone()),
      config:        Arc::new(config),
      login_limiter: Arc::new(login_limiter),
    }
  }
}

impl<S: PersonStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:         self.store.clone(),
      config:        self.config.clone(),
      auth:          self.auth.clone(),
      login_limiter: self.login_limiter.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PersonStore + 'static,
{
  let people = api_router(state.store.clone()).layer(
    middleware::from_fn_with_state(state.clone(), actor_middleware::<S>),
  );

  let login = Router::new()
    .route("/auth/login", post(login_handler::<S>))
    .with_state(state.clone());

  let app = Router::new()
    .nest(API_PREFIX, people.merge(login))
    .route("/api/healthz", get(healthz))
    .layer(TraceLayer::new_for_http());

  if state.config.cors_permissive {
    app.layer(CorsLayer::permissive())
  } else {
    app
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn healthz() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// `POST /api/v1/auth/login`, body: `{"email","password"}`
async fn login_handler<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, Error>
where
  S: PersonStore,
{
  if !state.login_limiter.try_acquire() {
    tracing::warn!("login rate limit exceeded");
    return Err(Error::TooManyRequests);
  }
  let Json(body) = body.map_err(|e| Error::BadRequest(e.body_text()))?;

  match auth::login(&state.auth, &body.email, &body.password)? {
    Some(resp) => {
      tracing::info!(email = %resp.user.email, "login succeeded");
      Ok(Json(resp))
    }
    None => {
      tracing::info!("login rejected");
      Err(Error::InvalidCredentials)
    }
  }
}

/// Resolve the acting identity from the bearer token, if any, and attach it
/// to the request as an [`Actor`] extension.
async fn actor_middleware<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: PersonStore,
{
  let token = auth::bearer_token(req.headers()).map_err(|e| {
    tracing::debug!(error = %e, "malformed authorization header");
    Error::Unauthorized
  })?;

  match token {
    Some(token) => {
      let claims = auth::verify_token(&state.auth, token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        Error::Unauthorized
      })?;
      req.extensions_mut().insert(Actor(claims.name));
    }
    None if state.config.require_auth => return Err(Error::Unauthorized),
    None => {}
  }

  Ok(next.run(req).await)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
