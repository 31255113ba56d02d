//! JSON REST API for the animal-rescue platform.
//!
//! Exposes an axum [`Router`] backed by any [`RescueStore`] and
//! [`MediaStore`]. Every response, success or failure, uses the
//! `{status, data, message}` envelope.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = rescue_api::router(state)
//!   .nest_service("/media", ServeDir::new(media_dir));
//! ```

pub mod auth;
pub mod error;
pub mod form;
pub mod handlers;
pub mod media;
pub mod reply;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, patch, post},
};
use rescue_core::{media::MediaStore, store::RescueStore};
use serde::Deserialize;

use auth::{AuthConfig, Informant, Organization, Rescuer};
use handlers::{animals, health, informant, organization, rescuer, session};
use media::MediaPolicy;

/// Largest accepted request body; multipart uploads are buffered in memory.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RESCUE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "defaults::host")]
  pub host:                   String,
  #[serde(default = "defaults::port")]
  pub port:                   u16,
  pub store_path:             PathBuf,
  pub media_dir:              PathBuf,
  #[serde(default = "defaults::media_base_url")]
  pub media_base_url:         String,
  pub access_token_secret:    String,
  #[serde(default = "defaults::access_token_ttl_secs")]
  pub access_token_ttl_secs:  u64,
  pub refresh_token_secret:   String,
  #[serde(default = "defaults::refresh_token_ttl_secs")]
  pub refresh_token_ttl_secs: u64,
  #[serde(default = "defaults::secure_cookies")]
  pub secure_cookies:         bool,
  #[serde(default = "defaults::upload_attempts")]
  pub upload_attempts:        u32,
  #[serde(default = "defaults::upload_timeout_ms")]
  pub upload_timeout_ms:      u64,
  #[serde(default = "defaults::upload_backoff_ms")]
  pub upload_backoff_ms:      u64,
}

mod defaults {
  pub fn host() -> String { "127.0.0.1".into() }
  pub fn port() -> u16 { 8000 }
  pub fn media_base_url() -> String { "/media".into() }
  pub fn access_token_ttl_secs() -> u64 { 24 * 60 * 60 }
  pub fn refresh_token_ttl_secs() -> u64 { 10 * 24 * 60 * 60 }
  pub fn secure_cookies() -> bool { true }
  pub fn upload_attempts() -> u32 { 3 }
  pub fn upload_timeout_ms() -> u64 { 10_000 }
  pub fn upload_backoff_ms() -> u64 { 200 }
}

impl ServerConfig {
  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig {
      access_secret:   self.access_token_secret.clone(),
      access_ttl:      Duration::from_secs(self.access_token_ttl_secs),
      refresh_secret:  self.refresh_token_secret.clone(),
      refresh_ttl:     Duration::from_secs(self.refresh_token_ttl_secs),
      secure_cookies:  self.secure_cookies,
      password_params: argon2::Params::default(),
    }
  }

  pub fn media_policy(&self) -> MediaPolicy {
    MediaPolicy {
      attempts: self.upload_attempts,
      timeout:  Duration::from_millis(self.upload_timeout_ms),
      backoff:  Duration::from_millis(self.upload_backoff_ms),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, M> {
  pub store:        Arc<S>,
  pub media:        Arc<M>,
  pub auth:         Arc<AuthConfig>,
  pub media_policy: MediaPolicy,
}

impl<S, M> Clone for AppState<S, M> {
  fn clone(&self) -> Self {
    Self {
      store:        self.store.clone(),
      media:        self.media.clone(),
      auth:         self.auth.clone(),
      media_policy: self.media_policy,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full API router: `/healthcheck` plus everything under
/// `/api/v1`.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: RescueStore + 'static,
  M: MediaStore + 'static,
{
  let users = Router::new()
    .route("/register",        post(informant::register::<S, M>))
    .route("/login",           post(session::login::<S, M, Informant>))
    .route("/refresh-token",   post(session::refresh::<S, M, Informant>))
    .route("/logout",          post(session::logout::<S, M, Informant>))
    .route("/current-user",    get(session::current::<Informant>))
    .route("/change-password", patch(session::change_password::<S, M, Informant>))
    .route("/change-avatar",   patch(informant::change_avatar::<S, M>))
    .route("/create-animal",   post(informant::create_animal::<S, M>))
    .route("/get-all-animal",  get(informant::list_animals::<S, M>));

  let orgs = Router::new()
    .route("/register",        post(organization::register::<S, M>))
    .route("/login",           post(session::login::<S, M, Organization>))
    .route("/refresh-token",   post(session::refresh::<S, M, Organization>))
    .route("/logout",          post(session::logout::<S, M, Organization>))
    .route("/current-org",     get(session::current::<Organization>))
    .route("/change-password", patch(session::change_password::<S, M, Organization>))
    .route("/change-logo",     patch(organization::change_logo::<S, M>))
    .route("/add-rescuer",     post(organization::add_rescuer::<S, M>))
    .route("/rescuers",        get(organization::rescuers::<S, M>))
    .route("/remove-rescuer/{rescuer_id}", delete(organization::remove_rescuer::<S, M>))
    .route("/rescued-animals", get(organization::rescued_animals::<S, M>))
    .route(
      "/rescued-animal-report/{animal_id}",
      post(organization::file_report::<S, M>),
    );

  let rescuers = Router::new()
    .route("/login",           post(session::login::<S, M, Rescuer>))
    .route("/refresh-token",   post(session::refresh::<S, M, Rescuer>))
    .route("/logout",          post(session::logout::<S, M, Rescuer>))
    .route("/current-rescuer", get(session::current::<Rescuer>))
    .route("/change-password", patch(session::change_password::<S, M, Rescuer>))
    .route("/change-avatar",   patch(rescuer::change_avatar::<S, M>))
    .route("/rescued-animal/{animal_id}", post(rescuer::rescue::<S, M>))
    .route("/get-all-animal",  get(rescuer::rescued_animals::<S, M>));

  let animals = Router::new()
    .route("/get-all-animals",        get(animals::list::<S, M>))
    .route("/get-notrescued-animals", get(animals::list_unrescued::<S, M>))
    .route("/animal-info/{animal_id}", get(animals::get_one::<S, M>))
    .route("/animal-info/{animal_id}/report", get(animals::report::<S, M>));

  let api = Router::new()
    .route("/healthcheck", get(health::handler))
    .nest("/users", users)
    .nest("/orgs", orgs)
    .nest("/rescuers", rescuers)
    .nest("/animals", animals);

  Router::new()
    .route("/healthcheck", get(health::handler))
    .nest("/api/v1", api)
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(state)
}
