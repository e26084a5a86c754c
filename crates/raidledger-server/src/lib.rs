//! HTTP webhook surface for RaidLedger.
//!
//! Exposes an axum [`Router`] that accepts addon uploads on `/api/webhook`
//! (secret in the body) and `/api/webhook/{key}` (secret in the path), plus a
//! side-effect-free `GET` health check on the keyed route. Backed by any
//! [`RaidStore`].

pub mod auth;
pub mod error;
pub mod webhook;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::post};
use raidledger_core::store::RaidStore;
use serde::Deserialize;

use auth::SharedSecret;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `RAIDLEDGER_*` environment.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Shared secret the addon must present on every upload.
  pub api_key:    String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RaidStore> {
  pub store:  Arc<S>,
  pub secret: Arc<SharedSecret>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the webhook [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RaidStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/api/webhook",       post(webhook::ingest_with_body_key::<S>))
    .route(
      "/api/webhook/{key}",
      post(webhook::ingest_with_path_key::<S>).get(webhook::health::<S>),
    )
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
