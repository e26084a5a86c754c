//! Webhook handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/webhook` | Secret in the body `apiKey` field |
//! | `POST` | `/api/webhook/{key}` | Secret as a path segment |
//! | `GET`  | `/api/webhook/{key}` | Health check, no side effects |

use std::time::Instant;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use raidledger_core::store::RaidStore;
use raidledger_ingest::{RawPayload, ingest};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::Error};

// ─── Response body ───────────────────────────────────────────────────────────

/// Structured summary returned on every non-rejected ingestion, including
/// `partial` outcomes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
  pub success:           bool,
  pub raid_id:           Uuid,
  pub zone:              String,
  pub date:              NaiveDate,
  pub records_processed: u32,
  pub records_failed:    u32,
  /// At most five error strings; omitted entirely when clean.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub errors:            Option<Vec<String>>,
  /// Total elapsed processing time, e.g. `"42ms"`.
  pub duration:          String,
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

/// `POST /api/webhook/{key}`
pub async fn ingest_with_path_key<S>(
  State(state): State<AppState<S>>,
  Path(key): Path<String>,
  Json(raw): Json<RawPayload>,
) -> Result<Json<IngestResponse>, Error>
where
  S: RaidStore + Clone + Send + Sync + 'static,
{
  run(state, Some(key), raw).await
}

/// `POST /api/webhook` — the secret travels in the body instead.
pub async fn ingest_with_body_key<S>(
  State(state): State<AppState<S>>,
  Json(raw): Json<RawPayload>,
) -> Result<Json<IngestResponse>, Error>
where
  S: RaidStore + Clone + Send + Sync + 'static,
{
  run(state, None, raw).await
}

async fn run<S>(
  state: AppState<S>,
  path_key: Option<String>,
  raw: RawPayload,
) -> Result<Json<IngestResponse>, Error>
where
  S: RaidStore + Clone + Send + Sync + 'static,
{
  let started = Instant::now();

  let candidate = path_key.as_deref().or(raw.api_key.as_deref());
  state.secret.verify(candidate)?;

  let normalized = raw.normalize()?;
  let report = ingest(&*state.store, normalized).await?;

  tracing::info!(
    zone = %report.zone,
    session = %report.session_id,
    processed = report.records_processed,
    failed = report.records_failed,
    "ingestion complete"
  );

  let errors = if report.errors.is_empty() {
    None
  } else {
    Some(report.errors.into_iter().take(5).collect())
  };

  Ok(Json(IngestResponse {
    success:           true,
    raid_id:           report.session_id,
    zone:              report.zone,
    date:              report.date,
    records_processed: report.records_processed,
    records_failed:    report.records_failed,
    errors,
    duration:          format!("{}ms", started.elapsed().as_millis()),
  }))
}

// ─── Health check ────────────────────────────────────────────────────────────

/// `GET /api/webhook/{key}` — credential check with no side effects.
pub async fn health<S>(
  State(state): State<AppState<S>>,
  Path(key): Path<String>,
) -> Response
where
  S: RaidStore + Clone + Send + Sync + 'static,
{
  match state.secret.verify(Some(&key)) {
    Ok(()) => Json(json!({
      "status": "ok",
      "message": "raidledger webhook ready"
    }))
    .into_response(),
    Err(_) => (
      StatusCode::UNAUTHORIZED,
      Json(json!({ "status": "error", "message": "Invalid API key" })),
    )
      .into_response(),
  }
}
