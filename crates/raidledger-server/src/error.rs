//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use raidledger_ingest::IngestError;
use serde_json::json;
use thiserror::Error;

/// An error returned by a webhook handler.
#[derive(Debug, Error)]
pub enum Error {
  /// Bad or missing shared secret; rejected before any processing.
  #[error("Invalid API key")]
  Unauthorized,

  /// Malformed payload; rejected before any processing.
  #[error("{0}")]
  Validation(String),

  /// Unexpected failure mid-pipeline. Already-applied writes are not rolled
  /// back.
  #[error("{0}")]
  Internal(String),
}

impl From<IngestError> for Error {
  fn from(e: IngestError) -> Self {
    match e {
      IngestError::MissingZone => Error::Validation("Missing required field: zone".into()),
      other => Error::Internal(other.to_string()),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Invalid API key" })),
      )
        .into_response(),
      Error::Validation(msg) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
      }
      Error::Internal(msg) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error", "message": msg })),
      )
        .into_response(),
    }
  }
}
