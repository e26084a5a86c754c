//! Error types for `raidledger-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown tier: {0:?}")]
  UnknownTier(String),

  #[error("unknown classification: {0:?}")]
  UnknownClassification(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown import status: {0:?}")]
  UnknownStatus(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
