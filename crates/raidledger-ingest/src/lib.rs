//! Payload normalization and the reconciliation pipeline.
//!
//! Webhook payloads arrive in two historical shapes with inconsistent field
//! names; [`payload`] folds them into one canonical form before any resolver
//! runs. [`pipeline`] then reconciles that form into the store behind any
//! [`raidledger_core::store::RaidStore`], isolating failures per record and
//! reporting an aggregate outcome.

pub mod payload;
pub mod pipeline;

pub use payload::{NormalizedPayload, RawPayload};
pub use pipeline::{IngestError, IngestReport, ingest};

#[cfg(test)]
mod tests;
