//! Core types and trait definitions for the raidledger store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod error;
pub mod facts;
pub mod participant;
pub mod session;
pub mod store;
pub mod tier;

pub use error::{Error, Result};

/// Source tag written on every row the ingestion pipeline produces.
/// Named after the in-game addon that emits the webhook payloads.
pub const SOURCE_RAIDLOGGER: &str = "raidlogger";
