//! Per-participant facts produced by the ingestion pipeline, and the audit
//! record written once per ingestion.
//!
//! Attendance and buff facts are merged on their natural keys — replaying an
//! identical payload converges to the same rows. Loot facts have no natural
//! key and are appended unconditionally; replays duplicate them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, tier::Tier};

// ─── Attendance ──────────────────────────────────────────────────────────────

/// Presence record, unique per (participant, session). Later ingestions of
/// the same pair overwrite the earlier value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceFact {
  pub participant_id:  Uuid,
  pub session_id:      Uuid,
  pub present:         bool,
  pub on_time:         bool,
  pub benched:         bool,
  /// Rounded whole minutes between join and leave, clamped to zero.
  pub minutes_present: i64,
  pub source:          String,
}

// ─── Loot ────────────────────────────────────────────────────────────────────

/// A persisted loot drop. Append-only; no uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootFact {
  pub loot_id:        Uuid,
  pub participant_id: Uuid,
  pub session_id:     Uuid,
  pub item_id:        i64,
  pub item_name:      String,
  pub tier:           Tier,
  pub base_points:    i64,
  pub approved:       bool,
  /// Council votes by voter name, carried opaquely from the payload.
  pub votes:          BTreeMap<String, bool>,
  pub source:         String,
  pub dropped_at:     DateTime<Utc>,
}

/// Input to [`crate::store::RaidStore::insert_loot`].
/// `loot_id` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewLootFact {
  pub participant_id: Uuid,
  pub session_id:     Uuid,
  pub item_id:        i64,
  pub item_name:      String,
  pub tier:           Tier,
  pub base_points:    i64,
  pub approved:       bool,
  pub votes:          BTreeMap<String, bool>,
  pub source:         String,
  pub dropped_at:     DateTime<Utc>,
}

// ─── Buffs ───────────────────────────────────────────────────────────────────

/// Buff uptime observation, unique per (participant, session, buff name).
/// Later ingestions of the same triple overwrite the earlier value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffFact {
  pub participant_id: Uuid,
  pub session_id:     Uuid,
  pub buff_name:      String,
  /// Percentage in 0–100, as reported by the addon.
  pub uptime_percent: f64,
  pub source:         String,
}

// ─── Import outcome ──────────────────────────────────────────────────────────

/// Overall status of one ingestion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
  Success,
  Partial,
  Failed,
}

impl ImportStatus {
  /// Roll up record counters into an overall status. Zero failures is a
  /// success even when nothing was processed; failures without a single
  /// success mean the whole ingestion failed.
  pub fn rollup(processed: u32, failed: u32) -> Self {
    if failed == 0 {
      Self::Success
    } else if processed > 0 {
      Self::Partial
    } else {
      Self::Failed
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Partial => "partial",
      Self::Failed => "failed",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "success" => Ok(Self::Success),
      "partial" => Ok(Self::Partial),
      "failed" => Ok(Self::Failed),
      other => Err(Error::UnknownStatus(other.to_string())),
    }
  }
}

/// One audit row per ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
  pub outcome_id:        Uuid,
  pub source:            String,
  pub status:            ImportStatus,
  pub records_processed: i64,
  pub records_failed:    i64,
  /// First ten error messages joined with `"; "`, or `None` when clean.
  pub error_message:     Option<String>,
  /// Snapshot of the normalized payload, kept for replay and debugging.
  pub raw_payload:       serde_json::Value,
  pub created_at:        DateTime<Utc>,
}

/// Input to [`crate::store::RaidStore::record_outcome`].
/// `outcome_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewImportOutcome {
  pub source:            String,
  pub status:            ImportStatus,
  pub records_processed: i64,
  pub records_failed:    i64,
  pub error_message:     Option<String>,
  pub raw_payload:       serde_json::Value,
}
