//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar days as ISO dates,
//! vote maps as compact JSON. UUIDs are stored as hyphenated lowercase
//! strings. Enum columns round-trip through the `as_str`/`parse` pairs
//! defined in `raidledger-core`.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use raidledger_core::{
  facts::{AttendanceFact, BuffFact, ImportOutcome, ImportStatus, LootFact},
  participant::{Classification, Participant, Role},
  session::Session,
  tier::Tier,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  s.parse().map_err(|_| Error::DateParse(format!("bad calendar day: {s:?}")))
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "tank" => Ok(Role::Tank),
    "healer" => Ok(Role::Healer),
    "dps" => Ok(Role::Dps),
    other => Err(raidledger_core::Error::UnknownRole(other.to_string()).into()),
  }
}

pub fn decode_classification(s: &str) -> Result<Classification> {
  Classification::parse(s)
    .ok_or_else(|| raidledger_core::Error::UnknownClassification(s.to_string()).into())
}

pub fn encode_votes(votes: &BTreeMap<String, bool>) -> Result<String> {
  Ok(serde_json::to_string(votes)?)
}

pub fn decode_votes(s: &str) -> Result<BTreeMap<String, bool>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row structs ─────────────────────────────────────────────────────────────

/// Raw column values for a `sessions` row, before decoding.
pub struct RawSession {
  pub session_id:   String,
  pub name:         String,
  pub zone:         String,
  pub session_date: String,
  pub report_id:    Option<String>,
  pub created_at:   String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      session_id:   decode_uuid(&self.session_id)?,
      name:         self.name,
      zone:         self.zone,
      session_date: decode_date(&self.session_date)?,
      report_id:    self.report_id,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw column values for a `participants` row, before decoding.
pub struct RawParticipant {
  pub participant_id: String,
  pub name:           String,
  pub class:          String,
  pub role:           String,
  pub is_main:        bool,
  pub is_pug:         bool,
  pub created_at:     String,
}

impl RawParticipant {
  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      participant_id: decode_uuid(&self.participant_id)?,
      name:           self.name,
      classification: decode_classification(&self.class)?,
      role:           decode_role(&self.role)?,
      is_main:        self.is_main,
      is_pug:         self.is_pug,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw column values for an `attendance` row, before decoding.
pub struct RawAttendance {
  pub participant_id:  String,
  pub session_id:      String,
  pub present:         bool,
  pub on_time:         bool,
  pub benched:         bool,
  pub minutes_present: i64,
  pub source:          String,
}

impl RawAttendance {
  pub fn into_fact(self) -> Result<AttendanceFact> {
    Ok(AttendanceFact {
      participant_id:  decode_uuid(&self.participant_id)?,
      session_id:      decode_uuid(&self.session_id)?,
      present:         self.present,
      on_time:         self.on_time,
      benched:         self.benched,
      minutes_present: self.minutes_present,
      source:          self.source,
    })
  }
}

/// Raw column values for a `loot_drops` row, before decoding.
pub struct RawLoot {
  pub loot_id:        String,
  pub participant_id: String,
  pub session_id:     String,
  pub item_id:        i64,
  pub item_name:      String,
  pub tier:           String,
  pub base_points:    i64,
  pub approved:       bool,
  pub votes:          String,
  pub source:         String,
  pub dropped_at:     String,
}

impl RawLoot {
  pub fn into_fact(self) -> Result<LootFact> {
    Ok(LootFact {
      loot_id:        decode_uuid(&self.loot_id)?,
      participant_id: decode_uuid(&self.participant_id)?,
      session_id:     decode_uuid(&self.session_id)?,
      item_id:        self.item_id,
      item_name:      self.item_name,
      tier:           Tier::parse(&self.tier)?,
      base_points:    self.base_points,
      approved:       self.approved,
      votes:          decode_votes(&self.votes)?,
      source:         self.source,
      dropped_at:     decode_dt(&self.dropped_at)?,
    })
  }
}

/// Raw column values for a `buff_uptimes` row, before decoding.
pub struct RawBuff {
  pub participant_id: String,
  pub session_id:     String,
  pub buff_name:      String,
  pub uptime_percent: f64,
  pub source:         String,
}

impl RawBuff {
  pub fn into_fact(self) -> Result<BuffFact> {
    Ok(BuffFact {
      participant_id: decode_uuid(&self.participant_id)?,
      session_id:     decode_uuid(&self.session_id)?,
      buff_name:      self.buff_name,
      uptime_percent: self.uptime_percent,
      source:         self.source,
    })
  }
}

/// Raw column values for an `import_logs` row, before decoding.
pub struct RawOutcome {
  pub outcome_id:        String,
  pub source:            String,
  pub status:            String,
  pub records_processed: i64,
  pub records_failed:    i64,
  pub error_message:     Option<String>,
  pub raw_payload:       String,
  pub created_at:        String,
}

impl RawOutcome {
  pub fn into_outcome(self) -> Result<ImportOutcome> {
    Ok(ImportOutcome {
      outcome_id:        decode_uuid(&self.outcome_id)?,
      source:            self.source,
      status:            ImportStatus::parse(&self.status)?,
      records_processed: self.records_processed,
      records_failed:    self.records_failed,
      error_message:     self.error_message,
      raw_payload:       serde_json::from_str(&self.raw_payload)?,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}
