//! Webhook payload types and normalization.
//!
//! The addon has shipped two payload shapes over its lifetime: older builds
//! send `attendees`/`loot`/`wclUrl` and buff entries keyed `playerName`/
//! `buffName`; newer builds send `members`/`drops`/`logs` and buff entries
//! keyed `player`/`name`. Serde aliases fold both shapes into one canonical
//! record here, so nothing downstream ever branches on field names.

use serde::{Deserialize, Serialize};

use crate::pipeline::IngestError;

// ─── Record types ────────────────────────────────────────────────────────────

/// One roster entry. Timestamps are epoch milliseconds, as sent by the addon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
  pub name:       String,
  /// Free-text class label; absent in some newer builds.
  #[serde(default)]
  pub class:      Option<String>,
  pub join_time:  i64,
  #[serde(default)]
  pub leave_time: Option<i64>,
}

/// One loot event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootDrop {
  pub item_id:   i64,
  pub item_name: String,
  pub receiver:  String,
  #[serde(default)]
  pub time:      Option<i64>,
  /// Council votes by voter name.
  #[serde(default)]
  pub votes:     std::collections::BTreeMap<String, bool>,
  #[serde(default)]
  pub approved:  Option<bool>,
}

/// One buff uptime observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuffObservation {
  #[serde(alias = "playerName")]
  pub player: String,
  #[serde(alias = "buffName")]
  pub name:   String,
  /// Percentage in 0–100.
  pub uptime: f64,
}

// ─── Raw payload ─────────────────────────────────────────────────────────────

/// The webhook body as received, before validation. Every field the two
/// historical shapes may carry is optional here; [`RawPayload::normalize`]
/// decides what is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
  /// Shared secret, when supplied in the body rather than the URL path.
  #[serde(default)]
  pub api_key:    Option<String>,
  #[serde(default)]
  pub zone:       Option<String>,
  /// Session start, epoch milliseconds.
  #[serde(default)]
  pub start_time: Option<i64>,
  #[serde(default)]
  pub end_time:   Option<i64>,
  #[serde(default, alias = "members")]
  pub attendees:  Option<Vec<Attendee>>,
  #[serde(default, alias = "drops")]
  pub loot:       Option<Vec<LootDrop>>,
  #[serde(default)]
  pub buffs:      Option<Vec<BuffObservation>>,
  /// URL of the external combat-log report.
  #[serde(default, alias = "logs")]
  pub wcl_url:    Option<String>,
}

impl RawPayload {
  /// Validate and fold into the canonical shape. `zone` is the only
  /// mandatory field; absent collections become empty.
  pub fn normalize(self) -> Result<NormalizedPayload, IngestError> {
    let zone = match self.zone {
      Some(z) if !z.is_empty() => z,
      _ => return Err(IngestError::MissingZone),
    };

    let report_id = self.wcl_url.as_deref().and_then(extract_report_id);

    Ok(NormalizedPayload {
      zone,
      start_time: self.start_time,
      end_time: self.end_time,
      report_id,
      attendees: self.attendees.unwrap_or_default(),
      loot: self.loot.unwrap_or_default(),
      buffs: self.buffs.unwrap_or_default(),
    })
  }
}

// ─── Normalized payload ──────────────────────────────────────────────────────

/// The canonical payload every resolver consumes. Also serialised verbatim
/// into the audit row's `raw_payload` snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPayload {
  pub zone:       String,
  pub start_time: Option<i64>,
  pub end_time:   Option<i64>,
  /// Short identifier extracted from the report URL, if it matched.
  pub report_id:  Option<String>,
  pub attendees:  Vec<Attendee>,
  pub loot:       Vec<LootDrop>,
  pub buffs:      Vec<BuffObservation>,
}

/// Extract the short report identifier: the alphanumeric run immediately
/// following the literal `reports/` path segment. No match is not an error —
/// the session simply keeps no report reference.
pub fn extract_report_id(url: &str) -> Option<String> {
  let (_, rest) = url.split_once("reports/")?;
  let id: String = rest
    .chars()
    .take_while(|c| c.is_ascii_alphanumeric())
    .collect();
  if id.is_empty() { None } else { Some(id) }
}
