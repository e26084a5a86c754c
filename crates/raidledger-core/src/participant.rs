//! Participant — a named individual whose presence, loot, and buff facts are
//! tracked.
//!
//! Participants are keyed by exact name. The pipeline creates them on first
//! sighting and never deletes them; classification and role corrections are
//! an officer's job, not the addon's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Classification ──────────────────────────────────────────────────────────

/// The nine known character classifications.
///
/// Addon payloads carry free-text class labels in inconsistent casing;
/// [`Classification::parse`] maps them case-insensitively. Anything
/// unrecognised falls back to [`Classification::Warrior`] — a silent default
/// inherited from the addon's earliest payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
  #[default]
  Warrior,
  Paladin,
  Hunter,
  Rogue,
  Priest,
  Shaman,
  Mage,
  Warlock,
  Druid,
}

impl Classification {
  /// The lowercase string stored in the `class` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Warrior => "warrior",
      Self::Paladin => "paladin",
      Self::Hunter => "hunter",
      Self::Rogue => "rogue",
      Self::Priest => "priest",
      Self::Shaman => "shaman",
      Self::Mage => "mage",
      Self::Warlock => "warlock",
      Self::Druid => "druid",
    }
  }

  /// Case-insensitive match against the nine known labels.
  /// Returns `None` for anything else; callers decide how to default.
  pub fn parse(label: &str) -> Option<Self> {
    match label.to_ascii_lowercase().as_str() {
      "warrior" => Some(Self::Warrior),
      "paladin" => Some(Self::Paladin),
      "hunter" => Some(Self::Hunter),
      "rogue" => Some(Self::Rogue),
      "priest" => Some(Self::Priest),
      "shaman" => Some(Self::Shaman),
      "mage" => Some(Self::Mage),
      "warlock" => Some(Self::Warlock),
      "druid" => Some(Self::Druid),
      _ => None,
    }
  }

  /// Map an optional addon class label to a classification, defaulting to
  /// warrior when the label is absent or unrecognised.
  pub fn from_label(label: Option<&str>) -> Self {
    label.and_then(Self::parse).unwrap_or_default()
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

/// Raid role. The addon does not report roles, so every participant is
/// created as [`Role::Dps`] and corrected later by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Tank,
  Healer,
  #[default]
  Dps,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Tank => "tank",
      Self::Healer => "healer",
      Self::Dps => "dps",
    }
  }
}

// ─── Participant ─────────────────────────────────────────────────────────────

/// A persisted participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
  pub participant_id: Uuid,
  pub name:           String,
  pub classification: Classification,
  pub role:           Role,
  pub is_main:        bool,
  pub is_pug:         bool,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::RaidStore::insert_participant`].
/// `participant_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewParticipant {
  pub name:           String,
  pub classification: Classification,
  pub role:           Role,
  pub is_main:        bool,
  pub is_pug:         bool,
}

impl NewParticipant {
  /// A first-sighting participant as the ingestion pipeline creates one:
  /// class from the addon label, dps role, main, not a pug.
  pub fn from_sighting(name: impl Into<String>, class_label: Option<&str>) -> Self {
    Self {
      name:           name.into(),
      classification: Classification::from_label(class_label),
      role:           Role::default(),
      is_main:        true,
      is_pug:         false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_is_case_insensitive() {
    assert_eq!(Classification::parse("WARLOCK"), Some(Classification::Warlock));
    assert_eq!(Classification::parse("Druid"), Some(Classification::Druid));
    assert_eq!(Classification::parse("priest"), Some(Classification::Priest));
  }

  #[test]
  fn unknown_label_defaults_to_warrior() {
    assert_eq!(
      Classification::from_label(Some("necromancer")),
      Classification::Warrior
    );
    assert_eq!(Classification::from_label(None), Classification::Warrior);
  }

  #[test]
  fn sighting_defaults() {
    let p = NewParticipant::from_sighting("Tankbro", Some("WARRIOR"));
    assert_eq!(p.classification, Classification::Warrior);
    assert_eq!(p.role, Role::Dps);
    assert!(p.is_main);
    assert!(!p.is_pug);
  }
}
