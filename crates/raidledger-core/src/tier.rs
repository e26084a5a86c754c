//! Loot value tiers and the fallback chain that resolves them.
//!
//! Tier rules (per-item overrides) and the default tier configuration are
//! externally curated; the pipeline only reads them. When neither exists the
//! chain bottoms out at the hardcoded [`TierConfig::FALLBACK`] pair.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Coarse value classification of a loot item, driving its point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
  S,
  A,
  B,
  C,
  D,
}

impl Tier {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::S => "S",
      Self::A => "A",
      Self::B => "B",
      Self::C => "C",
      Self::D => "D",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "S" => Ok(Self::S),
      "A" => Ok(Self::A),
      "B" => Ok(Self::B),
      "C" => Ok(Self::C),
      "D" => Ok(Self::D),
      other => Err(Error::UnknownTier(other.to_string())),
    }
  }
}

// ─── TierConfig ──────────────────────────────────────────────────────────────

/// A (tier, points) pair, either the curated default or a resolved result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
  pub tier:   Tier,
  pub points: i64,
}

impl TierConfig {
  /// Bottom of the fallback chain, used when no override and no default
  /// configuration exist, and as the point value for an override tier with
  /// no configured points.
  pub const FALLBACK: TierConfig = TierConfig { tier: Tier::B, points: 30 };
}

/// Resolve a loot item's tier through the fallback chain:
///
/// 1. an explicit per-item override tier, with that tier's configured points
///    (or the fallback points when the tier has none configured);
/// 2. else the active default tier configuration;
/// 3. else [`TierConfig::FALLBACK`].
pub fn resolve_tier(
  override_tier:   Option<Tier>,
  override_points: Option<i64>,
  default_config:  Option<TierConfig>,
) -> TierConfig {
  match override_tier {
    Some(tier) => TierConfig {
      tier,
      points: override_points.unwrap_or(TierConfig::FALLBACK.points),
    },
    None => default_config.unwrap_or(TierConfig::FALLBACK),
  }
}
