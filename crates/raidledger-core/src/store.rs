//! The `RaidStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `raidledger-store-sqlite`). The ingestion pipeline and the webhook server
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  facts::{AttendanceFact, BuffFact, ImportOutcome, LootFact, NewImportOutcome, NewLootFact},
  participant::{NewParticipant, Participant},
  session::{NewSession, Session},
  tier::{Tier, TierConfig},
};

/// Abstraction over the keyed relational store behind the pipeline.
///
/// Find operations return at most one row. Attendance and buff writes merge
/// on their natural keys; loot writes append. Tier rules and the default
/// tier configuration are read-only through this trait — they are curated
/// out of band.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RaidStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Look up a session by its natural key (zone, calendar day).
  fn find_session<'a>(
    &'a self,
    zone: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  /// Create and persist a new session. The store assigns the UUID, the
  /// display name, and the creation timestamp.
  fn insert_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Overwrite the external report reference of an existing session.
  /// Earlier values are silently replaced — last write wins.
  fn set_session_report<'a>(
    &'a self,
    session_id: Uuid,
    report_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Participants ──────────────────────────────────────────────────────

  /// Look up a participant by exact name.
  fn find_participant<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + 'a;

  /// Create and persist a new participant.
  fn insert_participant(
    &self,
    input: NewParticipant,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Merge an attendance fact on its (participant, session) key.
  fn upsert_attendance(
    &self,
    fact: AttendanceFact,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append a loot fact. No deduplication is applied.
  fn insert_loot(
    &self,
    input: NewLootFact,
  ) -> impl Future<Output = Result<LootFact, Self::Error>> + Send + '_;

  /// Merge a buff fact on its (participant, session, buff name) key.
  fn upsert_buff(
    &self,
    fact: BuffFact,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Tier rules (read-only) ────────────────────────────────────────────

  /// The curated tier override for an item, if any.
  fn tier_override(
    &self,
    item_id: i64,
  ) -> impl Future<Output = Result<Option<Tier>, Self::Error>> + Send + '_;

  /// The configured point value for a tier, if any.
  fn tier_points(
    &self,
    tier: Tier,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// The active default tier configuration, if one is curated.
  fn default_tier(
    &self,
  ) -> impl Future<Output = Result<Option<TierConfig>, Self::Error>> + Send + '_;

  // ── Audit & aggregation ───────────────────────────────────────────────

  /// Append one audit row summarising an ingestion call.
  fn record_outcome(
    &self,
    input: NewImportOutcome,
  ) -> impl Future<Output = Result<ImportOutcome, Self::Error>> + Send + '_;

  /// Signal the external score-aggregation procedure. Callers treat this as
  /// fire-and-forget; failures must never affect the ingestion result.
  fn refresh_scores(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
