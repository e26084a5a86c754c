//! [`SqliteStore`] — the SQLite implementation of [`RaidStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use raidledger_core::{
  facts::{
    AttendanceFact, BuffFact, ImportOutcome, LootFact, NewImportOutcome, NewLootFact,
  },
  participant::{NewParticipant, Participant},
  session::{NewSession, Session},
  store::RaidStore,
  tier::{Tier, TierConfig},
};

use crate::{
  Error, Result,
  encode::{
    RawAttendance, RawBuff, RawLoot, RawOutcome, RawParticipant, RawSession,
    encode_date, encode_dt, encode_uuid, encode_votes,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A raidledger store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Curation helpers ──────────────────────────────────────────────────────
  //
  // Tier rules and the default tier configuration are read-only through the
  // `RaidStore` trait; these inherent methods are the out-of-band curation
  // surface (officer tooling, test seeding).

  /// Set or replace the tier override for an item.
  pub async fn set_tier_override(&self, item_id: i64, tier: Tier) -> Result<()> {
    let tier_str = tier.as_str();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO items (item_id, tier_override) VALUES (?1, ?2)
           ON CONFLICT (item_id) DO UPDATE SET tier_override = excluded.tier_override",
          rusqlite::params![item_id, tier_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Set or replace the configured point value for a tier, optionally
  /// marking it as the active default.
  pub async fn set_tier_config(&self, config: TierConfig, is_default: bool) -> Result<()> {
    let tier_str = config.tier.as_str();
    let points = config.points;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO item_tiers (tier, points, is_default) VALUES (?1, ?2, ?3)
           ON CONFLICT (tier) DO UPDATE SET
             points     = excluded.points,
             is_default = excluded.is_default",
          rusqlite::params![tier_str, points, is_default],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Read helpers ──────────────────────────────────────────────────────────

  /// The attendance fact for a (participant, session) pair, if any.
  pub async fn get_attendance(
    &self,
    participant_id: Uuid,
    session_id: Uuid,
  ) -> Result<Option<AttendanceFact>> {
    let pid = encode_uuid(participant_id);
    let sid = encode_uuid(session_id);

    let raw: Option<RawAttendance> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT participant_id, session_id, present, on_time, benched,
                      minutes_present, source
               FROM attendance
               WHERE participant_id = ?1 AND session_id = ?2",
              rusqlite::params![pid, sid],
              |row| {
                Ok(RawAttendance {
                  participant_id:  row.get(0)?,
                  session_id:      row.get(1)?,
                  present:         row.get(2)?,
                  on_time:         row.get(3)?,
                  benched:         row.get(4)?,
                  minutes_present: row.get(5)?,
                  source:          row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAttendance::into_fact).transpose()
  }

  /// All loot rows for a session, in insertion order.
  pub async fn loot_for_session(&self, session_id: Uuid) -> Result<Vec<LootFact>> {
    let sid = encode_uuid(session_id);

    let raws: Vec<RawLoot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT loot_id, participant_id, session_id, item_id, item_name,
                  tier, base_points, approved, votes, source, dropped_at
           FROM loot_drops
           WHERE session_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![sid], |row| {
            Ok(RawLoot {
              loot_id:        row.get(0)?,
              participant_id: row.get(1)?,
              session_id:     row.get(2)?,
              item_id:        row.get(3)?,
              item_name:      row.get(4)?,
              tier:           row.get(5)?,
              base_points:    row.get(6)?,
              approved:       row.get(7)?,
              votes:          row.get(8)?,
              source:         row.get(9)?,
              dropped_at:     row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLoot::into_fact).collect()
  }

  /// The buff fact for a (participant, session, buff name) triple, if any.
  pub async fn get_buff(
    &self,
    participant_id: Uuid,
    session_id: Uuid,
    buff_name: &str,
  ) -> Result<Option<BuffFact>> {
    let pid = encode_uuid(participant_id);
    let sid = encode_uuid(session_id);
    let buff = buff_name.to_owned();

    let raw: Option<RawBuff> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT participant_id, session_id, buff_name, uptime_percent, source
               FROM buff_uptimes
               WHERE participant_id = ?1 AND session_id = ?2 AND buff_name = ?3",
              rusqlite::params![pid, sid, buff],
              |row| {
                Ok(RawBuff {
                  participant_id: row.get(0)?,
                  session_id:     row.get(1)?,
                  buff_name:      row.get(2)?,
                  uptime_percent: row.get(3)?,
                  source:         row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBuff::into_fact).transpose()
  }

  /// All audit rows, oldest first.
  pub async fn outcomes(&self) -> Result<Vec<ImportOutcome>> {
    let raws: Vec<RawOutcome> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT outcome_id, source, status, records_processed, records_failed,
                  error_message, raw_payload, created_at
           FROM import_logs
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawOutcome {
              outcome_id:        row.get(0)?,
              source:            row.get(1)?,
              status:            row.get(2)?,
              records_processed: row.get(3)?,
              records_failed:    row.get(4)?,
              error_message:     row.get(5)?,
              raw_payload:       row.get(6)?,
              created_at:        row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOutcome::into_outcome).collect()
  }

  /// Number of refresh signals recorded so far.
  pub async fn refresh_signal_count(&self) -> Result<i64> {
    let count = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM score_refreshes", [], |r| r.get(0))?)
      })
      .await?;
    Ok(count)
  }
}

// ─── RaidStore impl ──────────────────────────────────────────────────────────

impl RaidStore for SqliteStore {
  type Error = Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn find_session(&self, zone: &str, date: NaiveDate) -> Result<Option<Session>> {
    let zone = zone.to_owned();
    let date_str = encode_date(date);

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT session_id, name, zone, session_date, report_id, created_at
               FROM sessions
               WHERE zone = ?1 AND session_date = ?2",
              rusqlite::params![zone, date_str],
              |row| {
                Ok(RawSession {
                  session_id:   row.get(0)?,
                  name:         row.get(1)?,
                  zone:         row.get(2)?,
                  session_date: row.get(3)?,
                  report_id:    row.get(4)?,
                  created_at:   row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn insert_session(&self, input: NewSession) -> Result<Session> {
    let session = Session {
      session_id:   Uuid::new_v4(),
      name:         input.display_name(),
      zone:         input.zone,
      session_date: input.session_date,
      report_id:    input.report_id,
      created_at:   Utc::now(),
    };

    let id_str = encode_uuid(session.session_id);
    let name = session.name.clone();
    let zone = session.zone.clone();
    let date_str = encode_date(session.session_date);
    let report_id = session.report_id.clone();
    let at_str = encode_dt(session.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (session_id, name, zone, session_date, report_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, zone, date_str, report_id, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn set_session_report(&self, session_id: Uuid, report_id: &str) -> Result<()> {
    let id_str = encode_uuid(session_id);
    let report = report_id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE sessions SET report_id = ?2 WHERE session_id = ?1",
          rusqlite::params![id_str, report],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Participants ──────────────────────────────────────────────────────────

  async fn find_participant(&self, name: &str) -> Result<Option<Participant>> {
    let name = name.to_owned();

    let raw: Option<RawParticipant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT participant_id, name, class, role, is_main, is_pug, created_at
               FROM participants
               WHERE name = ?1",
              rusqlite::params![name],
              |row| {
                Ok(RawParticipant {
                  participant_id: row.get(0)?,
                  name:           row.get(1)?,
                  class:          row.get(2)?,
                  role:           row.get(3)?,
                  is_main:        row.get(4)?,
                  is_pug:         row.get(5)?,
                  created_at:     row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }

  async fn insert_participant(&self, input: NewParticipant) -> Result<Participant> {
    let participant = Participant {
      participant_id: Uuid::new_v4(),
      name:           input.name,
      classification: input.classification,
      role:           input.role,
      is_main:        input.is_main,
      is_pug:         input.is_pug,
      created_at:     Utc::now(),
    };

    let id_str = encode_uuid(participant.participant_id);
    let name = participant.name.clone();
    let class_str = participant.classification.as_str();
    let role_str = participant.role.as_str();
    let is_main = participant.is_main;
    let is_pug = participant.is_pug;
    let at_str = encode_dt(participant.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO participants (participant_id, name, class, role, is_main, is_pug, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, name, class_str, role_str, is_main, is_pug, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(participant)
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn upsert_attendance(&self, fact: AttendanceFact) -> Result<()> {
    let pid = encode_uuid(fact.participant_id);
    let sid = encode_uuid(fact.session_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attendance (participant_id, session_id, present, on_time,
                                   benched, minutes_present, source)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (participant_id, session_id) DO UPDATE SET
             present         = excluded.present,
             on_time         = excluded.on_time,
             benched         = excluded.benched,
             minutes_present = excluded.minutes_present,
             source          = excluded.source",
          rusqlite::params![
            pid,
            sid,
            fact.present,
            fact.on_time,
            fact.benched,
            fact.minutes_present,
            fact.source,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_loot(&self, input: NewLootFact) -> Result<LootFact> {
    let fact = LootFact {
      loot_id:        Uuid::new_v4(),
      participant_id: input.participant_id,
      session_id:     input.session_id,
      item_id:        input.item_id,
      item_name:      input.item_name,
      tier:           input.tier,
      base_points:    input.base_points,
      approved:       input.approved,
      votes:          input.votes,
      source:         input.source,
      dropped_at:     input.dropped_at,
    };

    let loot_id = encode_uuid(fact.loot_id);
    let pid = encode_uuid(fact.participant_id);
    let sid = encode_uuid(fact.session_id);
    let item_id = fact.item_id;
    let item_name = fact.item_name.clone();
    let tier_str = fact.tier.as_str();
    let base_points = fact.base_points;
    let approved = fact.approved;
    let votes_str = encode_votes(&fact.votes)?;
    let source = fact.source.clone();
    let dropped_str = encode_dt(fact.dropped_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO loot_drops (loot_id, participant_id, session_id, item_id,
                                   item_name, tier, base_points, approved, votes,
                                   source, dropped_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            loot_id,
            pid,
            sid,
            item_id,
            item_name,
            tier_str,
            base_points,
            approved,
            votes_str,
            source,
            dropped_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(fact)
  }

  async fn upsert_buff(&self, fact: BuffFact) -> Result<()> {
    let pid = encode_uuid(fact.participant_id);
    let sid = encode_uuid(fact.session_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO buff_uptimes (participant_id, session_id, buff_name,
                                     uptime_percent, source)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (participant_id, session_id, buff_name) DO UPDATE SET
             uptime_percent = excluded.uptime_percent,
             source         = excluded.source",
          rusqlite::params![pid, sid, fact.buff_name, fact.uptime_percent, fact.source],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Tier rules (read-only) ────────────────────────────────────────────────

  async fn tier_override(&self, item_id: i64) -> Result<Option<Tier>> {
    let raw: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT tier_override FROM items WHERE item_id = ?1",
              rusqlite::params![item_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    match raw.flatten() {
      Some(s) => Ok(Some(Tier::parse(&s)?)),
      None => Ok(None),
    }
  }

  async fn tier_points(&self, tier: Tier) -> Result<Option<i64>> {
    let tier_str = tier.as_str();
    let points = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT points FROM item_tiers WHERE tier = ?1",
              rusqlite::params![tier_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(points)
  }

  async fn default_tier(&self) -> Result<Option<TierConfig>> {
    let raw: Option<(String, i64)> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT tier, points FROM item_tiers WHERE is_default = 1",
              [],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some((tier_str, points)) => {
        Ok(Some(TierConfig { tier: Tier::parse(&tier_str)?, points }))
      }
      None => Ok(None),
    }
  }

  // ── Audit & aggregation ───────────────────────────────────────────────────

  async fn record_outcome(&self, input: NewImportOutcome) -> Result<ImportOutcome> {
    let outcome = ImportOutcome {
      outcome_id:        Uuid::new_v4(),
      source:            input.source,
      status:            input.status,
      records_processed: input.records_processed,
      records_failed:    input.records_failed,
      error_message:     input.error_message,
      raw_payload:       input.raw_payload,
      created_at:        Utc::now(),
    };

    let id_str = encode_uuid(outcome.outcome_id);
    let source = outcome.source.clone();
    let status_str = outcome.status.as_str();
    let processed = outcome.records_processed;
    let failed = outcome.records_failed;
    let error_message = outcome.error_message.clone();
    let payload_str = serde_json::to_string(&outcome.raw_payload)?;
    let at_str = encode_dt(outcome.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO import_logs (outcome_id, source, status, records_processed,
                                    records_failed, error_message, raw_payload, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            source,
            status_str,
            processed,
            failed,
            error_message,
            payload_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(outcome)
  }

  async fn refresh_scores(&self) -> Result<()> {
    // The score formula itself lives in an external job; this just leaves a
    // signal row for it to pick up.
    let at_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO score_refreshes (requested_at) VALUES (?1)",
          rusqlite::params![at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
