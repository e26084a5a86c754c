//! The ingestion pipeline: resolve the session, reconcile attendees, loot,
//! and buffs, write the audit row, and signal the score refresh.
//!
//! Error discipline mirrors the wire contract: zone and session failures are
//! fatal to the whole request; everything downstream is isolated per record
//! and converted into counters and messages. Nothing is retried — the addon
//! replays the webhook on its side, and attendance/buff writes merge on
//! their natural keys so replays converge.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use raidledger_core::{
  SOURCE_RAIDLOGGER,
  facts::{AttendanceFact, BuffFact, ImportStatus, NewImportOutcome, NewLootFact},
  participant::NewParticipant,
  session::{NewSession, Session},
  store::RaidStore,
  tier::resolve_tier,
};

use crate::payload::{Attendee, BuffObservation, LootDrop, NormalizedPayload};

// ─── Errors ──────────────────────────────────────────────────────────────────

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A fatal pipeline error. Per-record failures never surface here — they are
/// counted and described in the [`IngestReport`] instead.
#[derive(Debug, Error)]
pub enum IngestError {
  #[error("missing required field: zone")]
  MissingZone,

  #[error("startTime is missing or not a valid epoch-millisecond instant")]
  InvalidStartTime,

  #[error("failed to create session: {0}")]
  SessionCreate(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Aggregate outcome of one ingestion, returned to the webhook caller.
#[derive(Debug, Clone)]
pub struct IngestReport {
  pub session_id:        Uuid,
  pub zone:              String,
  pub date:              NaiveDate,
  pub records_processed: u32,
  pub records_failed:    u32,
  /// All per-record error messages, in processing order.
  pub errors:            Vec<String>,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Run the full pipeline against `store`. Strictly sequential: each record's
/// store round trips complete before the next record begins.
pub async fn ingest<S: RaidStore>(
  store: &S,
  payload: NormalizedPayload,
) -> Result<IngestReport, IngestError> {
  let day = payload
    .start_time
    .and_then(DateTime::from_timestamp_millis)
    .ok_or(IngestError::InvalidStartTime)?
    .date_naive();

  let session = resolve_session(store, &payload, day).await?;

  let mut processed: u32 = 0;
  let mut failed: u32 = 0;
  let mut errors: Vec<String> = Vec::new();

  for attendee in &payload.attendees {
    match record_attendee(store, &session, payload.end_time, attendee).await {
      Ok(()) => processed += 1,
      Err(msg) => {
        errors.push(msg);
        failed += 1;
      }
    }
  }

  for event in &payload.loot {
    match record_loot(store, &session, event).await {
      Ok(()) => processed += 1,
      Err(msg) => {
        errors.push(msg);
        failed += 1;
      }
    }
  }

  for buff in &payload.buffs {
    match record_buff(store, &session, buff).await {
      Ok(true) => processed += 1,
      // Unknown participant: skipped without counting either way.
      Ok(false) => {}
      // Counted, but no message — the addon resends uptimes every run.
      Err(()) => failed += 1,
    }
  }

  audit(store, &payload, processed, failed, &errors).await?;

  // Best-effort: scores stay stale until the next refresh if this fails.
  if let Err(e) = store.refresh_scores().await {
    tracing::debug!(error = %e, "score refresh signal failed");
  }

  Ok(IngestReport {
    session_id: session.session_id,
    zone: session.zone,
    date: day,
    records_processed: processed,
    records_failed: failed,
    errors,
  })
}

// ─── Session resolution ──────────────────────────────────────────────────────

/// Find or create the session for (zone, day). A later ingestion carrying a
/// new report reference overwrites the stored one — last write wins.
/// Creation failure is fatal; no partial processing happens.
async fn resolve_session<S: RaidStore>(
  store: &S,
  payload: &NormalizedPayload,
  day: NaiveDate,
) -> Result<Session, IngestError> {
  let existing = store
    .find_session(&payload.zone, day)
    .await
    .map_err(|e| IngestError::Store(Box::new(e)))?;

  match existing {
    Some(session) => {
      if let Some(report_id) = &payload.report_id {
        store
          .set_session_report(session.session_id, report_id)
          .await
          .map_err(|e| IngestError::Store(Box::new(e)))?;
      }
      Ok(session)
    }
    None => store
      .insert_session(NewSession {
        zone:         payload.zone.clone(),
        session_date: day,
        report_id:    payload.report_id.clone(),
      })
      .await
      .map_err(|e| IngestError::SessionCreate(Box::new(e))),
  }
}

// ─── Attendance ──────────────────────────────────────────────────────────────

/// Find or create the participant, then merge their presence record.
async fn record_attendee<S: RaidStore>(
  store: &S,
  session: &Session,
  session_end: Option<i64>,
  attendee: &Attendee,
) -> Result<(), String> {
  let participant = match store.find_participant(&attendee.name).await {
    Ok(Some(p)) => p,
    Ok(None) => store
      .insert_participant(NewParticipant::from_sighting(
        &attendee.name,
        attendee.class.as_deref(),
      ))
      .await
      .map_err(|_| format!("Failed to create player {}", attendee.name))?,
    Err(e) => return Err(format!("Error processing {}: {e}", attendee.name)),
  };

  // Leave time falls back from the record to the session end to now; clock
  // skew can make the difference negative, which is silenced to zero.
  let leave = attendee
    .leave_time
    .or(session_end)
    .unwrap_or_else(|| Utc::now().timestamp_millis());
  let minutes = (((leave - attendee.join_time) as f64) / 60_000.0).round() as i64;

  store
    .upsert_attendance(AttendanceFact {
      participant_id:  participant.participant_id,
      session_id:      session.session_id,
      present:         true,
      on_time:         true,
      benched:         false,
      minutes_present: minutes.max(0),
      source:          SOURCE_RAIDLOGGER.to_string(),
    })
    .await
    .map_err(|_| format!("Attendance error for {}", attendee.name))
}

// ─── Loot ────────────────────────────────────────────────────────────────────

/// Resolve the receiver and the value tier, then append a loot row.
///
/// Receivers are never auto-created: loot should reference participants the
/// roster already knows, so an unknown name is a counted error.
async fn record_loot<S: RaidStore>(
  store: &S,
  session: &Session,
  event: &LootDrop,
) -> Result<(), String> {
  let lookup_err = |e: S::Error| format!("Error processing loot {}: {e}", event.item_name);

  let receiver = store
    .find_participant(&event.receiver)
    .await
    .map_err(lookup_err)?
    .ok_or_else(|| format!("Loot receiver not found: {}", event.receiver))?;

  let override_tier = store.tier_override(event.item_id).await.map_err(lookup_err)?;
  let override_points = match override_tier {
    Some(tier) => store.tier_points(tier).await.map_err(lookup_err)?,
    None => None,
  };
  let default_config = store.default_tier().await.map_err(lookup_err)?;
  let resolved = resolve_tier(override_tier, override_points, default_config);

  let dropped_at = event
    .time
    .and_then(DateTime::from_timestamp_millis)
    .unwrap_or_else(Utc::now);

  store
    .insert_loot(NewLootFact {
      participant_id: receiver.participant_id,
      session_id:     session.session_id,
      item_id:        event.item_id,
      item_name:      event.item_name.clone(),
      tier:           resolved.tier,
      base_points:    resolved.points,
      approved:       event.approved.unwrap_or(true),
      votes:          event.votes.clone(),
      source:         SOURCE_RAIDLOGGER.to_string(),
      dropped_at,
    })
    .await
    .map_err(|_| format!("Loot error for {}", event.item_name))?;

  Ok(())
}

// ─── Buffs ───────────────────────────────────────────────────────────────────

/// Merge a buff uptime. `Ok(true)` means recorded, `Ok(false)` means the
/// participant is unknown and the observation was dropped silently.
async fn record_buff<S: RaidStore>(
  store: &S,
  session: &Session,
  buff: &BuffObservation,
) -> Result<bool, ()> {
  let participant = match store.find_participant(&buff.player).await {
    Ok(Some(p)) => p,
    Ok(None) => return Ok(false),
    Err(_) => return Err(()),
  };

  store
    .upsert_buff(BuffFact {
      participant_id: participant.participant_id,
      session_id:     session.session_id,
      buff_name:      buff.name.clone(),
      uptime_percent: buff.uptime,
      source:         SOURCE_RAIDLOGGER.to_string(),
    })
    .await
    .map_err(|_| ())?;

  Ok(true)
}

// ─── Audit ───────────────────────────────────────────────────────────────────

/// Write the one-per-ingestion audit row: status rollup, counters, the first
/// ten error messages, and a snapshot of the normalized payload.
async fn audit<S: RaidStore>(
  store: &S,
  payload: &NormalizedPayload,
  processed: u32,
  failed: u32,
  errors: &[String],
) -> Result<(), IngestError> {
  let error_message = if errors.is_empty() {
    None
  } else {
    Some(
      errors
        .iter()
        .take(10)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; "),
    )
  };

  let raw_payload =
    serde_json::to_value(payload).map_err(|e| IngestError::Store(Box::new(e)))?;

  store
    .record_outcome(NewImportOutcome {
      source: SOURCE_RAIDLOGGER.to_string(),
      status: ImportStatus::rollup(processed, failed),
      records_processed: i64::from(processed),
      records_failed: i64::from(failed),
      error_message,
      raw_payload,
    })
    .await
    .map_err(|e| IngestError::Store(Box::new(e)))?;

  Ok(())
}
