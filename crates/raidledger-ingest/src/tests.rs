//! Pipeline tests against the in-memory SQLite store.

use chrono::NaiveDate;
use raidledger_core::{
  facts::ImportStatus,
  participant::{Classification, NewParticipant},
  store::RaidStore,
  tier::{Tier, TierConfig},
};
use raidledger_store_sqlite::SqliteStore;

use crate::{IngestError, NormalizedPayload, RawPayload, ingest};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn payload(json: serde_json::Value) -> NormalizedPayload {
  let raw: RawPayload = serde_json::from_value(json).expect("payload json");
  raw.normalize().expect("normalize")
}

// 2023-11-14T22:13:20Z
const START: i64 = 1_700_000_000_000;
const HOUR: i64 = 3_600_000;

// ─── End-to-end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_ingestion_creates_everything() {
  let s = store().await;

  let report = ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "attendees": [{
        "name": "Tankbro",
        "class": "WARRIOR",
        "joinTime": START,
        "leaveTime": START + HOUR
      }],
      "loot": [{ "itemId": 101, "itemName": "Sword", "receiver": "Tankbro" }]
    })),
  )
  .await
  .unwrap();

  assert_eq!(report.zone, "MC");
  assert_eq!(report.date, NaiveDate::from_ymd_opt(2023, 11, 14).unwrap());
  assert_eq!(report.records_processed, 2);
  assert_eq!(report.records_failed, 0);
  assert!(report.errors.is_empty());

  let session = s.find_session("MC", report.date).await.unwrap().unwrap();
  assert_eq!(session.session_id, report.session_id);
  assert_eq!(session.name, "MC - 2023-11-14");

  let tankbro = s.find_participant("Tankbro").await.unwrap().unwrap();
  assert_eq!(tankbro.classification, Classification::Warrior);

  let att = s
    .get_attendance(tankbro.participant_id, session.session_id)
    .await
    .unwrap()
    .unwrap();
  assert!(att.present && att.on_time && !att.benched);
  assert_eq!(att.minutes_present, 60);
  assert_eq!(att.source, "raidlogger");

  // No override, no default config: the chain bottoms out at B/30.
  let loot = s.loot_for_session(session.session_id).await.unwrap();
  assert_eq!(loot.len(), 1);
  assert_eq!(loot[0].tier, Tier::B);
  assert_eq!(loot[0].base_points, 30);
  assert!(loot[0].approved);
  assert!(loot[0].votes.is_empty());
}

#[tokio::test]
async fn replay_converges_except_loot() {
  let s = store().await;
  let body = serde_json::json!({
    "zone": "MC",
    "startTime": START,
    "attendees": [{
      "name": "Tankbro",
      "class": "WARRIOR",
      "joinTime": START,
      "leaveTime": START + HOUR
    }],
    "loot": [{ "itemId": 101, "itemName": "Sword", "receiver": "Tankbro" }],
    "buffs": [{ "player": "Tankbro", "name": "Ony Buff", "uptime": 80.0 }]
  });

  let first = ingest(&s, payload(body.clone())).await.unwrap();
  let second = ingest(&s, payload(body)).await.unwrap();

  // Same session both times; attendance and buffs merged on their keys.
  assert_eq!(first.session_id, second.session_id);
  let tankbro = s.find_participant("Tankbro").await.unwrap().unwrap();
  let att = s
    .get_attendance(tankbro.participant_id, first.session_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(att.minutes_present, 60);
  let buff = s
    .get_buff(tankbro.participant_id, first.session_id, "Ony Buff")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(buff.uptime_percent, 80.0);

  // Loot has no natural key: the replay appended a second row.
  let loot = s.loot_for_session(first.session_id).await.unwrap();
  assert_eq!(loot.len(), 2);
}

// ─── Session resolution ──────────────────────────────────────────────────────

#[tokio::test]
async fn same_zone_and_day_reuses_the_session() {
  let s = store().await;

  let morning = ingest(
    &s,
    payload(serde_json::json!({ "zone": "MC", "startTime": START })),
  )
  .await
  .unwrap();
  // Same calendar day, different time of day.
  let evening = ingest(
    &s,
    payload(serde_json::json!({ "zone": "MC", "startTime": START + HOUR })),
  )
  .await
  .unwrap();
  assert_eq!(morning.session_id, evening.session_id);

  // A third ingestion carrying a report URL updates the session in place.
  let with_report = ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "wclUrl": "https://logs.example.com/reports/abc123"
    })),
  )
  .await
  .unwrap();
  assert_eq!(with_report.session_id, morning.session_id);

  let session = s.find_session("MC", morning.date).await.unwrap().unwrap();
  assert_eq!(session.report_id.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn report_reference_is_last_write_wins() {
  let s = store().await;

  for report_id in ["first1", "second2"] {
    ingest(
      &s,
      payload(serde_json::json!({
        "zone": "MC",
        "startTime": START,
        "logs": format!("https://logs.example.com/reports/{report_id}")
      })),
    )
    .await
    .unwrap();
  }

  let date = NaiveDate::from_ymd_opt(2023, 11, 14).unwrap();
  let session = s.find_session("MC", date).await.unwrap().unwrap();
  assert_eq!(session.report_id.as_deref(), Some("second2"));
}

#[tokio::test]
async fn missing_start_time_is_fatal() {
  let s = store().await;
  let raw: RawPayload =
    serde_json::from_value(serde_json::json!({ "zone": "MC" })).unwrap();
  let result = ingest(&s, raw.normalize().unwrap()).await;
  assert!(matches!(result, Err(IngestError::InvalidStartTime)));
}

// ─── Participants & attendance ───────────────────────────────────────────────

#[tokio::test]
async fn unknown_class_defaults_to_warrior() {
  let s = store().await;

  ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "attendees": [
        { "name": "Boneman", "class": "necromancer", "joinTime": START },
        { "name": "Mysteryguy", "joinTime": START }
      ]
    })),
  )
  .await
  .unwrap();

  for name in ["Boneman", "Mysteryguy"] {
    let p = s.find_participant(name).await.unwrap().unwrap();
    assert_eq!(p.classification, Classification::Warrior);
  }
}

#[tokio::test]
async fn negative_duration_clamps_to_zero() {
  let s = store().await;

  let report = ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "attendees": [{
        "name": "Skewed",
        "class": "mage",
        "joinTime": START + HOUR,
        "leaveTime": START
      }]
    })),
  )
  .await
  .unwrap();
  assert_eq!(report.records_failed, 0);

  let p = s.find_participant("Skewed").await.unwrap().unwrap();
  let att = s
    .get_attendance(p.participant_id, report.session_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(att.minutes_present, 0);
}

#[tokio::test]
async fn leave_time_falls_back_to_session_end() {
  let s = store().await;

  let report = ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "endTime": START + 2 * HOUR,
      "attendees": [{ "name": "Stayer", "class": "druid", "joinTime": START }]
    })),
  )
  .await
  .unwrap();

  let p = s.find_participant("Stayer").await.unwrap().unwrap();
  let att = s
    .get_attendance(p.participant_id, report.session_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(att.minutes_present, 120);
}

// ─── Loot ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_receiver_is_a_counted_error() {
  let s = store().await;

  let report = ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "loot": [{ "itemId": 101, "itemName": "Sword", "receiver": "Nobody" }]
    })),
  )
  .await
  .unwrap();

  assert_eq!(report.records_processed, 0);
  assert_eq!(report.records_failed, 1);
  assert_eq!(report.errors, vec!["Loot receiver not found: Nobody".to_string()]);
  assert!(s.loot_for_session(report.session_id).await.unwrap().is_empty());
  // Receivers are never auto-created.
  assert!(s.find_participant("Nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn tier_chain_prefers_override_then_default() {
  let s = store().await;
  s.set_tier_override(101, Tier::S).await.unwrap();
  s.set_tier_config(TierConfig { tier: Tier::S, points: 100 }, false).await.unwrap();
  s.set_tier_config(TierConfig { tier: Tier::A, points: 60 }, true).await.unwrap();

  let report = ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "attendees": [{ "name": "Tankbro", "class": "warrior", "joinTime": START }],
      "loot": [
        { "itemId": 101, "itemName": "Bindings", "receiver": "Tankbro" },
        { "itemId": 999, "itemName": "Trinket", "receiver": "Tankbro" }
      ]
    })),
  )
  .await
  .unwrap();

  let loot = s.loot_for_session(report.session_id).await.unwrap();
  assert_eq!(loot.len(), 2);
  // Overridden item: its own tier with that tier's configured points.
  assert_eq!((loot[0].tier, loot[0].base_points), (Tier::S, 100));
  // Everything else: the active default configuration.
  assert_eq!((loot[1].tier, loot[1].base_points), (Tier::A, 60));
}

#[tokio::test]
async fn loot_votes_and_approval_are_carried() {
  let s = store().await;
  s.insert_participant(NewParticipant::from_sighting("Tankbro", Some("warrior")))
    .await
    .unwrap();

  let report = ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "loot": [{
        "itemId": 101,
        "itemName": "Sword",
        "receiver": "Tankbro",
        "approved": false,
        "votes": { "Healgirl": true }
      }]
    })),
  )
  .await
  .unwrap();

  let loot = s.loot_for_session(report.session_id).await.unwrap();
  assert!(!loot[0].approved);
  assert_eq!(loot[0].votes.get("Healgirl"), Some(&true));
}

// ─── Buffs ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn buff_for_unknown_player_is_skipped_silently() {
  let s = store().await;

  let report = ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "buffs": [{ "player": "Ghost", "name": "Flask", "uptime": 50.0 }]
    })),
  )
  .await
  .unwrap();

  // Neither processed nor failed, and no error message — unlike loot.
  assert_eq!(report.records_processed, 0);
  assert_eq!(report.records_failed, 0);
  assert!(report.errors.is_empty());
}

// ─── Audit & refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_row_records_partial_status_and_errors() {
  let s = store().await;

  ingest(
    &s,
    payload(serde_json::json!({
      "zone": "MC",
      "startTime": START,
      "attendees": [{ "name": "Tankbro", "class": "warrior", "joinTime": START }],
      "loot": [{ "itemId": 101, "itemName": "Sword", "receiver": "Nobody" }]
    })),
  )
  .await
  .unwrap();

  let outcomes = s.outcomes().await.unwrap();
  assert_eq!(outcomes.len(), 1);
  assert_eq!(outcomes[0].status, ImportStatus::Partial);
  assert_eq!(outcomes[0].records_processed, 1);
  assert_eq!(outcomes[0].records_failed, 1);
  assert_eq!(
    outcomes[0].error_message.as_deref(),
    Some("Loot receiver not found: Nobody")
  );
  // The snapshot is the normalized payload, replayable as-is.
  assert_eq!(outcomes[0].raw_payload["zone"], "MC");
  assert_eq!(outcomes[0].raw_payload["attendees"][0]["name"], "Tankbro");
}

#[tokio::test]
async fn empty_payload_audits_success() {
  let s = store().await;

  let report = ingest(
    &s,
    payload(serde_json::json!({ "zone": "MC", "startTime": START })),
  )
  .await
  .unwrap();
  assert_eq!(report.records_processed, 0);
  assert_eq!(report.records_failed, 0);

  let outcomes = s.outcomes().await.unwrap();
  assert_eq!(outcomes[0].status, ImportStatus::Success);
  assert!(outcomes[0].error_message.is_none());
}

#[tokio::test]
async fn every_ingestion_signals_a_score_refresh() {
  let s = store().await;

  ingest(&s, payload(serde_json::json!({ "zone": "MC", "startTime": START })))
    .await
    .unwrap();
  ingest(&s, payload(serde_json::json!({ "zone": "MC", "startTime": START })))
    .await
    .unwrap();

  assert_eq!(s.refresh_signal_count().await.unwrap(), 2);
}
