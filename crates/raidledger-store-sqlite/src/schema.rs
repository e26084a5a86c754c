//! SQL schema for the raidledger SQLite store.
//!
//! Applied in full at every connection startup; `PRAGMA user_version` marks
//! the schema revision so later migrations know where to start.

/// Schema DDL, safe to re-run against an existing database.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One session per (zone, session_date). The natural key never changes;
-- report_id may be overwritten by later ingestions (last write wins).
CREATE TABLE IF NOT EXISTS sessions (
    session_id   TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    zone         TEXT NOT NULL,
    session_date TEXT NOT NULL,   -- ISO calendar day, UTC
    report_id    TEXT,
    created_at   TEXT NOT NULL,
    UNIQUE (zone, session_date)
);

CREATE TABLE IF NOT EXISTS participants (
    participant_id TEXT PRIMARY KEY,
    name           TEXT NOT NULL UNIQUE,
    class          TEXT NOT NULL,   -- one of the nine classifications
    role           TEXT NOT NULL,   -- 'tank' | 'healer' | 'dps'
    is_main        INTEGER NOT NULL DEFAULT 1,
    is_pug         INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

-- Merged on the natural key; replays converge to the same row.
CREATE TABLE IF NOT EXISTS attendance (
    participant_id  TEXT NOT NULL REFERENCES participants(participant_id),
    session_id      TEXT NOT NULL REFERENCES sessions(session_id),
    present         INTEGER NOT NULL,
    on_time         INTEGER NOT NULL,
    benched         INTEGER NOT NULL,
    minutes_present INTEGER NOT NULL,
    source          TEXT NOT NULL,
    PRIMARY KEY (participant_id, session_id)
);

-- Append-only; no natural key, replays insert duplicate rows.
CREATE TABLE IF NOT EXISTS loot_drops (
    loot_id        TEXT PRIMARY KEY,
    participant_id TEXT NOT NULL REFERENCES participants(participant_id),
    session_id     TEXT NOT NULL REFERENCES sessions(session_id),
    item_id        INTEGER NOT NULL,
    item_name      TEXT NOT NULL,
    tier           TEXT NOT NULL,   -- 'S' | 'A' | 'B' | 'C' | 'D'
    base_points    INTEGER NOT NULL,
    approved       INTEGER NOT NULL,
    votes          TEXT NOT NULL DEFAULT '{}',   -- JSON: voter name -> bool
    source         TEXT NOT NULL,
    dropped_at     TEXT NOT NULL
);

-- Merged on the natural key; replays converge to the same row.
CREATE TABLE IF NOT EXISTS buff_uptimes (
    participant_id TEXT NOT NULL REFERENCES participants(participant_id),
    session_id     TEXT NOT NULL REFERENCES sessions(session_id),
    buff_name      TEXT NOT NULL,
    uptime_percent REAL NOT NULL,
    source         TEXT NOT NULL,
    PRIMARY KEY (participant_id, session_id, buff_name)
);

-- Externally curated; read-only to the ingestion pipeline.
CREATE TABLE IF NOT EXISTS item_tiers (
    tier       TEXT PRIMARY KEY,
    points     INTEGER NOT NULL,
    is_default INTEGER NOT NULL DEFAULT 0
);

-- At most one active default tier configuration.
CREATE UNIQUE INDEX IF NOT EXISTS item_tiers_default_idx
    ON item_tiers(is_default) WHERE is_default = 1;

-- Externally curated per-item tier overrides.
CREATE TABLE IF NOT EXISTS items (
    item_id       INTEGER PRIMARY KEY,
    tier_override TEXT
);

-- Append-only audit trail, one row per ingestion call.
CREATE TABLE IF NOT EXISTS import_logs (
    outcome_id        TEXT PRIMARY KEY,
    source            TEXT NOT NULL,
    status            TEXT NOT NULL,   -- 'success' | 'partial' | 'failed'
    records_processed INTEGER NOT NULL,
    records_failed    INTEGER NOT NULL,
    error_message     TEXT,
    raw_payload       TEXT NOT NULL,   -- JSON snapshot of the payload
    created_at        TEXT NOT NULL
);

-- Fire-and-forget refresh signals consumed by the external score job.
CREATE TABLE IF NOT EXISTS score_refreshes (
    requested_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS attendance_session_idx ON attendance(session_id);
CREATE INDEX IF NOT EXISTS loot_session_idx       ON loot_drops(session_id);
CREATE INDEX IF NOT EXISTS loot_participant_idx   ON loot_drops(participant_id);
CREATE INDEX IF NOT EXISTS buff_session_idx       ON buff_uptimes(session_id);

PRAGMA user_version = 1;
";
