//! Session — one scheduled occurrence of the group activity.
//!
//! A session is identified by its natural key (zone, calendar day); the UUID
//! is a surrogate assigned by the store. The natural key never changes once
//! set, but the external report reference may be overwritten by a later
//! ingestion for the same session (last write wins).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted raid session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub session_id:   Uuid,
  /// Display name, `"{zone} - {date}"`, computed at creation.
  pub name:         String,
  pub zone:         String,
  pub session_date: NaiveDate,
  /// Short identifier extracted from the external combat-log report URL.
  pub report_id:    Option<String>,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::RaidStore::insert_session`].
/// `session_id`, `name`, and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub zone:         String,
  pub session_date: NaiveDate,
  pub report_id:    Option<String>,
}

impl NewSession {
  /// The display name stored on the created session row.
  pub fn display_name(&self) -> String {
    format!("{} - {}", self.zone, self.session_date)
  }
}
