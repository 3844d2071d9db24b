//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanoseconds, `Z`
//! suffix) so that SQLite's text ordering is chronological; UUIDs as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use ranked_core::profile::ProfileRecord;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A `profiles` row exactly as read from SQLite, before decoding.
pub struct RawProfile {
  pub id:           String,
  pub subject_id:   String,
  pub email:        String,
  pub display_name: Option<String>,
  pub avatar_url:   Option<String>,
  pub rating:       i64,
  pub is_admin:     bool,
  pub created_at:   String,
  pub updated_at:   String,
  pub last_seen_at: String,
}

impl RawProfile {
  /// Read a row selected with [`crate::schema::PROFILE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      subject_id:   row.get(1)?,
      email:        row.get(2)?,
      display_name: row.get(3)?,
      avatar_url:   row.get(4)?,
      rating:       row.get(5)?,
      is_admin:     row.get(6)?,
      created_at:   row.get(7)?,
      updated_at:   row.get(8)?,
      last_seen_at: row.get(9)?,
    })
  }

  pub fn into_profile(self) -> Result<ProfileRecord> {
    Ok(ProfileRecord {
      id:           decode_uuid(&self.id)?,
      subject_id:   self.subject_id,
      email:        self.email,
      display_name: self.display_name,
      avatar_url:   self.avatar_url,
      rating:       self.rating,
      is_admin:     self.is_admin,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
      last_seen_at: decode_dt(&self.last_seen_at)?,
    })
  }
}
