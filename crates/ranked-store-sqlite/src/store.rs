//! [`SqliteStore`] — the SQLite implementation of [`ProfileStore`].

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use ranked_core::{
  elo,
  lazy::Connect,
  profile::ProfileRecord,
  store::ProfileStore,
};

use crate::{
  Result,
  encode::{RawProfile, encode_dt, encode_uuid},
  schema::{PROFILE_COLUMNS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A profile store backed by a single SQLite file.
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

  /// Fetch at most one profile matching `column = value`.
  async fn find_one(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<ProfileRecord>> {
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE {column} = ?1"),
              rusqlite::params![value],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = crate::Error;

  async fn find_by_subject_id(
    &self,
    subject_id: &str,
  ) -> Result<Option<ProfileRecord>> {
    self.find_one("subject_id", subject_id.to_owned()).await
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfileRecord>> {
    self.find_one("id", encode_uuid(id)).await
  }

  async fn upsert(&self, record: ProfileRecord) -> Result<ProfileRecord> {
    let id_str        = encode_uuid(record.id);
    let created_str   = encode_dt(record.created_at);
    let updated_str   = encode_dt(record.updated_at);
    let last_seen_str = encode_dt(record.last_seen_at);

    // On conflict only the claim-derived fields and the two "touched"
    // timestamps are replaced; id, rating, is_admin and created_at are
    // set-on-insert. The timestamps only move forward, even when this write
    // was computed before a later rating update landed.
    let raw: RawProfile = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO profiles (
               id, subject_id, email, display_name, avatar_url,
               rating, is_admin, created_at, updated_at, last_seen_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(subject_id) DO UPDATE SET
               email        = excluded.email,
               display_name = excluded.display_name,
               avatar_url   = excluded.avatar_url,
               updated_at   = MAX(updated_at, excluded.updated_at),
               last_seen_at = MAX(last_seen_at, excluded.last_seen_at)
             RETURNING {PROFILE_COLUMNS}"
          ),
          rusqlite::params![
            id_str,
            record.subject_id,
            record.email,
            record.display_name,
            record.avatar_url,
            record.rating,
            record.is_admin,
            created_str,
            updated_str,
            last_seen_str,
          ],
          RawProfile::from_row,
        )?)
      })
      .await?;

    raw.into_profile()
  }

  async fn set_rating(
    &self,
    subject_id: &str,
    rating: i64,
  ) -> Result<Option<ProfileRecord>> {
    let subject_id = subject_id.to_owned();
    let now_str    = encode_dt(Utc::now());

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE profiles SET rating = ?2, updated_at = MAX(updated_at, ?3)
                 WHERE subject_id = ?1
                 RETURNING {PROFILE_COLUMNS}"
              ),
              rusqlite::params![subject_id, rating, now_str],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn record_match(
    &self,
    player_a: &str,
    player_b: &str,
    score_a: f64,
  ) -> Result<Option<(ProfileRecord, ProfileRecord)>> {
    elo::check_score(score_a)?;

    let player_a = player_a.to_owned();
    let player_b = player_b.to_owned();
    let now_str  = encode_dt(Utc::now());

    // Both reads and both writes happen under one write lock, so no other
    // rating change can slip in between them.
    let raw: Option<(RawProfile, RawProfile)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let rating_of = |subject_id: &str| {
          tx.query_row(
            "SELECT rating FROM profiles WHERE subject_id = ?1",
            rusqlite::params![subject_id],
            |row| row.get::<_, i64>(0),
          )
          .optional()
        };
        let (Some(rating_a), Some(rating_b)) =
          (rating_of(&player_a)?, rating_of(&player_b)?)
        else {
          return Ok(None);
        };

        let (new_a, new_b) = elo::rate_match(rating_a, rating_b, score_a)
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

        let write = |subject_id: &str, rating: i64| {
          tx.query_row(
            &format!(
              "UPDATE profiles SET rating = ?2, updated_at = MAX(updated_at, ?3)
               WHERE subject_id = ?1
               RETURNING {PROFILE_COLUMNS}"
            ),
            rusqlite::params![subject_id, rating, now_str],
            RawProfile::from_row,
          )
        };
        let raw_a = write(&player_a, new_a)?;
        let raw_b = write(&player_b, new_b)?;

        tx.commit()?;
        Ok(Some((raw_a, raw_b)))
      })
      .await?;

    raw
      .map(|(a, b)| -> Result<_> { Ok((a.into_profile()?, b.into_profile()?)) })
      .transpose()
  }
}

// ─── Connector ───────────────────────────────────────────────────────────────

/// Where a [`SqliteConnector`] opens its database.
#[derive(Debug, Clone)]
enum Target {
  File(PathBuf),
  Memory,
}

/// Opens a [`SqliteStore`] on demand; pair with
/// [`ranked_core::lazy::LazyStore`] for a connect-on-first-use handle.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
  target: Target,
}

impl SqliteConnector {
  pub fn file(path: impl Into<PathBuf>) -> Self {
    Self { target: Target::File(path.into()) }
  }

  pub fn in_memory() -> Self { Self { target: Target::Memory } }
}

impl Connect for SqliteConnector {
  type Store = SqliteStore;

  async fn connect(&self) -> Result<SqliteStore> {
    match &self.target {
      Target::File(path) => SqliteStore::open(path).await,
      Target::Memory => SqliteStore::open_in_memory().await,
    }
  }
}
