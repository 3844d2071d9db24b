//! The `ProfileStore` trait and the read-reconcile-write sequence built on it.
//!
//! The trait is implemented by storage backends (e.g. `ranked-store-sqlite`).
//! Higher layers (`ranked-api`, `ranked-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::{
  profile::{Claims, ProfileRecord},
  reconcile::reconcile,
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a profile store backend: a durable collection with one
/// record per subject id.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up the profile for `subject_id`. Returns `None` if absent.
  fn find_by_subject_id<'a>(
    &'a self,
    subject_id: &'a str,
  ) -> impl Future<Output = Result<Option<ProfileRecord>, Self::Error>> + Send + 'a;

  /// Look up a profile by its opaque record id. Returns `None` if absent.
  fn find_by_id(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ProfileRecord>, Self::Error>> + Send + '_;

  /// Write `record`, keyed by its subject id, and return what is stored.
  ///
  /// If a record for the subject already exists, only the claim-derived
  /// fields and the `updated_at` / `last_seen_at` timestamps are overwritten.
  /// The stored `id`, `rating`, `is_admin` and `created_at` are kept, so a
  /// racing create can never reset a rating.
  fn upsert(
    &self,
    record: ProfileRecord,
  ) -> impl Future<Output = Result<ProfileRecord, Self::Error>> + Send + '_;

  /// Replace the rating of `subject_id`. This is the only path that changes a
  /// rating after creation. Returns `None` if no such profile exists.
  fn set_rating<'a>(
    &'a self,
    subject_id: &'a str,
    rating: i64,
  ) -> impl Future<Output = Result<Option<ProfileRecord>, Self::Error>> + Send + 'a;

  /// Apply one Elo update to both players as a single atomic step.
  ///
  /// Both ratings are read and both are written without any other write to
  /// either profile in between, so concurrent matches sharing a player are
  /// applied one after the other. Returns `None`, changing nothing, if either
  /// profile is absent. Callers should reject an invalid `score_a` with
  /// [`crate::elo::check_score`] first.
  fn record_match<'a>(
    &'a self,
    player_a: &'a str,
    player_b: &'a str,
    score_a: f64,
  ) -> impl Future<Output = Result<Option<(ProfileRecord, ProfileRecord)>, Self::Error>>
  + Send
  + 'a;
}

// ─── Save ────────────────────────────────────────────────────────────────────

/// Failure of [`save_profile`]: either the claims were rejected before the
/// store was touched, or the store failed and its error is passed through.
#[derive(Debug, Error)]
pub enum SaveError<E: std::error::Error + 'static> {
  #[error(transparent)]
  Claims(#[from] crate::Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}

/// Reconcile `claims` with whatever is stored for the subject and persist the
/// result.
///
/// The lookup and the write are two separate store calls; see
/// [`ProfileStore::upsert`] for how concurrent saves of one subject resolve.
pub async fn save_profile<S: ProfileStore>(
  store: &S,
  claims: Claims,
) -> Result<ProfileRecord, SaveError<S::Error>> {
  claims.validate()?;

  let existing = store
    .find_by_subject_id(&claims.subject_id)
    .await
    .map_err(SaveError::Store)?;

  let record = reconcile(claims, existing.as_ref())?;

  store.upsert(record).await.map_err(SaveError::Store)
}
