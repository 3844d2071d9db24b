//! Profile reconciliation: merging fresh identity claims into a stored profile.
//!
//! The merge is written out field by field. Adding a field to
//! [`ProfileRecord`] breaks compilation here until someone decides which side
//! it comes from, so the rating can never silently start flowing from claims.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  profile::{Claims, DEFAULT_RATING, ProfileRecord},
};

/// Reconcile `claims` against the `existing` record (if any) using the
/// current wall-clock time.
pub fn reconcile(
  claims: Claims,
  existing: Option<&ProfileRecord>,
) -> Result<ProfileRecord> {
  reconcile_at(claims, existing, Utc::now())
}

/// Reconcile with an explicit clock.
///
/// - No existing record: a new profile with [`DEFAULT_RATING`].
/// - Existing record: email, display name and avatar come from `claims`;
///   identity, rating, admin flag and creation time are carried over. The
///   record must belong to the same subject as the claims.
///
/// `updated_at` never moves backwards: `now` is clamped to the existing
/// record's `updated_at`.
pub fn reconcile_at(
  claims: Claims,
  existing: Option<&ProfileRecord>,
  now: DateTime<Utc>,
) -> Result<ProfileRecord> {
  claims.validate()?;

  let Claims { subject_id, email, display_name, avatar_url } = claims;

  let record = match existing {
    None => ProfileRecord {
      id: Uuid::new_v4(),
      subject_id,
      email,
      display_name,
      avatar_url,
      rating: DEFAULT_RATING,
      is_admin: false,
      created_at: now,
      updated_at: now,
      last_seen_at: now,
    },
    Some(prior) if prior.subject_id != subject_id => {
      return Err(Error::InvalidClaims(format!(
        "claims for {subject_id:?} cannot update profile {:?}",
        prior.subject_id
      )));
    }
    Some(prior) => {
      let now = now.max(prior.updated_at);
      ProfileRecord {
        id: prior.id,
        subject_id,
        email,
        display_name,
        avatar_url,
        rating: prior.rating,
        is_admin: prior.is_admin,
        created_at: prior.created_at,
        updated_at: now,
        last_seen_at: now,
      }
    }
  };

  Ok(record)
}
