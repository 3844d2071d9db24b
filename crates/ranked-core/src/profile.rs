//! Profile records and the identity claims they are reconciled from.
//!
//! A profile is the locally stored view of a user authenticated by an external
//! identity provider. Most of it mirrors the provider's claims; the rating is
//! owned by this system and never taken from the provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Rating assigned to every profile on first sight.
pub const DEFAULT_RATING: i64 = 1000;

// ─── Claims ──────────────────────────────────────────────────────────────────

/// Identity attributes asserted by the identity provider for the current user.
///
/// There is deliberately no rating field: nothing the provider (or a client)
/// sends can reach [`ProfileRecord::rating`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims {
  /// The provider's subject identifier (the `sub` claim).
  pub subject_id:   String,
  pub email:        String,
  pub display_name: Option<String>,
  pub avatar_url:   Option<String>,
}

impl Claims {
  /// Convenience constructor for the two required claims.
  pub fn new(subject_id: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      subject_id:   subject_id.into(),
      email:        email.into(),
      display_name: None,
      avatar_url:   None,
    }
  }

  /// Reject claims without a subject id or email. Whitespace-only values
  /// count as missing.
  pub fn validate(&self) -> Result<()> {
    if self.subject_id.trim().is_empty() {
      return Err(Error::InvalidClaims("subject id is missing".into()));
    }
    if self.email.trim().is_empty() {
      return Err(Error::InvalidClaims("email is missing".into()));
    }
    Ok(())
  }
}

// ─── ProfileRecord ───────────────────────────────────────────────────────────

/// The stored profile for one subject. At most one exists per `subject_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
  /// Opaque handle assigned at creation; never changes.
  pub id:           Uuid,
  pub subject_id:   String,
  pub email:        String,
  pub display_name: Option<String>,
  pub avatar_url:   Option<String>,
  /// System-owned score. Set to [`DEFAULT_RATING`] at creation and afterwards
  /// only changed by the rating-update path, never by reconciliation.
  pub rating:       i64,
  pub is_admin:     bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  pub last_seen_at: DateTime<Utc>,
}
