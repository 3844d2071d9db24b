//! Handlers for profile endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/user/save-profile` | Body: `{"user": {"sub", "email", "name"?, "picture"?}}` |
//! | `GET`  | `/users/{subject_id}` | 404 if not found |
//! | `GET`  | `/profiles/{id}` | Lookup by record id; 404 if not found |
//!
//! The save endpoint trusts the identity claims in the request body; it does
//! not verify them against the identity provider.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use bytes::Bytes;
use ranked_core::{
  profile::{Claims, ProfileRecord},
  store::{ProfileStore, SaveError, save_profile},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Save ─────────────────────────────────────────────────────────────────────

/// The identity provider's user object as forwarded by the client. Field
/// names follow the provider's claim names. Unknown keys (including any
/// rating a client might send) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UserClaims {
  pub sub:     Option<String>,
  pub email:   Option<String>,
  pub name:    Option<String>,
  pub picture: Option<String>,
}

impl From<UserClaims> for Claims {
  fn from(user: UserClaims) -> Self {
    Claims {
      subject_id:   user.sub.unwrap_or_default(),
      email:        user.email.unwrap_or_default(),
      display_name: user.name,
      avatar_url:   user.picture,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveProfileBody {
  pub user: Option<UserClaims>,
}

#[derive(Debug, Serialize)]
pub struct SaveProfileResponse {
  pub success: bool,
  pub record:  ProfileRecord,
}

/// `POST /user/save-profile`
///
/// A body that is missing or not valid JSON is treated like one without a
/// `user` object.
pub async fn save<S>(
  State(store): State<Arc<S>>,
  body: Bytes,
) -> Result<Json<SaveProfileResponse>, ApiError>
where
  S: ProfileStore,
{
  let body: SaveProfileBody = serde_json::from_slice(&body).unwrap_or_default();
  let user = body
    .user
    .ok_or_else(|| ApiError::Unauthorized("User information not provided".into()))?;

  let record = match save_profile(store.as_ref(), Claims::from(user)).await {
    Ok(record) => record,
    Err(SaveError::Claims(e)) => {
      tracing::debug!(error = %e, "rejected profile claims");
      return Err(ApiError::Unauthorized("Invalid user information".into()));
    }
    Err(SaveError::Store(e)) => {
      return Err(ApiError::store("Failed to save user profile")(e));
    }
  };

  tracing::info!(
    subject_id = %record.subject_id,
    rating = record.rating,
    "profile saved"
  );
  Ok(Json(SaveProfileResponse { success: true, record }))
}

// ─── Lookups ──────────────────────────────────────────────────────────────────

/// `GET /users/{subject_id}`
pub async fn get_by_subject<S>(
  State(store): State<Arc<S>>,
  Path(subject_id): Path<String>,
) -> Result<Json<ProfileRecord>, ApiError>
where
  S: ProfileStore,
{
  let record = store
    .find_by_subject_id(&subject_id)
    .await
    .map_err(ApiError::store("Failed to load user profile"))?
    .ok_or_else(|| ApiError::NotFound(format!("user {subject_id} not found")))?;
  Ok(Json(record))
}

/// `GET /profiles/{id}`
pub async fn get_by_id<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ProfileRecord>, ApiError>
where
  S: ProfileStore,
{
  let record = store
    .find_by_id(id)
    .await
    .map_err(ApiError::store("Failed to load user profile"))?
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))?;
  Ok(Json(record))
}
