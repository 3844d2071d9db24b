//! Handler for the rating-update endpoint.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/ratings/match` | Body: [`MatchBody`]; applies one Elo update to both players |
//!
//! This is the only route that changes a rating after a profile is created.
//! Both players are updated in one store operation, so concurrent matches
//! sharing a player never overwrite each other.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use ranked_core::{elo, profile::ProfileRecord, store::ProfileStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct MatchBody {
  pub player_a: String,
  pub player_b: String,
  /// Player A's result: 1.0 win, 0.5 draw, 0.0 loss.
  pub score_a:  f64,
}

#[derive(Debug, Serialize)]
pub struct MatchResult {
  pub player_a: ProfileRecord,
  pub player_b: ProfileRecord,
}

/// `POST /ratings/match`
pub async fn record_match<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<MatchBody>, JsonRejection>,
) -> Result<Json<MatchResult>, ApiError>
where
  S: ProfileStore,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

  if body.player_a == body.player_b {
    return Err(ApiError::BadRequest("a player cannot play themselves".into()));
  }
  elo::check_score(body.score_a).map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let (player_a, player_b) = store
    .record_match(&body.player_a, &body.player_b, body.score_a)
    .await
    .map_err(ApiError::store("Failed to update rating"))?
    .ok_or_else(|| {
      ApiError::NotFound(format!(
        "user {} or {} not found",
        body.player_a, body.player_b
      ))
    })?;

  tracing::info!(
    player_a = %player_a.subject_id,
    player_b = %player_b.subject_id,
    rating_a = player_a.rating,
    rating_b = player_b.rating,
    "match recorded"
  );
  Ok(Json(MatchResult { player_a, player_b }))
}
