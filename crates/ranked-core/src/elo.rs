//! Elo rating arithmetic used by the rating-update path.

use crate::{Error, Result};

/// Maximum adjustment per game.
pub const K_FACTOR: f64 = 32.0;

/// Expected score of a player rated `rating_a` against one rated `rating_b`.
pub fn expected_score(rating_a: i64, rating_b: i64) -> f64 {
  1.0 / (1.0 + 10f64.powf((rating_b - rating_a) as f64 / 400.0))
}

/// New rating for player A after scoring `score_a` against player B.
///
/// `score_a` is 1.0 for a win, 0.5 for a draw and 0.0 for a loss; anything
/// outside `0.0..=1.0` is rejected.
pub fn update_rating(rating_a: i64, rating_b: i64, score_a: f64) -> Result<i64> {
  check_score(score_a)?;
  let expected = expected_score(rating_a, rating_b);
  Ok((rating_a as f64 + K_FACTOR * (score_a - expected)).round() as i64)
}

/// Reject a match score outside `0.0..=1.0` (including NaN).
pub fn check_score(score_a: f64) -> Result<()> {
  if !(0.0..=1.0).contains(&score_a) {
    return Err(Error::InvalidScore(score_a));
  }
  Ok(())
}

/// New ratings for both players of one game, A's result being `score_a`.
pub fn rate_match(rating_a: i64, rating_b: i64, score_a: f64) -> Result<(i64, i64)> {
  Ok((
    update_rating(rating_a, rating_b, score_a)?,
    update_rating(rating_b, rating_a, 1.0 - score_a)?,
  ))
}
