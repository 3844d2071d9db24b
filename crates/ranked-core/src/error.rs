//! Error types for `ranked-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required identity claim was missing or empty.
  #[error("invalid claims: {0}")]
  InvalidClaims(String),

  /// A match score outside `0.0..=1.0`.
  #[error("invalid match score: {0}")]
  InvalidScore(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
