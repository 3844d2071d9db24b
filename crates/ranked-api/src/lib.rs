//! JSON REST API for Ranked.
//!
//! Exposes an axum [`Router`] backed by any [`ranked_core::store::ProfileStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ranked_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod profiles;
pub mod ratings;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use ranked_core::store::ProfileStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ProfileStore + 'static,
{
  Router::new()
    // Profiles
    .route("/user/save-profile", post(profiles::save::<S>))
    .route("/users/{subject_id}", get(profiles::get_by_subject::<S>))
    .route("/profiles/{id}", get(profiles::get_by_id::<S>))
    // Ratings
    .route("/ratings/match", post(ratings::record_match::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
