//! HTTP server assembly for Ranked.
//!
//! Mounts the JSON API from `ranked-api` under `/api` on top of a lazily
//! connected SQLite profile store.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use ranked_core::{lazy::LazyStore, store::ProfileStore};
use ranked_store_sqlite::SqliteConnector;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RANKED_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// SQLite database file; a leading `~/` is expanded.
  pub store_path: PathBuf,
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment, on top of
  /// built-in defaults.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 3000)?
      .set_default("store_path", "ranked.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("RANKED"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// The process-wide store handle: connects on the first request that needs
/// it.
pub type SharedStore = LazyStore<SqliteConnector>;

pub fn shared_store(config: &ServerConfig) -> Arc<SharedStore> {
  let path = expand_tilde(&config.store_path);
  Arc::new(LazyStore::new(SqliteConnector::file(path)))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level application router.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: ProfileStore + 'static,
{
  Router::new()
    .nest("/api", ranked_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = Arc::new(LazyStore::new(SqliteConnector::in_memory()));
    let req   = Request::builder()
      .method("POST")
      .uri("/api/user/save-profile")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(
        json!({ "user": { "sub": "u1", "email": "a@b.com" } }).to_string(),
      ))
      .unwrap();

    let resp = app(store.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["record"]["rating"], 1000);
    assert!(store.is_connected());
  }

  #[tokio::test]
  async fn unknown_route_returns_404() {
    let store = Arc::new(LazyStore::new(SqliteConnector::in_memory()));
    let req   = Request::builder()
      .uri("/user/save-profile")
      .body(Body::empty())
      .unwrap();
    let resp = app(store.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(!store.is_connected());
  }

  #[test]
  fn config_defaults_apply_without_file() {
    let missing = std::env::temp_dir().join("ranked-no-such-config.toml");
    let config  = ServerConfig::load(&missing).unwrap();
    assert_eq!(config.port, 3000);
    assert_eq!(config.address(), format!("{}:3000", config.host));
  }

  #[test]
  fn tilde_is_expanded_only_at_start() {
    let plain = PathBuf::from("/var/lib/ranked.db");
    assert_eq!(expand_tilde(&plain), plain);

    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/ranked.db")),
        PathBuf::from(home).join("ranked.db"),
      );
    }
  }
}
