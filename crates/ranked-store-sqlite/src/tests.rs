//! Integration tests for `SqliteStore` against an in-memory database.

use ranked_core::{
  lazy::LazyStore,
  profile::{Claims, DEFAULT_RATING},
  reconcile::{reconcile, reconcile_at},
  store::{ProfileStore, SaveError, save_profile},
};
use ranked_core::lazy::LazyError;
use uuid::Uuid;

use crate::{SqliteConnector, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn alice() -> Claims {
  Claims {
    subject_id:   "auth0|alice".into(),
    email:        "alice@example.com".into(),
    display_name: Some("Alice".into()),
    avatar_url:   Some("https://img.example/alice.png".into()),
  }
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_missing_returns_none() {
  let s = store().await;
  assert!(s.find_by_subject_id("nobody").await.unwrap().is_none());
  assert!(s.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_then_find_by_both_keys() {
  let s = store().await;
  let record = reconcile(alice(), None).unwrap();

  let stored = s.upsert(record.clone()).await.unwrap();
  assert_eq!(stored, record);

  let by_subject = s.find_by_subject_id("auth0|alice").await.unwrap().unwrap();
  assert_eq!(by_subject, record);

  let by_id = s.find_by_id(record.id).await.unwrap().unwrap();
  assert_eq!(by_id, record);
}

// ─── Saving ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_save_creates_with_default_rating() {
  let s = store().await;
  let record = save_profile(&s, alice()).await.unwrap();

  assert_eq!(record.rating, DEFAULT_RATING);
  assert_eq!(record.created_at, record.updated_at);
  assert_eq!(record.display_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn second_save_updates_claims_and_keeps_rating() {
  let s = store().await;
  let created = save_profile(&s, alice()).await.unwrap();
  s.set_rating("auth0|alice", 1340).await.unwrap();

  let mut claims = alice();
  claims.email = "alice@new.example.com".into();
  claims.avatar_url = None;
  let updated = save_profile(&s, claims).await.unwrap();

  assert_eq!(updated.id, created.id);
  assert_eq!(updated.rating, 1340);
  assert_eq!(updated.email, "alice@new.example.com");
  assert_eq!(updated.avatar_url, None);
  assert_eq!(updated.created_at, created.created_at);
  assert!(updated.updated_at >= created.updated_at);

  let fetched = s.find_by_subject_id("auth0|alice").await.unwrap().unwrap();
  assert_eq!(fetched, updated);
}

#[tokio::test]
async fn invalid_claims_are_rejected_before_writing() {
  let s = store().await;
  let err = save_profile(&s, Claims::new("", "a@b.com")).await.unwrap_err();
  assert!(matches!(err, SaveError::Claims(_)));

  let err = save_profile(&s, Claims::new("u1", "")).await.unwrap_err();
  assert!(matches!(err, SaveError::Claims(_)));
  assert!(s.find_by_subject_id("u1").await.unwrap().is_none());
}

// ─── Upsert conflict semantics ───────────────────────────────────────────────

#[tokio::test]
async fn stale_create_does_not_reset_rating() {
  let s = store().await;
  let first = save_profile(&s, alice()).await.unwrap();
  s.set_rating("auth0|alice", 1500).await.unwrap();

  // A create computed before the rating change lands afterwards.
  let stale = reconcile(alice(), None).unwrap();
  let stored = s.upsert(stale).await.unwrap();

  assert_eq!(stored.id, first.id);
  assert_eq!(stored.rating, 1500);
  assert_eq!(stored.created_at, first.created_at);
}

#[tokio::test]
async fn stale_update_does_not_move_timestamps_backwards() {
  let s = store().await;
  let first = save_profile(&s, alice()).await.unwrap();

  // A reconcile computed now, then a rating change, then the stale write.
  let stale = reconcile_at(alice(), Some(&first), first.updated_at).unwrap();
  let rated = s.set_rating("auth0|alice", 1200).await.unwrap().unwrap();
  assert!(rated.updated_at >= first.updated_at);

  let stored = s.upsert(stale).await.unwrap();
  assert_eq!(stored.rating, 1200);
  assert_eq!(stored.updated_at, rated.updated_at);
  assert!(stored.last_seen_at >= first.last_seen_at);
}

#[tokio::test]
async fn concurrent_first_saves_leave_one_record() {
  let s = store().await;

  let (a, b) = tokio::join!(save_profile(&s, alice()), save_profile(&s, alice()));
  let (a, b) = (a.unwrap(), b.unwrap());

  assert_eq!(a.id, b.id);
  let stored = s.find_by_subject_id("auth0|alice").await.unwrap().unwrap();
  assert_eq!(stored.id, a.id);
  assert_eq!(stored.rating, DEFAULT_RATING);
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn set_rating_updates_existing_profile() {
  let s = store().await;
  save_profile(&s, alice()).await.unwrap();

  let rated = s.set_rating("auth0|alice", 1016).await.unwrap().unwrap();
  assert_eq!(rated.rating, 1016);

  let fetched = s.find_by_subject_id("auth0|alice").await.unwrap().unwrap();
  assert_eq!(fetched.rating, 1016);
}

#[tokio::test]
async fn set_rating_on_missing_profile_returns_none() {
  let s = store().await;
  assert!(s.set_rating("nobody", 1200).await.unwrap().is_none());
}

async fn store_with_players(subjects: &[&str]) -> SqliteStore {
  let s = store().await;
  for subject in subjects {
    save_profile(&s, Claims::new(*subject, format!("{subject}@example.com")))
      .await
      .unwrap();
  }
  s
}

#[tokio::test]
async fn record_match_updates_both_players() {
  let s = store_with_players(&["a", "b"]).await;

  let (a, b) = s.record_match("a", "b", 1.0).await.unwrap().unwrap();
  assert_eq!((a.rating, b.rating), (1016, 984));

  let fetched = s.find_by_subject_id("b").await.unwrap().unwrap();
  assert_eq!(fetched.rating, 984);
}

#[tokio::test]
async fn concurrent_matches_sharing_a_player_both_count() {
  let s = store_with_players(&["a", "b", "c"]).await;

  let (ab, ac) = tokio::join!(
    s.record_match("a", "b", 1.0),
    s.record_match("a", "c", 1.0),
  );
  ab.unwrap().unwrap();
  ac.unwrap().unwrap();

  let a = s.find_by_subject_id("a").await.unwrap().unwrap();
  assert_eq!(a.rating, 1031);
}

#[tokio::test]
async fn record_match_with_missing_player_changes_nothing() {
  let s = store_with_players(&["a"]).await;

  assert!(s.record_match("a", "ghost", 1.0).await.unwrap().is_none());
  let a = s.find_by_subject_id("a").await.unwrap().unwrap();
  assert_eq!(a.rating, DEFAULT_RATING);
}

#[tokio::test]
async fn record_match_rejects_invalid_score() {
  let s = store_with_players(&["a", "b"]).await;

  let err = s.record_match("a", "b", 1.5).await.unwrap_err();
  assert!(matches!(err, crate::Error::Core(ranked_core::Error::InvalidScore(_))));
  let a = s.find_by_subject_id("a").await.unwrap().unwrap();
  assert_eq!(a.rating, DEFAULT_RATING);
}

// ─── Lazy connection ─────────────────────────────────────────────────────────

#[tokio::test]
async fn lazy_in_memory_store_connects_on_first_call() {
  let lazy = LazyStore::new(SqliteConnector::in_memory());
  assert!(!lazy.is_connected());

  let record = save_profile(&lazy, alice()).await.unwrap();
  assert!(lazy.is_connected());

  let fetched = lazy.find_by_id(record.id).await.unwrap().unwrap();
  assert_eq!(fetched, record);
}

#[tokio::test]
async fn lazy_file_store_recovers_after_failed_open() {
  let dir = std::env::temp_dir().join(format!("ranked-{}", Uuid::new_v4()));
  let lazy = LazyStore::new(SqliteConnector::file(dir.join("profiles.db")));

  // The parent directory does not exist yet, so the first open fails.
  let err = save_profile(&lazy, alice()).await.unwrap_err();
  assert!(matches!(err, SaveError::Store(LazyError::Connect(_))));
  assert!(!lazy.is_connected());

  std::fs::create_dir_all(&dir).unwrap();
  let record = save_profile(&lazy, alice()).await.unwrap();
  assert_eq!(record.rating, DEFAULT_RATING);
  assert!(lazy.is_connected());

  drop(lazy);
  std::fs::remove_dir_all(&dir).ok();
}
