//! A process-scoped store handle that connects on first use.
//!
//! [`LazyStore`] memoizes the connection produced by a [`Connect`]
//! implementation. Concurrent first calls are coalesced onto one attempt:
//! only that attempt runs, and every caller waiting on it receives its result,
//! success or failure alike. A failed attempt leaves the handle empty, so the
//! next call tries again instead of returning the stale failure forever.

use std::{
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{profile::ProfileRecord, store::ProfileStore};

/// Opens a connection to a profile store backend.
pub trait Connect: Send + Sync + 'static {
  type Store: ProfileStore + 'static;

  fn connect(
    &self,
  ) -> impl Future<
    Output = Result<Self::Store, <Self::Store as ProfileStore>::Error>,
  > + Send
  + '_;
}

type BackendError<C> = <<C as Connect>::Store as ProfileStore>::Error;

/// What every waiter on one connection attempt receives.
type Outcome<S, E> = Result<Arc<S>, Arc<E>>;

enum Slot<S, E> {
  Empty,
  /// An attempt is running; its outcome is published on this channel.
  Connecting(watch::Receiver<Option<Outcome<S, E>>>),
  Ready(Arc<S>),
}

/// Error of a [`LazyStore`] operation.
#[derive(Debug, Error)]
pub enum LazyError<E: std::error::Error + 'static> {
  /// The shared connection attempt failed. Every caller that waited on that
  /// attempt holds the same error.
  #[error("failed to connect to profile store: {0}")]
  Connect(#[source] Arc<E>),

  #[error(transparent)]
  Store(E),
}

/// A lazily connected [`ProfileStore`]. Share it behind an `Arc`.
pub struct LazyStore<C: Connect> {
  connector: Arc<C>,
  slot:      Arc<Mutex<Slot<C::Store, BackendError<C>>>>,
}

fn lock<S, E>(slot: &Mutex<Slot<S, E>>) -> MutexGuard<'_, Slot<S, E>> {
  slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C: Connect> LazyStore<C> {
  pub fn new(connector: C) -> Self {
    Self {
      connector: Arc::new(connector),
      slot:      Arc::new(Mutex::new(Slot::Empty)),
    }
  }

  /// Return the connected store, connecting first if necessary.
  ///
  /// Must be called from within a tokio runtime: the attempt runs on its own
  /// task, so it completes even if the caller that started it is dropped.
  pub async fn get(&self) -> Outcome<C::Store, BackendError<C>> {
    loop {
      let mut rx = {
        let mut slot = lock(&self.slot);
        match &*slot {
          Slot::Ready(store) => return Ok(Arc::clone(store)),
          Slot::Connecting(rx) => rx.clone(),
          Slot::Empty => {
            let rx = self.spawn_attempt();
            *slot = Slot::Connecting(rx.clone());
            rx
          }
        }
      };

      let seen = rx.wait_for(Option::is_some).await.map(|seen| seen.clone());
      if let Ok(Some(outcome)) = seen {
        return outcome;
      }

      // The attempt's task died before publishing anything. Forget it so
      // this call (and any other) starts a fresh one.
      let mut slot = lock(&self.slot);
      if let Slot::Connecting(current) = &*slot
        && current.same_channel(&rx)
      {
        *slot = Slot::Empty;
      }
    }
  }

  fn spawn_attempt(&self) -> watch::Receiver<Option<Outcome<C::Store, BackendError<C>>>> {
    let (tx, rx) = watch::channel(None);
    let connector = Arc::clone(&self.connector);
    let slot = Arc::clone(&self.slot);

    tokio::spawn(async move {
      let outcome = connector.connect().await.map(Arc::new).map_err(Arc::new);
      match &outcome {
        Ok(store) => *lock(&slot) = Slot::Ready(Arc::clone(store)),
        Err(error) => {
          tracing::warn!(%error, "profile store connection failed");
          *lock(&slot) = Slot::Empty;
        }
      }
      tx.send_replace(Some(outcome));
    });

    rx
  }

  /// Whether a connection has been established.
  pub fn is_connected(&self) -> bool {
    matches!(*lock(&self.slot), Slot::Ready(_))
  }

  async fn connected(&self) -> Result<Arc<C::Store>, LazyError<BackendError<C>>> {
    self.get().await.map_err(LazyError::Connect)
  }
}

impl<C: Connect> ProfileStore for LazyStore<C> {
  type Error = LazyError<BackendError<C>>;

  async fn find_by_subject_id(
    &self,
    subject_id: &str,
  ) -> Result<Option<ProfileRecord>, Self::Error> {
    let store = self.connected().await?;
    store.find_by_subject_id(subject_id).await.map_err(LazyError::Store)
  }

  async fn find_by_id(
    &self,
    id: Uuid,
  ) -> Result<Option<ProfileRecord>, Self::Error> {
    let store = self.connected().await?;
    store.find_by_id(id).await.map_err(LazyError::Store)
  }

  async fn upsert(
    &self,
    record: ProfileRecord,
  ) -> Result<ProfileRecord, Self::Error> {
    let store = self.connected().await?;
    store.upsert(record).await.map_err(LazyError::Store)
  }

  async fn set_rating(
    &self,
    subject_id: &str,
    rating: i64,
  ) -> Result<Option<ProfileRecord>, Self::Error> {
    let store = self.connected().await?;
    store.set_rating(subject_id, rating).await.map_err(LazyError::Store)
  }

  async fn record_match(
    &self,
    player_a: &str,
    player_b: &str,
    score_a: f64,
  ) -> Result<Option<(ProfileRecord, ProfileRecord)>, Self::Error> {
    let store = self.connected().await?;
    store
      .record_match(player_a, player_b, score_a)
      .await
      .map_err(LazyError::Store)
  }
}
