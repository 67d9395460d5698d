//! Caller-side caching of the tournaments list.
//!
//! The store itself keeps no state and never retries. This layer remembers the last snapshot for
//! a short while, retries failed reads, and drops the snapshot whenever a mutation succeeds so
//! the next read sees the change.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use cached::{Cached, TimedCache};
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{debug, warn};

use crate::{
    models::Tournament,
    storage::ObjectStorage,
    store::StoreHandle,
    utils::error::StoreError,
};

/// How long snapshots stay fresh and how hard reads are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Rounded down to whole seconds.
    pub stale_time: Duration,
    /// Extra attempts after the first failed read.
    pub retry: u32,
    pub retry_delay: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            retry: 1,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Cached access to the tournaments list.
///
/// There is only ever one list, so the cache is keyed by `()`.
#[derive(Debug)]
pub struct TournamentQuery {
    options: QueryOptions,
    snapshot: Mutex<TimedCache<(), Vec<Tournament>>>,
}

impl Default for TournamentQuery {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl TournamentQuery {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            options,
            snapshot: Mutex::new(TimedCache::with_lifespan(options.stale_time.as_secs())),
        }
    }

    fn snapshot(&self) -> MutexGuard<'_, TimedCache<(), Vec<Tournament>>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The tournaments list, from cache while fresh and from the store otherwise.
    pub async fn tournaments<S: ObjectStorage>(
        &self,
        handle: &StoreHandle<S>,
    ) -> Result<Vec<Tournament>, StoreError> {
        let cached = self.snapshot().cache_get(&()).cloned();
        if let Some(tournaments) = cached {
            return Ok(tournaments);
        }

        let retries =
            FixedInterval::new(self.options.retry_delay).take(self.options.retry as usize);
        let tournaments = Retry::spawn(retries, move || async move {
            handle
                .list()
                .await
                .inspect_err(|e| warn!("Failed to fetch tournaments: {}", e))
        })
        .await?;

        debug!(count = tournaments.len(), "Cached tournaments snapshot");
        self.snapshot().cache_set((), tournaments.clone());

        Ok(tournaments)
    }

    /// A single tournament looked up by id in the (possibly cached) list.
    pub async fn tournament<S: ObjectStorage>(
        &self,
        handle: &StoreHandle<S>,
        id: &str,
    ) -> Result<Option<Tournament>, StoreError> {
        Ok(self
            .tournaments(handle)
            .await?
            .into_iter()
            .find(|t| t.id == id))
    }

    pub async fn add<S: ObjectStorage>(
        &self,
        handle: &StoreHandle<S>,
        tournament: Tournament,
    ) -> Result<(), StoreError> {
        handle.create(tournament).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn update<S: ObjectStorage>(
        &self,
        handle: &StoreHandle<S>,
        tournament: Tournament,
    ) -> Result<(), StoreError> {
        handle.update(tournament).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn remove<S: ObjectStorage>(
        &self,
        handle: &StoreHandle<S>,
        id: &str,
    ) -> Result<(), StoreError> {
        handle.delete(id).await?;
        self.invalidate();
        Ok(())
    }

    /// Drops the cached snapshot so the next read goes to the store.
    pub fn invalidate(&self) {
        self.snapshot().cache_clear();
    }
}
