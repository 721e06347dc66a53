//! Two-phase latest-content reads: whatever the cache holds now, plus a
//! background refresh for the rest.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::task::JoinHandle;
use voices_core::{Commentator, CommentatorId};

use crate::fetcher::ContentFetcher;
use crate::model::LatestContent;

/// Immediate answer of a two-phase read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentView {
    /// Live cache entries keyed by commentator id.
    pub content: BTreeMap<String, LatestContent>,
    /// Whether a background refresh is running for missing entries.
    pub refreshing: bool,
}

/// A spawned refresh. Aborting it drops in-flight requests; batches that had
/// not finished are never written to the cache.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<HashMap<CommentatorId, LatestContent>>,
}

impl RefreshHandle {
    pub fn abort(&self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Results of the refresh, `None` if it was aborted or panicked.
    pub async fn join(self) -> Option<HashMap<CommentatorId, LatestContent>> {
        match self.task.await {
            Ok(results) => Some(results),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                tracing::warn!(error = %e, "latest-content refresh task failed");
                None
            }
        }
    }
}

/// Spawn a refresh of `pending` on the current tokio runtime.
#[must_use]
pub fn spawn_refresh(fetcher: Arc<ContentFetcher>, pending: Vec<Commentator>) -> RefreshHandle {
    let task = tokio::spawn(async move {
        let results = fetcher.refresh(&pending).await;
        tracing::info!(refreshed = results.len(), "latest-content refresh finished");
        results
    });
    RefreshHandle { task }
}

/// Serves cached content immediately and keeps at most one refresh running.
pub struct LatestContentService {
    fetcher: Arc<ContentFetcher>,
    in_flight: Mutex<Option<RefreshHandle>>,
}

impl LatestContentService {
    #[must_use]
    pub fn new(fetcher: Arc<ContentFetcher>) -> Self {
        Self {
            fetcher,
            in_flight: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn fetcher(&self) -> &Arc<ContentFetcher> {
        &self.fetcher
    }

    /// Live cache entries now; anything missing or stale is refreshed in
    /// the background. Must be called inside a tokio runtime.
    pub async fn read(&self, commentators: &[Commentator]) -> ContentView {
        let (cached, pending) = self.fetcher.partition(commentators).await;
        let refreshing = !pending.is_empty() && self.ensure_refresh(pending);
        ContentView {
            content: cached
                .into_iter()
                .map(|(id, content)| (id.to_string(), content))
                .collect(),
            refreshing,
        }
    }

    fn ensure_refresh(&self, pending: Vec<Commentator>) -> bool {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let running = slot.as_ref().is_some_and(|handle| !handle.is_finished());
        if !running {
            *slot = Some(spawn_refresh(Arc::clone(&self.fetcher), pending));
        }
        true
    }

    /// Abort the running refresh, if any. Returns whether one was running.
    pub fn abort_refresh(&self) -> bool {
        let handle = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Wait for the current refresh to finish and return its results.
    pub async fn wait_for_refresh(&self) -> Option<HashMap<CommentatorId, LatestContent>> {
        let handle = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        handle.join().await
    }
}
