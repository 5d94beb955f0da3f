//! Polling sync against the snapshot store.
//!
//! [`SyncEngine::sync`] fetches the session's snapshot, decodes the
//! envelope and commits it through the merge policy. [`SyncEngine::start`]
//! runs that routine once immediately and then on every tick of a fixed
//! interval. Failed fetches are logged and skipped until the next tick;
//! there is no retry or backoff.
//!
//! With [`LastFetchWins`] a fetched snapshot overwrites moves applied
//! locally while the fetch was in flight.

use crate::merge::{LastFetchWins, MergePolicy};
use crate::session::SessionStore;
use chess_session_core::{Envelope, EnvelopeError, RulesEngine};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Shortest accepted polling period
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// What a single sync attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The fetched game was committed
    Applied,
    /// Nothing is stored for the session yet
    NoSnapshot,
    /// The fetch failed (network error or non-success status)
    TransportFailed,
    /// The stored envelope has a version other than 0
    UnsupportedVersion(i64),
    /// The stored value is not a valid envelope
    Malformed,
    /// The engine was torn down before the result could be applied
    Discarded,
}

/// Reconciles a session with its stored snapshot
pub struct SyncEngine<R> {
    session: SessionStore<R>,
    policy: Arc<dyn MergePolicy>,
    /// Cleared on teardown; results are only applied while it is set
    live: Mutex<bool>,
}

impl<R> SyncEngine<R>
where
    R: RulesEngine + Send + Sync + 'static,
{
    pub fn new(session: SessionStore<R>) -> Self {
        Self::with_policy(session, Arc::new(LastFetchWins))
    }

    pub fn with_policy(session: SessionStore<R>, policy: Arc<dyn MergePolicy>) -> Self {
        Self {
            session,
            policy,
            live: Mutex::new(true),
        }
    }

    pub fn session(&self) -> &SessionStore<R> {
        &self.session
    }

    /// Fetch, decode and commit the stored snapshot once
    pub async fn sync(&self) -> SyncOutcome {
        let id = self.session.id();

        let raw = match self.session.store().get(id, self.session.key()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return SyncOutcome::NoSnapshot,
            Err(e) => {
                error!(session = %id, error = %e, "Error syncing store");
                return SyncOutcome::TransportFailed;
            }
        };

        let remote = match Envelope::decode(&raw) {
            Ok(envelope) => envelope.into_game(),
            Err(EnvelopeError::UnsupportedVersion(version)) => {
                error!(session = %id, version, "Unhandled snapshot version");
                return SyncOutcome::UnsupportedVersion(version);
            }
            Err(e) => {
                error!(session = %id, error = %e, "Error syncing store");
                return SyncOutcome::Malformed;
            }
        };

        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if !*live {
            debug!(session = %id, "Discarding snapshot fetched after teardown");
            return SyncOutcome::Discarded;
        }
        self.session.reconcile(remote, self.policy.as_ref());
        SyncOutcome::Applied
    }

    /// Sync now and then every `period` until the returned handle is shut
    /// down or dropped
    pub fn start(self, period: Duration) -> SyncHandle<R> {
        let engine = Arc::new(self);
        let period = period.max(MIN_PERIOD);

        let task_engine = Arc::clone(&engine);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately
                ticker.tick().await;
                let outcome = task_engine.sync().await;
                debug!(session = %task_engine.session.id(), ?outcome, "Sync tick");
            }
        });

        info!(session = %engine.session.id(), ?period, "Sync started");
        SyncHandle {
            engine,
            task: Some(task),
        }
    }
}

impl<R> SyncEngine<R> {
    /// Whether fetched results are still being applied
    pub fn is_live(&self) -> bool {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_applying(&self) {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

/// Owns the polling task of a started [`SyncEngine`]
pub struct SyncHandle<R> {
    engine: Arc<SyncEngine<R>>,
    task: Option<JoinHandle<()>>,
}

impl<R> SyncHandle<R>
where
    R: RulesEngine + Send + Sync + 'static,
{
    /// Manual refresh, running the same routine as the timer
    pub async fn sync(&self) -> SyncOutcome {
        self.engine.sync().await
    }

    pub fn engine(&self) -> &Arc<SyncEngine<R>> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Stop polling. Fetches still in flight are discarded.
    pub fn shutdown(mut self) {
        self.cancel();
    }
}

impl<R> SyncHandle<R> {
    /// Runs at most once per handle
    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            self.engine.stop_applying();
            task.abort();
            info!(session = %self.engine.session.id(), "Sync stopped");
        }
    }
}

impl<R> Drop for SyncHandle<R> {
    fn drop(&mut self) {
        self.cancel();
    }
}
