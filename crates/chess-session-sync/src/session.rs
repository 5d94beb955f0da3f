//! Session store: the one mutation surface for a session's game value.
//!
//! The game state machine lives in a single shared slot. Each mutation runs
//! to completion under the slot's write lock and commits the whole new
//! value at once; when the value changed, the encoded envelope is written
//! to the snapshot store on a detached task. Write failures are logged and
//! otherwise ignored. The sync engine writes into the same slot through
//! [`SessionStore::reconcile`].

use crate::merge::MergePolicy;
use crate::store::{snapshot_key, SessionId, SnapshotStore, StoreError};
use chess_session_core::{Envelope, GameState, GameStateMachine, RulesEngine, User};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

struct Shared<R> {
    id: SessionId,
    key: String,
    slot: RwLock<GameStateMachine<R>>,
    store: Arc<dyn SnapshotStore>,
    runtime: Handle,
}

/// Handle to one session's shared game value. Clones share the same slot.
pub struct SessionStore<R> {
    inner: Arc<Shared<R>>,
}

impl<R> Clone for SessionStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> SessionStore<R> {
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// Name the snapshot is stored under
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.inner.store
    }
}

impl<R> SessionStore<R>
where
    R: RulesEngine + Send + Sync + 'static,
{
    /// Open a session, seeding the game from the stored snapshot when one
    /// exists and decodes, and from the initial position otherwise.
    ///
    /// Must be called from within a Tokio runtime; persistence writes are
    /// spawned on it.
    pub async fn open(id: SessionId, rules: R, store: Arc<dyn SnapshotStore>) -> Self {
        let key = snapshot_key(id);

        let initial = match store.get(id, &key).await {
            Ok(Some(raw)) => match Envelope::decode(&raw) {
                Ok(envelope) => {
                    info!(session = %id, "Restored stored game");
                    envelope.into_game()
                }
                Err(e) => {
                    warn!(session = %id, error = %e, "Ignoring stored game");
                    GameState::default()
                }
            },
            Ok(None) => GameState::default(),
            Err(e) => {
                error!(session = %id, error = %e, "Error retrieving game state");
                GameState::default()
            }
        };

        Self {
            inner: Arc::new(Shared {
                id,
                key,
                slot: RwLock::new(GameStateMachine::with_state(rules, initial)),
                store,
                runtime: Handle::current(),
            }),
        }
    }

    /// Copy of the current game value
    pub fn snapshot(&self) -> GameState {
        self.read(GameState::clone)
    }

    /// Read the current game value without copying it
    pub fn read<T>(&self, f: impl FnOnce(&GameState) -> T) -> T {
        let machine = self
            .inner
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(machine.state())
    }

    pub fn apply_move(&self, from: &str, to: &str, promotion: Option<char>) -> bool {
        self.mutate(|m| m.apply_move(from, to, promotion))
    }

    pub fn reset(&self) {
        self.mutate(|m| m.reset());
    }

    pub fn load(&self, fen: &str) {
        self.mutate(|m| m.load(fen));
    }

    pub fn undo(&self) {
        self.mutate(|m| m.undo());
    }

    /// Add a user or change their seat
    pub fn upsert_user(&self, user: User) {
        self.mutate(|m| m.upsert_user(user));
    }

    pub fn remove_user(&self, name: &str) {
        self.mutate(|m| m.remove_user(name));
    }

    /// Delete the stored snapshot. The local value is left as is.
    pub async fn clear_snapshot(&self) -> Result<(), StoreError> {
        self.inner.store.delete(self.inner.id, &self.inner.key).await
    }

    /// Commit a fetched game through `policy`. Local changes made since the
    /// fetch started are not persisted again here.
    pub fn reconcile(&self, remote: GameState, policy: &dyn MergePolicy) {
        let mut machine = self
            .inner
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let merged = policy.merge(machine.state(), remote);
        machine.replace(merged);
    }

    /// Run `op` against the slot and persist the result if the value changed
    fn mutate<T>(&self, op: impl FnOnce(&mut GameStateMachine<R>) -> T) -> T {
        let (result, encoded) = {
            let mut machine = self
                .inner
                .slot
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let before = machine.state().clone();
            let result = op(&mut *machine);

            if machine.state() == &before {
                return result;
            }
            (result, Envelope::encode(machine.state()))
        };

        match encoded {
            Ok(raw) => self.persist(raw),
            Err(e) => error!(session = %self.inner.id, error = %e, "Failed to encode game"),
        }
        result
    }

    /// Fire-and-forget write of an encoded envelope
    fn persist(&self, raw: String) {
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            match inner.store.put(inner.id, &inner.key, raw).await {
                Ok(()) => debug!(session = %inner.id, "Saved game state"),
                Err(e) => error!(session = %inner.id, error = %e, "Error saving game state"),
            }
        });
    }
}
