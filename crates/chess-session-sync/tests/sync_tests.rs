//! Integration tests for session persistence and polling sync.
//!
//! Most tests use the in-memory store; the wrappers below add failures,
//! fetch counting and a gate that holds a fetch open while the local game
//! keeps changing.

use async_trait::async_trait;
use chess_session_core::{
    Envelope, GameState, GameStateMachine, Seat, Side, StandardChess, User, INITIAL_FEN,
};
use chess_session_sync::{
    snapshot_key, MemorySnapshotStore, SessionId, SessionStore, SnapshotStore, StoreError,
    SyncEngine, SyncOutcome,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

const ID: SessionId = SessionId(1);

/// Store whose every call fails like an unreachable service
struct FailingStore;

#[async_trait]
impl SnapshotStore for FailingStore {
    async fn get(&self, _: SessionId, _: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Status {
            status: 500,
            message: "Failed to retrieve game state".into(),
        })
    }

    async fn put(&self, _: SessionId, _: &str, _: String) -> Result<(), StoreError> {
        Err(StoreError::Status {
            status: 500,
            message: "Failed to save game state".into(),
        })
    }

    async fn delete(&self, _: SessionId, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Status {
            status: 500,
            message: "Failed to remove game state".into(),
        })
    }
}

/// Counts `get` calls made against an inner store
struct CountingStore {
    inner: MemorySnapshotStore,
    gets: AtomicUsize,
}

#[async_trait]
impl SnapshotStore for CountingStore {
    async fn get(&self, session: SessionId, key: &str) -> Result<Option<String>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(session, key).await
    }

    async fn put(&self, session: SessionId, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.put(session, key, value).await
    }

    async fn delete(&self, session: SessionId, key: &str) -> Result<(), StoreError> {
        self.inner.delete(session, key).await
    }
}

/// `get` waits for the gate to open before reading the inner store
struct GatedStore {
    inner: MemorySnapshotStore,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

#[async_trait]
impl SnapshotStore for GatedStore {
    async fn get(&self, session: SessionId, key: &str) -> Result<Option<String>, StoreError> {
        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.inner.get(session, key).await
    }

    async fn put(&self, _: SessionId, _: &str, _: String) -> Result<(), StoreError> {
        // Local writes are dropped so the remote value stays fixed
        Ok(())
    }

    async fn delete(&self, session: SessionId, key: &str) -> Result<(), StoreError> {
        self.inner.delete(session, key).await
    }
}

/// A game that differs from the default in every slice
fn remote_game() -> GameState {
    let mut machine = GameStateMachine::new(StandardChess::new());
    machine.upsert_user(User::new("remote", Seat::Black));
    assert!(machine.apply_move("d2", "d4", None));
    assert!(machine.apply_move("g8", "f6", None));
    machine.state().clone()
}

async fn seed(store: &dyn SnapshotStore, game: &GameState) {
    store
        .put(ID, &snapshot_key(ID), Envelope::encode(game).unwrap())
        .await
        .unwrap();
}

async fn stored_game(store: &dyn SnapshotStore) -> Option<GameState> {
    let raw = store.get(ID, &snapshot_key(ID)).await.unwrap()?;
    Some(Envelope::decode(&raw).unwrap().into_game())
}

/// Poll until the stored game satisfies `check`; writes are detached tasks
async fn wait_for_stored(store: &dyn SnapshotStore, check: impl Fn(&GameState) -> bool) -> GameState {
    for _ in 0..200 {
        if let Some(game) = stored_game(store).await {
            if check(&game) {
                return game;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("stored game never matched");
}

async fn open(store: Arc<dyn SnapshotStore>) -> SessionStore<StandardChess> {
    SessionStore::open(ID, StandardChess::new(), store).await
}

#[tokio::test]
async fn test_open_restores_stored_game() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let game = remote_game();
    seed(store.as_ref(), &game).await;

    let session = open(store).await;
    assert_eq!(session.snapshot(), game);
}

#[tokio::test]
async fn test_open_ignores_unsupported_version() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    store
        .put(ID, "game-1", r#"{"version":1,"state":{}}"#.into())
        .await
        .unwrap();

    let session = open(store).await;
    assert_eq!(session.snapshot(), GameState::default());
}

#[tokio::test]
async fn test_open_survives_transport_failure() {
    let session = open(Arc::new(FailingStore)).await;
    assert_eq!(session.snapshot().fen, INITIAL_FEN);
}

#[tokio::test]
async fn test_mutation_persists_envelope() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store.clone()).await;

    assert!(session.apply_move("e2", "e4", None));

    let stored = wait_for_stored(store.as_ref(), |g| g.history.len() == 1).await;
    assert_eq!(stored, session.snapshot());
    assert_eq!(stored.turn, Side::Black);
}

#[tokio::test]
async fn test_roster_change_persists() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store.clone()).await;

    session.upsert_user(User::new("ana", Seat::White));

    let stored = wait_for_stored(store.as_ref(), |g| !g.users.is_empty()).await;
    assert_eq!(stored.users.get("ana").map(|u| u.seat), Some(Seat::White));
}

#[tokio::test]
async fn test_rejected_move_writes_nothing() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store.clone()).await;

    assert!(!session.apply_move("e2", "e5", None));
    session.undo();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(stored_game(store.as_ref()).await, None);
}

#[tokio::test]
async fn test_failed_write_keeps_local_state() {
    let session = open(Arc::new(FailingStore)).await;

    assert!(session.apply_move("e2", "e4", None));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(session.snapshot().history.len(), 1);
}

#[tokio::test]
async fn test_clear_snapshot() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let game = remote_game();
    seed(store.as_ref(), &game).await;
    let session = open(store.clone()).await;

    session.clear_snapshot().await.unwrap();

    assert_eq!(stored_game(store.as_ref()).await, None);
    assert_eq!(session.snapshot(), game);
}

#[tokio::test]
async fn test_sync_overwrites_game_wholesale() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store.clone()).await;
    session.upsert_user(User::new("local", Seat::White));
    wait_for_stored(store.as_ref(), |g| !g.users.is_empty()).await;

    let remote = remote_game();
    seed(store.as_ref(), &remote).await;

    let engine = SyncEngine::new(session.clone());
    assert_eq!(engine.sync().await, SyncOutcome::Applied);
    assert_eq!(session.snapshot(), remote);
}

#[tokio::test]
async fn test_sync_unsupported_version_keeps_local() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store.clone()).await;
    assert!(session.apply_move("e2", "e4", None));
    let local = wait_for_stored(store.as_ref(), |g| g.history.len() == 1).await;

    let mut raw: serde_json::Value =
        serde_json::from_str(&Envelope::encode(&remote_game()).unwrap()).unwrap();
    raw["version"] = serde_json::json!(1);
    store.put(ID, "game-1", raw.to_string()).await.unwrap();

    let engine = SyncEngine::new(session.clone());
    assert_eq!(engine.sync().await, SyncOutcome::UnsupportedVersion(1));
    assert_eq!(session.snapshot(), local);
}

#[tokio::test]
async fn test_sync_malformed_keeps_local() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store.clone()).await;
    let local = session.snapshot();
    store.put(ID, "game-1", "not json".into()).await.unwrap();

    let engine = SyncEngine::new(session.clone());
    assert_eq!(engine.sync().await, SyncOutcome::Malformed);
    assert_eq!(session.snapshot(), local);
}

#[tokio::test]
async fn test_sync_without_snapshot_does_nothing() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store).await;

    let engine = SyncEngine::new(session.clone());
    assert_eq!(engine.sync().await, SyncOutcome::NoSnapshot);
    assert_eq!(session.snapshot(), GameState::default());
}

#[tokio::test]
async fn test_sync_transport_failure_keeps_local() {
    let session = open(Arc::new(FailingStore)).await;
    session.upsert_user(User::new("ana", Seat::Spectator));
    let local = session.snapshot();

    let engine = SyncEngine::new(session.clone());
    assert_eq!(engine.sync().await, SyncOutcome::TransportFailed);
    assert_eq!(session.snapshot(), local);
}

#[tokio::test]
async fn test_last_fetch_wins_over_local_move_during_fetch() {
    let remote = remote_game();
    let inner = MemorySnapshotStore::with_session(ID);
    seed(&inner, &remote).await;

    let (open_gate, gate) = oneshot::channel();
    let store = Arc::new(GatedStore {
        inner,
        gate: Mutex::new(None),
    });
    let session = open(store.clone()).await;
    *store.gate.lock().await = Some(gate);

    let engine = Arc::new(SyncEngine::new(session.clone()));
    let in_flight = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.sync().await })
    };
    tokio::task::yield_now().await;

    // Local move lands while the fetch is still open
    assert_eq!(session.snapshot(), remote);
    assert!(session.apply_move("e2", "e4", None));
    assert_eq!(session.snapshot().history.len(), remote.history.len() + 1);

    open_gate.send(()).unwrap();
    assert_eq!(in_flight.await.unwrap(), SyncOutcome::Applied);

    assert_eq!(session.snapshot(), remote);
}

#[tokio::test]
async fn test_two_clients_converge_through_store() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let alice = open(store.clone()).await;
    let bob = open(store.clone()).await;

    assert!(alice.apply_move("e2", "e4", None));
    alice.upsert_user(User::new("alice", Seat::White));
    wait_for_stored(store.as_ref(), |g| !g.users.is_empty()).await;

    let bob_sync = SyncEngine::new(bob.clone());
    assert_eq!(bob_sync.sync().await, SyncOutcome::Applied);
    assert_eq!(bob.snapshot(), alice.snapshot());

    assert!(bob.apply_move("e7", "e5", None));
    wait_for_stored(store.as_ref(), |g| g.history.len() == 2).await;

    let alice_sync = SyncEngine::new(alice.clone());
    assert_eq!(alice_sync.sync().await, SyncOutcome::Applied);
    assert_eq!(alice.snapshot().turn, Side::White);
    assert_eq!(alice.snapshot().history.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_polling_runs_immediately_and_on_interval() {
    let store = Arc::new(CountingStore {
        inner: MemorySnapshotStore::with_session(ID),
        gets: AtomicUsize::new(0),
    });
    let session = open(store.clone()).await;
    let opened_gets = store.gets.load(Ordering::SeqCst);

    let remote = remote_game();
    seed(store.as_ref(), &remote).await;

    let handle = SyncEngine::new(session.clone()).start(Duration::from_secs(2));
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Immediate first sync
    assert_eq!(store.gets.load(Ordering::SeqCst), opened_gets + 1);
    assert_eq!(session.snapshot(), remote);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(store.gets.load(Ordering::SeqCst), opened_gets + 2);

    handle.shutdown();
    let after_shutdown = store.gets.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(store.gets.load(Ordering::SeqCst), after_shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_polling() {
    let store = Arc::new(CountingStore {
        inner: MemorySnapshotStore::with_session(ID),
        gets: AtomicUsize::new(0),
    });
    let session = open(store.clone()).await;

    let handle = SyncEngine::new(session.clone()).start(Duration::from_secs(2));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(handle.is_running());
    drop(handle);

    let after_drop = store.gets.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(store.gets.load(Ordering::SeqCst), after_drop);
}

#[tokio::test(start_paused = true)]
async fn test_results_after_teardown_are_discarded() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store.clone()).await;

    let handle = SyncEngine::new(session.clone()).start(Duration::from_secs(2));
    tokio::time::sleep(Duration::from_millis(10)).await;
    let engine = Arc::clone(handle.engine());
    assert!(engine.is_live());

    handle.shutdown();
    assert!(!engine.is_live());

    seed(store.as_ref(), &remote_game()).await;
    assert_eq!(engine.sync().await, SyncOutcome::Discarded);
    assert_eq!(session.snapshot(), GameState::default());
}

#[tokio::test(start_paused = true)]
async fn test_manual_trigger_uses_same_routine() {
    let store = Arc::new(MemorySnapshotStore::with_session(ID));
    let session = open(store.clone()).await;

    let handle = SyncEngine::new(session.clone()).start(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.snapshot(), GameState::default());

    let remote = remote_game();
    seed(store.as_ref(), &remote).await;
    assert_eq!(handle.sync().await, SyncOutcome::Applied);
    assert_eq!(session.snapshot(), remote);

    store
        .put(ID, "game-1", r#"{"version":2,"state":null}"#.into())
        .await
        .unwrap();
    assert_eq!(handle.sync().await, SyncOutcome::UnsupportedVersion(2));
    assert_eq!(session.snapshot(), remote);

    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_zero_period_is_clamped() {
    let store = Arc::new(CountingStore {
        inner: MemorySnapshotStore::with_session(ID),
        gets: AtomicUsize::new(0),
    });
    let session = open(store.clone()).await;
    let opened_gets = store.gets.load(Ordering::SeqCst);

    let remote = remote_game();
    seed(store.as_ref(), &remote).await;

    let handle = SyncEngine::new(session.clone()).start(Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Ticks every millisecond instead of panicking or spinning
    assert!(handle.is_running());
    let polled = store.gets.load(Ordering::SeqCst) - opened_gets;
    assert!(polled >= 2, "expected repeated polls, got {}", polled);
    assert!(polled <= 12, "expected at most one poll per millisecond, got {}", polled);
    assert_eq!(session.snapshot(), remote);

    handle.shutdown();
}
