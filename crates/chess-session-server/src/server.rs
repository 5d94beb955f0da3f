//! HTTP routes and server state.

use crate::error::ApiError;
use crate::protocol::{NameQuery, PutStateRequest, SessionCreated, StateResponse, SuccessResponse};
use crate::session::SessionData;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Server state shared across all requests.
pub struct ServerState {
    /// All sessions by id
    pub sessions: DashMap<u64, SessionData>,
    next_id: AtomicU64,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a new empty session and return its id
    pub fn create_session(&self) -> u64 {
        self.open_session().id
    }

    /// Allocate a new empty session and describe it
    pub fn open_session(&self) -> SessionCreated {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = SessionData::new(id);
        let created = SessionCreated {
            id,
            created_at: session.created_at,
        };
        self.sessions.insert(id, session);
        created
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the router.
///
/// - `POST /session` -- create a session
/// - `GET /session/{id}?name=` -- read a stored value
/// - `POST /session/{id}` -- store `{name, state}`
/// - `DELETE /session/{id}?name=` -- remove a stored value
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/session", post(create_session))
        .route(
            "/session/{id}",
            get(get_state).post(put_state).delete(delete_state),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Bind `addr` and serve until the process exits.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Snapshot server listening on {}", addr);
    serve(listener, state).await
}

/// Ids that do not parse cannot name a session
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

fn required_name(query: NameQuery) -> Result<String, ApiError> {
    query
        .name
        .filter(|name| !name.is_empty())
        .ok_or(ApiError::MissingName)
}

async fn create_session(State(state): State<Arc<ServerState>>) -> Json<SessionCreated> {
    let created = state.open_session();
    info!("Created session {}", created.id);
    Json(created)
}

async fn get_state(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Query(query): Query<NameQuery>,
) -> Result<Json<StateResponse>, ApiError> {
    let name = required_name(query)?;
    let id = parse_id(&id)?;

    let session = state.sessions.get(&id).ok_or(ApiError::NotFound)?;
    let stored = session
        .get(&name)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(Json(StateResponse { state: stored }))
}

async fn put_state(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    body: Result<Json<PutStateRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = body.map_err(|e| ApiError::internal("Failed to save game state", e))?;

    let mut session = state.sessions.get_mut(&id).ok_or(ApiError::NotFound)?;
    debug!("Session {}: storing {} ({} bytes)", id, request.name, request.state.len());
    session.put(request.name, request.state);

    Ok(Json(SuccessResponse::ok()))
}

async fn delete_state(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Query(query): Query<NameQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let name = required_name(query)?;
    let id = parse_id(&id)?;

    let mut session = state.sessions.get_mut(&id).ok_or(ApiError::NotFound)?;
    if session.remove(&name) {
        debug!("Session {}: removed {}", id, name);
    }

    Ok(Json(SuccessResponse::ok()))
}
