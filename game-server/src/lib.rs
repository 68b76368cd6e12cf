//! Library surface for the game server binary: the manager, engine loop,
//! possibility tracker, module registry, and the axum router that wires a
//! WebSocket upgrade to each. Split out from `main.rs` so integration tests
//! can stand up a real listener against a router built from a test-only
//! module registry.

pub mod engine;
pub mod manager;
pub mod possibility;
pub mod registry;

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use module::ModuleFactory;
use protocol::GameId;

use crate::manager::Manager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<Manager>,
    pub registry: Arc<Vec<Arc<dyn ModuleFactory>>>,
}

/// Builds the `/create/{module_index}` and `/join/{game_id}` routes over
/// the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/create/{module_index}", get(create_handler))
        .route("/join/{game_id}", get(join_handler))
        .with_state(state)
}

/// Upgrades to a WebSocket and hands the connection to the manager as a
/// brand-new game built from the module at `module_index`.
async fn create_handler(
    Path(module_index): Path<usize>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(factory) = state.registry.get(module_index).cloned() else {
        return (StatusCode::NOT_FOUND, "unknown module index").into_response();
    };

    ws.on_upgrade(move |socket| async move {
        state.manager.create(factory, socket).await;
    })
    .into_response()
}

/// Upgrades to a WebSocket and hands the connection to the manager as a
/// joiner of an already-running game.
async fn join_handler(
    Path(game_id): Path<GameId>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        state.manager.join(game_id, socket).await;
    })
    .into_response()
}
