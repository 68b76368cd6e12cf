//! The manager (C6): process-wide registry of active games, reachable only
//! through an opaque game id. Creation and joining are the only operations;
//! an engine removes its own entry when it tears itself down.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::SinkExt;
use module::ModuleFactory;
use protocol::{GameId, ServerFrame};
use tokio::sync::{mpsc, Mutex};

use crate::engine;

struct ManagerInner {
    next_game_id: GameId,
    games: HashMap<GameId, mpsc::Sender<WebSocket>>,
}

/// Owns the set of running engines. Cheap to clone (wraps an `Arc`
/// internally via [`Manager::new`] returning one); engines hold a clone to
/// deregister themselves on exit rather than holding a reference back to
/// whatever created them, avoiding a reference cycle.
pub struct Manager {
    inner: Mutex<ManagerInner>,
}

impl Manager {
    pub fn new() -> Arc<Self> {
        Arc::new(Manager {
            inner: Mutex::new(ManagerInner {
                next_game_id: 0,
                games: HashMap::new(),
            }),
        })
    }

    /// Assigns a new game id, spawns its engine, and hands it the first
    /// connection as its initial joiner.
    pub async fn create(self: &Arc<Self>, factory: Arc<dyn ModuleFactory>, connection: WebSocket) -> GameId {
        let (join_tx, join_rx) = mpsc::channel(32);

        let id = {
            let mut inner = self.inner.lock().await;
            let id = inner.next_game_id;
            inner.next_game_id += 1;
            inner.games.insert(id, join_tx.clone());
            id
        };

        let _ = join_tx.send(connection).await;

        let module = factory.create();
        let manager = Arc::clone(self);
        tracing::info!(game_id = id, module = factory.name(), "game created");
        tokio::spawn(async move {
            engine::run(id, module, join_rx, manager).await;
        });

        id
    }

    /// Routes a connection to an already-running game, or rejects it if the
    /// id is unknown.
    pub async fn join(&self, id: GameId, mut connection: WebSocket) {
        let sender = {
            let inner = self.inner.lock().await;
            inner.games.get(&id).cloned()
        };

        match sender {
            Some(sender) => {
                let _ = sender.send(connection).await;
            }
            None => {
                tracing::warn!(game_id = id, "join requested for unknown game");
                let reason = "game does not exist".to_string();
                let text = protocol::encode_server_frame(&ServerFrame::Error { reason });
                let _ = connection.send(Message::Text(text.into())).await;
                let _ = connection.close().await;
            }
        }
    }

    /// Called by an engine as the last step of its own teardown.
    pub async fn remove(&self, id: GameId) {
        let mut inner = self.inner.lock().await;
        if inner.games.remove(&id).is_some() {
            tracing::info!(game_id = id, "game removed");
        }
    }
}
