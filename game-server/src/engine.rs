//! The engine loop (C5): one task per running game.
//!
//! # Scheduling
//!
//! A connection, whether still pending admission or already an admitted
//! player, is served for its entire lifetime by one reader task spawned in
//! [`accept_connection`]. Every reader task forwards decoded frames and
//! disconnects onto a single `mpsc` channel owned by the engine; the
//! engine's multi-way wait is a [`tokio::select!`] between that channel and
//! the manager's join-notification channel. This sidesteps rebuilding an
//! ad-hoc wait set every iteration: a new connection just spawns another
//! producer onto the same channel.
//!
//! # Batching
//!
//! Once woken, the engine drains every already-ready event with
//! `try_recv` before processing any of them, then applies the whole batch
//! sequentially. Message N of a batch is processed under the state left by
//! message N-1, not the state observed when the batch was collected — this
//! is what lets a join that arrives right after a lobby-opening message see
//! the game as open.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use module::{Availability, EngMsg, Module, ModMsg};
use protocol::{Action, ClientFrame, GameId, Gract, PlayerId, ServerFrame};
use tokio::sync::mpsc;

use crate::manager::Manager;
use crate::possibility::PossibilityTracker;

type ConnId = u64;
type Sink = SplitSink<WebSocket, Message>;

enum ConnRole {
    Pending,
    Player(PlayerId),
}

struct PendingRecord {
    sink: Sink,
}

struct PlayerRecord {
    name: String,
    sink: Sink,
    possibilities: PossibilityTracker,
}

enum EngineEvent {
    Frame(ConnId, ClientFrame),
    Disconnected(ConnId),
    ProtocolError(ConnId),
}

struct Engine {
    id: GameId,
    module: Box<dyn Module>,
    manager: Arc<Manager>,

    join_mode: Availability,
    start_mode: Availability,
    round_active: bool,
    terminated: bool,

    next_player_id: PlayerId,
    next_conn_id: ConnId,

    conn_roles: HashMap<ConnId, ConnRole>,
    pending: HashMap<ConnId, PendingRecord>,
    players: HashMap<PlayerId, PlayerRecord>,
}

/// Runs one game to completion. Returns once the game has torn itself down
/// and deregistered from the manager.
pub async fn run(
    id: GameId,
    module: Box<dyn Module>,
    mut join_rx: mpsc::Receiver<WebSocket>,
    manager: Arc<Manager>,
) {
    let mut engine = Engine {
        id,
        module,
        manager: Arc::clone(&manager),
        join_mode: Availability::Closed("not initialized".to_string()),
        start_mode: Availability::Closed("not initialized".to_string()),
        round_active: false,
        terminated: false,
        next_player_id: 0,
        next_conn_id: 0,
        conn_roles: HashMap::new(),
        pending: HashMap::new(),
        players: HashMap::new(),
    };

    match engine.module.process_msg(EngMsg::Init) {
        ModMsg::ChangeState { join_mode, start_mode } => {
            engine.join_mode = join_mode;
            engine.start_mode = start_mode;
        }
        _ => {
            tracing::error!(game_id = id, "module did not return change-state from init probe");
            manager.remove(id).await;
            return;
        }
    }

    if !engine.join_mode.is_open() {
        tracing::error!(game_id = id, "module refused to open joining from the init probe");
        manager.remove(id).await;
        return;
    }

    let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(256);
    let mut join_open = true;

    loop {
        tokio::select! {
            maybe_conn = async {
                if join_open { join_rx.recv().await } else { std::future::pending().await }
            } => {
                match maybe_conn {
                    Some(conn) => engine.accept_connection(conn, event_tx.clone()),
                    None => join_open = false,
                }
            }
            maybe_event = event_rx.recv() => {
                let Some(first) = maybe_event else { break };
                let mut batch = vec![first];
                while let Ok(ev) = event_rx.try_recv() {
                    batch.push(ev);
                }
                engine.process_batch(batch).await;
                if engine.terminated {
                    break;
                }
            }
        }
    }

    manager.remove(id).await;
}

impl Engine {
    fn accept_connection(&mut self, conn: WebSocket, event_tx: mpsc::Sender<EngineEvent>) {
        let conn_id = self.next_conn_id;
        self.next_conn_id += 1;

        let (sink, stream) = conn.split();
        self.pending.insert(conn_id, PendingRecord { sink });
        self.conn_roles.insert(conn_id, ConnRole::Pending);

        tokio::spawn(connection_reader(conn_id, stream, event_tx));
    }

    async fn process_batch(&mut self, batch: Vec<EngineEvent>) {
        for event in batch {
            if self.terminated {
                break;
            }
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Frame(conn_id, frame) => self.handle_frame(conn_id, frame).await,
            EngineEvent::Disconnected(conn_id) => self.handle_disconnected(conn_id).await,
            EngineEvent::ProtocolError(conn_id) => self.handle_protocol_error(conn_id).await,
        }
    }

    async fn handle_frame(&mut self, conn_id: ConnId, frame: ClientFrame) {
        match self.conn_roles.get(&conn_id) {
            Some(ConnRole::Pending) => match frame {
                ClientFrame::Intro { player_name } => self.handle_join(conn_id, player_name).await,
                _ => self.handle_protocol_error(conn_id).await,
            },
            Some(ConnRole::Player(player_id)) => {
                let player_id = *player_id;
                match frame {
                    ClientFrame::StartRound => self.handle_start_round(player_id).await,
                    ClientFrame::Action { action } => self.handle_player_action(player_id, action).await,
                    ClientFrame::Intro { .. } => self.handle_protocol_error(conn_id).await,
                }
            }
            None => {}
        }
    }

    async fn handle_join(&mut self, conn_id: ConnId, name: String) {
        let Some(pending) = self.pending.remove(&conn_id) else {
            return;
        };
        let mut sink = pending.sink;

        match self.join_mode.clone() {
            Availability::Open => {
                let player_id = self.next_player_id;
                self.next_player_id += 1;

                send_frame(&mut sink, &ServerFrame::Intro { game_id: self.id, player_id }).await;

                self.players.insert(
                    player_id,
                    PlayerRecord {
                        name: name.clone(),
                        sink,
                        possibilities: PossibilityTracker::default(),
                    },
                );
                self.conn_roles.insert(conn_id, ConnRole::Player(player_id));

                let response = self.module.process_msg(EngMsg::PlayerJoin { player_id, name });
                self.apply_mod_msg(response).await;
            }
            Availability::Closed(reason) => {
                send_frame(&mut sink, &ServerFrame::Error { reason }).await;
                let _ = sink.close().await;
                self.conn_roles.remove(&conn_id);
            }
        }
    }

    async fn handle_disconnected(&mut self, conn_id: ConnId) {
        match self.conn_roles.remove(&conn_id) {
            Some(ConnRole::Pending) => {
                self.pending.remove(&conn_id);
            }
            Some(ConnRole::Player(player_id)) => self.handle_player_leave(player_id).await,
            None => {}
        }
    }

    async fn handle_protocol_error(&mut self, conn_id: ConnId) {
        match self.conn_roles.remove(&conn_id) {
            Some(ConnRole::Pending) => {
                if let Some(mut pending) = self.pending.remove(&conn_id) {
                    let _ = pending.sink.close().await;
                }
            }
            Some(ConnRole::Player(player_id)) => {
                if let Some(mut player) = self.players.remove(&player_id) {
                    let _ = player.sink.close().await;
                }
                self.handle_player_leave(player_id).await;
            }
            None => {}
        }
    }

    async fn handle_player_leave(&mut self, player_id: PlayerId) {
        if self.players.remove(&player_id).is_none() {
            return;
        }

        if self.players.is_empty() {
            self.teardown().await;
            return;
        }

        let response = self.module.process_msg(EngMsg::PlayerLeave { player_id });
        self.apply_mod_msg(response).await;
    }

    async fn handle_start_round(&mut self, player_id: PlayerId) {
        if self.round_active {
            // Open question in the source this was ported from: the
            // closed-mode reason must not be reused here, since start_mode
            // may well be Open while a round is already in progress.
            self.send_error(player_id, "round already active").await;
            return;
        }

        if let Availability::Closed(reason) = self.start_mode.clone() {
            self.send_error(player_id, reason).await;
            return;
        }

        self.round_active = true;
        let response = self.module.process_msg(EngMsg::StartRound);
        self.apply_mod_msg(response).await;
    }

    async fn handle_player_action(&mut self, player_id: PlayerId, action: Action) {
        let Some(player) = self.players.get(&player_id) else {
            return;
        };

        if player.possibilities.validate(&action) {
            let response = self.module.process_msg(EngMsg::PlayerAction { player_id, action });
            self.apply_mod_msg(response).await;
        } else {
            self.send_error(player_id, "invalid action").await;
            // Do not call the module and do not remove the player here: the
            // connection's reader task will observe the close and report a
            // disconnect, which is handled as an ordinary player-leave.
            if let Some(player) = self.players.get_mut(&player_id) {
                let _ = player.sink.close().await;
            }
        }
    }

    async fn apply_mod_msg(&mut self, msg: ModMsg) {
        match msg {
            ModMsg::Empty => {}
            ModMsg::ChangeState { join_mode, start_mode } => {
                self.join_mode = join_mode;
                self.start_mode = start_mode;
            }
            ModMsg::Gract(bundle) => self.apply_gract_bundle(bundle).await,
            ModMsg::EndRound { reason } => {
                self.round_active = false;
                self.broadcast_all(&ServerFrame::EndRound { reason }).await;
            }
            ModMsg::EndGame { reason } => {
                self.broadcast_all(&ServerFrame::EndGame { reason }).await;
                self.teardown().await;
            }
        }
    }

    async fn apply_gract_bundle(&mut self, bundle: module::GractBundle) {
        for (player_id, gracts) in bundle.into_lists() {
            if gracts.is_empty() {
                continue;
            }

            // A gract-list may carry more than one `possible-actions`
            // replacement for the same player; the last one wins.
            let last_possibilities = gracts.iter().rev().find_map(|g| match g {
                Gract::PossibleActions { possibilities } => Some(possibilities.clone()),
                _ => None,
            });

            // Players who departed earlier in this same batch are silently
            // dropped rather than treated as an error.
            let Some(player) = self.players.get_mut(&player_id) else {
                continue;
            };

            if let Some(possibilities) = last_possibilities {
                player.possibilities.replace(possibilities);
            }

            send_frame(&mut player.sink, &ServerFrame::GractList { gract_list: gracts }).await;
        }
    }

    async fn send_error(&mut self, player_id: PlayerId, reason: String) {
        if let Some(player) = self.players.get_mut(&player_id) {
            send_frame(&mut player.sink, &ServerFrame::Error { reason }).await;
        }
    }

    async fn broadcast_all(&mut self, frame: &ServerFrame) {
        for player in self.players.values_mut() {
            send_frame(&mut player.sink, frame).await;
        }
    }

    /// Closes every admitted player's connection and marks the engine done;
    /// the run loop exits and the manager removes this game on the next
    /// tick. Pending (not-yet-admitted) connections are dropped rather than
    /// explicitly closed: the transport layer closes them on its own the
    /// next time it attempts I/O against the dropped sink.
    async fn teardown(&mut self) {
        self.terminated = true;
        self.pending.clear();
        for (_, mut player) in self.players.drain() {
            let _ = player.sink.close().await;
        }
        self.conn_roles.clear();
    }
}

async fn send_frame(sink: &mut Sink, frame: &ServerFrame) {
    let text = protocol::encode_server_frame(frame);
    if let Err(err) = sink.send(Message::Text(text.into())).await {
        tracing::warn!(%err, "failed to deliver frame; assuming the peer disconnected");
    }
}

/// Owns the read half of one connection for its entire lifetime, whether
/// pending admission or already an admitted player. Forwards decoded
/// frames and terminal conditions onto the engine's shared event channel.
async fn connection_reader(conn_id: ConnId, mut stream: SplitStream<WebSocket>, tx: mpsc::Sender<EngineEvent>) {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match protocol::decode_client_frame(&text) {
                Ok(frame) => {
                    if tx.send(EngineEvent::Frame(conn_id, frame)).await.is_err() {
                        return;
                    }
                }
                Err(_) => {
                    let _ = tx.send(EngineEvent::ProtocolError(conn_id)).await;
                    return;
                }
            },
            Some(Ok(Message::Close(_))) | None => {
                let _ = tx.send(EngineEvent::Disconnected(conn_id)).await;
                return;
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Binary(_))) => {
                let _ = tx.send(EngineEvent::ProtocolError(conn_id)).await;
                return;
            }
            Some(Err(_)) => {
                let _ = tx.send(EngineEvent::Disconnected(conn_id)).await;
                return;
            }
        }
    }
}
