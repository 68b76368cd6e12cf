//! End-to-end scenario tests driving the real axum listener, manager, and
//! engine loop over actual WebSocket connections. The modules under test
//! are small fixtures, not `rummy`: these scenarios exercise the engine's
//! own contract (admission, possibility validation, teardown), independent
//! of any one game's rules.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use module::{Availability, EngMsg, GractBundle, Module, ModMsg, ModuleFactory};
use protocol::{Action, ClientFrame, CollectionDisplay, Gract, PlayerId, Possibility, ServerFrame};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use game_server::manager::Manager;
use game_server::{build_router, AppState};

/// A minimal module: opens joining immediately, closes it and opens
/// starting once two players have joined, hands the host a possibility of
/// every kind on round start, and ends the round as soon as a wild-card
/// action arrives.
struct MockModule {
    players: Vec<PlayerId>,
}

impl MockModule {
    fn new() -> Self {
        MockModule { players: Vec::new() }
    }
}

impl Module for MockModule {
    fn process_msg(&mut self, msg: EngMsg) -> ModMsg {
        match msg {
            EngMsg::Init => ModMsg::ChangeState {
                join_mode: Availability::Open,
                start_mode: Availability::Closed("2 players required".to_string()),
            },
            EngMsg::PlayerJoin { player_id, .. } => {
                self.players.push(player_id);
                if self.players.len() >= 2 {
                    ModMsg::ChangeState {
                        join_mode: Availability::Closed("2 players max".to_string()),
                        start_mode: Availability::Open,
                    }
                } else {
                    ModMsg::Empty
                }
            }
            EngMsg::PlayerLeave { .. } => ModMsg::EndGame {
                reason: "player left".to_string(),
            },
            EngMsg::StartRound => {
                let mut bundle = GractBundle::new(self.players.iter().copied());
                for id in 0i64..3i64 {
                    bundle.broadcast(Gract::ShowType {
                        type_id: id,
                        name: format!("type-{id}"),
                        description: String::new(),
                        image_url: String::new(),
                    });
                }
                for id in 0i64..3i64 {
                    bundle.broadcast(Gract::ShowCollection {
                        collection_id: id,
                        anchor_player_id: None,
                        display: CollectionDisplay::Stack,
                    });
                }
                for id in 0i64..3i64 {
                    bundle.broadcast(Gract::ShowCard {
                        card_id: id,
                        type_id: id,
                        collection_id: id,
                    });
                }
                if let Some(&host) = self.players.first() {
                    bundle.send(
                        host,
                        Gract::PossibleActions {
                            possibilities: vec![
                                Possibility::Next,
                                Possibility::SelectCard { card_ids: vec![0, 1, 2] },
                                Possibility::SelectCollection { collection_ids: vec![0, 1, 2] },
                                Possibility::AgainstCard {
                                    select_card_id: 0,
                                    against_card_ids: vec![1, 2],
                                },
                                Possibility::WildCard {
                                    card_id: 2,
                                    type_ids: vec![2],
                                },
                            ],
                        },
                    );
                }
                ModMsg::Gract(bundle)
            }
            EngMsg::EndRound => ModMsg::Empty,
            EngMsg::PlayerAction { action, .. } => match action {
                Action::Wild { .. } => ModMsg::EndRound {
                    reason: "wild played".to_string(),
                },
                _ => ModMsg::Empty,
            },
        }
    }
}

struct MockFactory;

impl ModuleFactory for MockFactory {
    fn name(&self) -> &str {
        "mock"
    }

    fn create(&self) -> Box<dyn Module> {
        Box::new(MockModule::new())
    }
}

/// A module whose round-start gract list carries two `possible-actions`
/// replacements for the host; only the later one should stick.
struct DoublePossibilityModule {
    players: Vec<PlayerId>,
}

impl Module for DoublePossibilityModule {
    fn process_msg(&mut self, msg: EngMsg) -> ModMsg {
        match msg {
            EngMsg::Init => ModMsg::ChangeState {
                join_mode: Availability::Open,
                start_mode: Availability::Open,
            },
            EngMsg::PlayerJoin { player_id, .. } => {
                self.players.push(player_id);
                ModMsg::Empty
            }
            EngMsg::PlayerLeave { .. } => ModMsg::EndGame {
                reason: "player left".to_string(),
            },
            EngMsg::StartRound => {
                let mut bundle = GractBundle::new(self.players.iter().copied());
                if let Some(&host) = self.players.first() {
                    bundle.send(
                        host,
                        Gract::PossibleActions {
                            possibilities: vec![Possibility::SelectCard { card_ids: vec![1] }],
                        },
                    );
                    bundle.send(
                        host,
                        Gract::PossibleActions {
                            possibilities: vec![Possibility::SelectCard { card_ids: vec![2] }],
                        },
                    );
                }
                ModMsg::Gract(bundle)
            }
            EngMsg::EndRound => ModMsg::Empty,
            EngMsg::PlayerAction { .. } => ModMsg::Empty,
        }
    }
}

struct DoublePossibilityFactory;

impl ModuleFactory for DoublePossibilityFactory {
    fn name(&self) -> &str {
        "double-possibility"
    }

    fn create(&self) -> Box<dyn Module> {
        Box::new(DoublePossibilityModule { players: Vec::new() })
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(factories: Vec<Arc<dyn ModuleFactory>>) -> String {
    let state = AppState {
        manager: Manager::new(),
        registry: Arc::new(factories),
    };
    let app = build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("ws://{addr}")
}

async fn connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.expect("connect");
    stream
}

async fn send_frame(ws: &mut WsStream, frame: &ClientFrame) {
    let text = serde_json::to_string(frame).expect("encode client frame");
    ws.send(Message::Text(text.into())).await.expect("send");
}

async fn recv_frame(ws: &mut WsStream) -> ServerFrame {
    loop {
        match ws.next().await.expect("stream ended early").expect("websocket error") {
            Message::Text(text) => return serde_json::from_str(&text).expect("decode server frame"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message while waiting for a frame: {other:?}"),
        }
    }
}

async fn expect_closed(ws: &mut WsStream) {
    match ws.next().await {
        Some(Ok(Message::Close(_))) | None => {}
        other => panic!("expected the connection to close, got {other:?}"),
    }
}

#[tokio::test]
async fn s1_happy_two_player_round() {
    let url = spawn_server(vec![Arc::new(MockFactory)]).await;

    let mut host = connect(&format!("{url}/create/0")).await;
    send_frame(&mut host, &ClientFrame::Intro { player_name: "zachary".to_string() }).await;
    let ServerFrame::Intro { game_id, player_id } = recv_frame(&mut host).await else {
        panic!("expected an intro frame");
    };
    assert_eq!(player_id, 0);

    let mut joiner = connect(&format!("{url}/join/{game_id}")).await;
    send_frame(&mut joiner, &ClientFrame::Intro { player_name: "jed".to_string() }).await;
    let ServerFrame::Intro { player_id: joiner_id, .. } = recv_frame(&mut joiner).await else {
        panic!("expected an intro frame");
    };
    assert_eq!(joiner_id, 1);

    send_frame(&mut host, &ClientFrame::StartRound).await;

    let ServerFrame::GractList { gract_list: host_gracts } = recv_frame(&mut host).await else {
        panic!("expected a gract list");
    };
    let ServerFrame::GractList { gract_list: joiner_gracts } = recv_frame(&mut joiner).await else {
        panic!("expected a gract list");
    };

    for gracts in [&host_gracts, &joiner_gracts] {
        assert_eq!(gracts.iter().filter(|g| matches!(g, Gract::ShowType { .. })).count(), 3);
        assert_eq!(gracts.iter().filter(|g| matches!(g, Gract::ShowCollection { .. })).count(), 3);
        assert_eq!(gracts.iter().filter(|g| matches!(g, Gract::ShowCard { .. })).count(), 3);
    }
    let possibilities = host_gracts
        .iter()
        .find_map(|g| match g {
            Gract::PossibleActions { possibilities } => Some(possibilities.clone()),
            _ => None,
        })
        .expect("host receives a possible-actions gract");
    assert_eq!(possibilities.len(), 5);
    assert!(joiner_gracts.iter().all(|g| !matches!(g, Gract::PossibleActions { .. })));

    let actions = [
        Action::Next,
        Action::Select { card_id: 1 },
        Action::SelectColl { coll_id: 1 },
        Action::Against { select_card_id: 0, against_card_id: 1 },
        Action::Wild { card_id: 2, type_id: 2 },
    ];
    for action in actions {
        send_frame(&mut host, &ClientFrame::Action { action }).await;
    }

    let expected_end = ServerFrame::EndRound { reason: "wild played".to_string() };
    assert_eq!(recv_frame(&mut host).await, expected_end);
    assert_eq!(recv_frame(&mut joiner).await, expected_end);
}

#[tokio::test]
async fn s2_player_leave_terminates_game() {
    let url = spawn_server(vec![Arc::new(MockFactory)]).await;

    let mut host = connect(&format!("{url}/create/0")).await;
    send_frame(&mut host, &ClientFrame::Intro { player_name: "zachary".to_string() }).await;
    let ServerFrame::Intro { game_id, .. } = recv_frame(&mut host).await else {
        panic!("expected an intro frame");
    };

    let mut joiner = connect(&format!("{url}/join/{game_id}")).await;
    send_frame(&mut joiner, &ClientFrame::Intro { player_name: "jed".to_string() }).await;
    recv_frame(&mut joiner).await;

    host.close().await.expect("close host connection");

    assert_eq!(
        recv_frame(&mut joiner).await,
        ServerFrame::EndGame { reason: "player left".to_string() }
    );
    expect_closed(&mut joiner).await;

    // Give the engine's teardown a moment to deregister with the manager
    // before the next join attempt races it.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut retry = connect(&format!("{url}/join/{game_id}")).await;
    assert_eq!(
        recv_frame(&mut retry).await,
        ServerFrame::Error { reason: "game does not exist".to_string() }
    );
}

#[tokio::test]
async fn s3_rejected_join_at_capacity() {
    let url = spawn_server(vec![Arc::new(MockFactory)]).await;

    let mut host = connect(&format!("{url}/create/0")).await;
    send_frame(&mut host, &ClientFrame::Intro { player_name: "a".to_string() }).await;
    let ServerFrame::Intro { game_id, .. } = recv_frame(&mut host).await else {
        panic!("expected an intro frame");
    };

    let mut second = connect(&format!("{url}/join/{game_id}")).await;
    send_frame(&mut second, &ClientFrame::Intro { player_name: "b".to_string() }).await;
    recv_frame(&mut second).await;

    let mut third = connect(&format!("{url}/join/{game_id}")).await;
    send_frame(&mut third, &ClientFrame::Intro { player_name: "c".to_string() }).await;
    assert_eq!(
        recv_frame(&mut third).await,
        ServerFrame::Error { reason: "2 players max".to_string() }
    );
    expect_closed(&mut third).await;
}

#[tokio::test]
async fn s4_invalid_action_disconnects_the_player() {
    let url = spawn_server(vec![Arc::new(MockFactory)]).await;

    let mut host = connect(&format!("{url}/create/0")).await;
    send_frame(&mut host, &ClientFrame::Intro { player_name: "zachary".to_string() }).await;
    let ServerFrame::Intro { game_id, .. } = recv_frame(&mut host).await else {
        panic!("expected an intro frame");
    };

    let mut joiner = connect(&format!("{url}/join/{game_id}")).await;
    send_frame(&mut joiner, &ClientFrame::Intro { player_name: "jed".to_string() }).await;
    recv_frame(&mut joiner).await;

    send_frame(&mut host, &ClientFrame::StartRound).await;
    recv_frame(&mut host).await;
    recv_frame(&mut joiner).await;

    send_frame(
        &mut host,
        &ClientFrame::Action { action: Action::Select { card_id: 9999 } },
    )
    .await;

    assert_eq!(
        recv_frame(&mut host).await,
        ServerFrame::Error { reason: "invalid action".to_string() }
    );
    expect_closed(&mut host).await;

    assert_eq!(
        recv_frame(&mut joiner).await,
        ServerFrame::EndGame { reason: "player left".to_string() }
    );
}

#[tokio::test]
async fn s5_start_before_quorum() {
    let url = spawn_server(vec![Arc::new(MockFactory)]).await;

    let mut host = connect(&format!("{url}/create/0")).await;
    send_frame(&mut host, &ClientFrame::Intro { player_name: "zachary".to_string() }).await;
    recv_frame(&mut host).await;

    send_frame(&mut host, &ClientFrame::StartRound).await;
    assert_eq!(
        recv_frame(&mut host).await,
        ServerFrame::Error { reason: "2 players required".to_string() }
    );
}

#[tokio::test]
async fn s6_possibility_set_replaced() {
    let url = spawn_server(vec![Arc::new(DoublePossibilityFactory)]).await;

    let mut host = connect(&format!("{url}/create/0")).await;
    send_frame(&mut host, &ClientFrame::Intro { player_name: "zachary".to_string() }).await;
    let ServerFrame::Intro { game_id, .. } = recv_frame(&mut host).await else {
        panic!("expected an intro frame");
    };

    let mut joiner = connect(&format!("{url}/join/{game_id}")).await;
    send_frame(&mut joiner, &ClientFrame::Intro { player_name: "jed".to_string() }).await;
    recv_frame(&mut joiner).await;

    send_frame(&mut host, &ClientFrame::StartRound).await;
    recv_frame(&mut host).await;

    send_frame(
        &mut host,
        &ClientFrame::Action { action: Action::Select { card_id: 1 } },
    )
    .await;
    assert_eq!(
        recv_frame(&mut host).await,
        ServerFrame::Error { reason: "invalid action".to_string() }
    );
}
