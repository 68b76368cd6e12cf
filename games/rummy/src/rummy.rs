//! A four-player-capable rummy variant: draw from the stock or discard
//! pile, then discard; first player to empty their hand into complete sets
//! and runs wins the round.

use std::collections::BTreeMap;

use module::{Availability, EngMsg, GractBundle, Module, ModMsg, ModuleFactory};
use protocol::{Action, CardId, CollectionDisplay, CollectionId, Gract, PlayerId, Possibility};
use rand::seq::SliceRandom;

use crate::deck::build_deck;
use crate::hand::is_winning_hand;

struct PlayerHand {
    name: String,
    cards: Vec<CardId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// The current player must draw from the stock (`-1`) or discard
    /// (`-2`) pile.
    Draw,
    /// The current player must discard one card from their hand.
    Discard,
}

/// One running game of rummy. Player ids are tracked in a `BTreeMap` so
/// that iteration order matches join order: ids are assigned by the engine
/// as a monotonically increasing counter, so ascending id order and
/// original join order coincide even after a player leaves mid-game.
pub struct RummyModule {
    card_types: Vec<Gract>,
    deck: Vec<CardId>,
    players: BTreeMap<PlayerId, PlayerHand>,
    central_stack: Vec<CardId>,
    discard_stack: Vec<CardId>,
    turn_order: Vec<PlayerId>,
    turn_idx: usize,
    stage: Stage,
}

impl RummyModule {
    fn new() -> Self {
        let (card_types, deck) = build_deck();
        RummyModule {
            card_types,
            deck,
            players: BTreeMap::new(),
            central_stack: Vec::new(),
            discard_stack: Vec::new(),
            turn_order: Vec::new(),
            turn_idx: 0,
            stage: Stage::Draw,
        }
    }

    fn on_player_join(&mut self, player_id: PlayerId, name: String) -> ModMsg {
        self.players.insert(
            player_id,
            PlayerHand {
                name,
                cards: Vec::new(),
            },
        );

        match self.players.len() {
            n if n >= 4 => ModMsg::ChangeState {
                join_mode: Availability::Closed("No more than 4 players".to_string()),
                start_mode: Availability::Open,
            },
            n if n >= 2 => ModMsg::ChangeState {
                join_mode: Availability::Open,
                start_mode: Availability::Open,
            },
            _ => ModMsg::Empty,
        }
    }

    fn on_player_leave(&self, player_id: PlayerId) -> ModMsg {
        let name = self
            .players
            .get(&player_id)
            .map(|p| p.name.as_str())
            .unwrap_or("a player");
        ModMsg::EndGame {
            reason: format!("player {name} left!"),
        }
    }

    fn on_start_round(&mut self) -> ModMsg {
        let mut bundle = GractBundle::new(self.players.keys().copied());

        for gract in &self.card_types {
            bundle.broadcast(gract.clone());
        }
        bundle.broadcast(Gract::ShowCollection {
            collection_id: -1,
            anchor_player_id: None,
            display: CollectionDisplay::Stack,
        });
        bundle.broadcast(Gract::ShowCollection {
            collection_id: -2,
            anchor_player_id: None,
            display: CollectionDisplay::Stack,
        });

        let mut shuffled = self.deck.clone();
        shuffled.shuffle(&mut rand::thread_rng());

        for (&player_id, hand) in self.players.iter_mut() {
            bundle.broadcast(Gract::ShowCollection {
                collection_id: player_id as CollectionId,
                anchor_player_id: Some(player_id),
                display: CollectionDisplay::Hand,
            });
            hand.cards = shuffled.drain(0..7).collect();
        }

        self.discard_stack = vec![shuffled.pop().expect("deck has cards left after dealing")];
        self.central_stack = shuffled;

        if let Some(&top) = self.central_stack.last() {
            bundle.broadcast(Gract::ShowCard {
                card_id: top,
                type_id: 0,
                collection_id: -1,
            });
        }
        if let Some(&top) = self.discard_stack.last() {
            bundle.broadcast(Gract::ShowCard {
                card_id: top,
                type_id: top,
                collection_id: -2,
            });
        }

        for (&player_id, hand) in self.players.iter() {
            for &card in &hand.cards {
                bundle.send(
                    player_id,
                    Gract::ShowCard {
                        card_id: card,
                        type_id: card,
                        collection_id: player_id as CollectionId,
                    },
                );
                bundle.broadcast_except(
                    player_id,
                    Gract::ShowCard {
                        card_id: card,
                        type_id: 0,
                        collection_id: player_id as CollectionId,
                    },
                );
            }
        }

        self.turn_order = self.players.keys().copied().collect();
        self.turn_idx = 0;
        self.stage = Stage::Draw;

        let current_player = self.turn_order[self.turn_idx];
        bundle.send(
            current_player,
            Gract::PossibleActions {
                possibilities: vec![Possibility::SelectCollection {
                    collection_ids: vec![-1, -2],
                }],
            },
        );

        ModMsg::Gract(bundle)
    }

    fn on_player_action(&mut self, player_id: PlayerId, action: Action) -> ModMsg {
        let current_player = self.turn_order[self.turn_idx];
        if current_player != player_id {
            // The engine only forwards actions that matched the acting
            // player's own possibilities, so this can't happen in practice.
            return ModMsg::Empty;
        }

        match self.stage {
            Stage::Draw => self.draw_stage(current_player, action),
            Stage::Discard => self.discard_stage(current_player, action),
        }
    }

    fn draw_stage(&mut self, current_player: PlayerId, action: Action) -> ModMsg {
        let Action::SelectColl { coll_id } = action else {
            return ModMsg::Empty;
        };

        let mut bundle = GractBundle::new(self.players.keys().copied());

        let card_id = if coll_id == -1 {
            let card = self
                .central_stack
                .pop()
                .expect("stock pile was offered as a possibility, so it isn't empty");
            if let Some(&new_top) = self.central_stack.last() {
                bundle.broadcast(Gract::ShowCard {
                    card_id: new_top,
                    type_id: 0,
                    collection_id: -1,
                });
            }
            card
        } else {
            self.discard_stack
                .pop()
                .expect("discard pile was offered as a possibility, so it isn't empty")
        };

        let hand = self
            .players
            .get_mut(&current_player)
            .expect("the current player is always tracked");
        hand.cards.push(card_id);
        let cards = hand.cards.clone();

        bundle.broadcast(Gract::MoveCard {
            card_id,
            collection_id: current_player as CollectionId,
        });
        bundle.send(
            current_player,
            Gract::RevealCard {
                old_card_id: card_id,
                new_card_id: card_id,
                new_type_id: card_id,
            },
        );
        bundle.send(
            current_player,
            Gract::PossibleActions {
                possibilities: vec![Possibility::SelectCard { card_ids: cards }],
            },
        );

        self.stage = Stage::Discard;
        ModMsg::Gract(bundle)
    }

    fn discard_stage(&mut self, current_player: PlayerId, action: Action) -> ModMsg {
        let Action::Select { card_id } = action else {
            return ModMsg::Empty;
        };

        let (won, winner_name) = {
            let hand = self
                .players
                .get_mut(&current_player)
                .expect("the current player is always tracked");
            hand.cards.retain(|&c| c != card_id);
            (is_winning_hand(&hand.cards), hand.name.clone())
        };

        if won {
            self.central_stack.clear();
            self.discard_stack.clear();
            for hand in self.players.values_mut() {
                hand.cards.clear();
            }
            return ModMsg::EndRound {
                reason: format!("Player {winner_name} won!"),
            };
        }

        let mut bundle = GractBundle::new(self.players.keys().copied());

        self.discard_stack.push(card_id);
        bundle.broadcast(Gract::MoveCard {
            card_id,
            collection_id: -2,
        });
        bundle.broadcast(Gract::RevealCard {
            old_card_id: card_id,
            new_card_id: card_id,
            new_type_id: card_id,
        });

        self.turn_idx = (self.turn_idx + 1) % self.turn_order.len();
        self.stage = Stage::Draw;
        let next_player = self.turn_order[self.turn_idx];

        bundle.send(
            next_player,
            Gract::PossibleActions {
                possibilities: vec![Possibility::SelectCollection {
                    collection_ids: vec![-1, -2],
                }],
            },
        );

        ModMsg::Gract(bundle)
    }
}

impl Module for RummyModule {
    fn process_msg(&mut self, msg: EngMsg) -> ModMsg {
        match msg {
            EngMsg::Init => ModMsg::ChangeState {
                join_mode: Availability::Open,
                start_mode: Availability::Closed("at least 2 players required".to_string()),
            },
            EngMsg::PlayerJoin { player_id, name } => self.on_player_join(player_id, name),
            EngMsg::PlayerLeave { player_id } => self.on_player_leave(player_id),
            EngMsg::StartRound => self.on_start_round(),
            EngMsg::EndRound => ModMsg::Empty,
            EngMsg::PlayerAction { player_id, action } => self.on_player_action(player_id, action),
        }
    }
}

pub struct RummyFactory;

impl ModuleFactory for RummyFactory {
    fn name(&self) -> &str {
        "rummy"
    }

    fn create(&self) -> Box<dyn Module> {
        Box::new(RummyModule::new())
    }
}
