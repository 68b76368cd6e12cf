//! Messages exchanged between an engine and the module instance it drives.
//!
//! # Contract
//!
//! | Engine sends | When | Module must return |
//! |---|---|---|
//! | [`EngMsg::Init`] | exactly once, before any other message | [`ModMsg::ChangeState`] |
//! | [`EngMsg::PlayerJoin`] | after the engine decides to admit a player | any |
//! | [`EngMsg::PlayerLeave`] | after a player disconnects | any |
//! | [`EngMsg::StartRound`] | a player requested a start and the state permits it | any |
//! | [`EngMsg::EndRound`] | reserved; dropped by the engine while no round is active | any |
//! | [`EngMsg::PlayerAction`] | a player's action matched their advertised possibilities | any |
//!
//! An [`EngMsg::Init`] response other than [`ModMsg::ChangeState`] is
//! treated as module misbehaviour: the engine tears the game down before
//! admitting any player.

use std::collections::HashMap;

use protocol::{Action, Gract, PlayerId};

/// A message the engine sends to the module.
#[derive(Debug, Clone, PartialEq)]
pub enum EngMsg {
    Init,
    PlayerJoin { player_id: PlayerId, name: String },
    PlayerLeave { player_id: PlayerId },
    StartRound,
    /// Engine-originated round termination. Nothing in the core currently
    /// emits this on its own initiative; it is reserved for a future
    /// host-side watchdog (e.g. a turn timer).
    EndRound,
    PlayerAction { player_id: PlayerId, action: Action },
}

/// Whether the module currently accepts joiners, or permits a round start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Open,
    Closed(String),
}

impl Availability {
    pub fn is_open(&self) -> bool {
        matches!(self, Availability::Open)
    }
}

/// The value a module returns from [`crate::Module::process_msg`].
#[derive(Debug, Clone, PartialEq)]
pub enum ModMsg {
    Empty,
    ChangeState {
        join_mode: Availability,
        start_mode: Availability,
    },
    Gract(GractBundle),
    EndRound { reason: String },
    EndGame { reason: String },
}

/// A set of per-player gract lists under construction.
///
/// Mirrors the send/broadcast/broadcast-except idiom modules use to build
/// up their output for one [`EngMsg`]: start with the players who should
/// receive *something* (usually all of them), then route individual
/// gracts to one player, everyone, or everyone but one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GractBundle {
    lists: HashMap<PlayerId, Vec<Gract>>,
}

impl GractBundle {
    /// Starts a bundle with an empty list for each of the given players.
    pub fn new(player_ids: impl IntoIterator<Item = PlayerId>) -> Self {
        let lists = player_ids.into_iter().map(|id| (id, Vec::new())).collect();
        GractBundle { lists }
    }

    /// Appends `gract` to `player_id`'s list, tracking the player even if
    /// they were not present when the bundle was created.
    pub fn send(&mut self, player_id: PlayerId, gract: Gract) {
        self.lists.entry(player_id).or_default().push(gract);
    }

    /// Appends `gract` to every player's list.
    pub fn broadcast(&mut self, gract: Gract) {
        for list in self.lists.values_mut() {
            list.push(gract.clone());
        }
    }

    /// Appends `gract` to every player's list except `except`.
    pub fn broadcast_except(&mut self, except: PlayerId, gract: Gract) {
        for (player_id, list) in self.lists.iter_mut() {
            if *player_id != except {
                list.push(gract.clone());
            }
        }
    }

    /// Consumes the bundle, yielding the per-player lists. Lists left empty
    /// (no gract ever sent to that player) are still present; the engine
    /// skips sending a frame for them.
    pub fn into_lists(self) -> HashMap<PlayerId, Vec<Gract>> {
        self.lists
    }
}
