//! Top-level frames exchanged between a client connection and its engine.
//!
//! Every frame is a UTF-8 JSON object with a `type` field dispatching to a
//! variant-specific schema. Field names are hyphen-delimited on the wire;
//! see [`crate::codec`] for (de)serialization.

use serde::{Deserialize, Serialize};

use crate::gract::Gract;
use crate::ids::{GameId, PlayerId};
use crate::possibility::Action;

/// Sent by a client. The very first frame on every connection must be
/// [`ClientFrame::Intro`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    Intro { player_name: String },
    StartRound,
    Action {
        #[serde(flatten)]
        action: Action,
    },
}

/// Sent by the engine to one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    Intro {
        game_id: GameId,
        player_id: PlayerId,
    },
    GractList {
        gract_list: Vec<Gract>,
    },
    EndRound {
        reason: String,
    },
    EndGame {
        reason: String,
    },
    Error {
        reason: String,
    },
}
