//! Wire types and codec for the game server.
//!
//! This crate defines the closed vocabulary exchanged between an engine and
//! its connected clients — frames, gracts, possibilities and player
//! actions — and the JSON codec that serializes them. It has no notion of
//! game rules, connections, or scheduling; those live in `module` and
//! `game-server`.

pub mod codec;
pub mod frame;
pub mod gract;
pub mod ids;
pub mod possibility;

pub use codec::{decode_client_frame, encode_server_frame, FrameError};
pub use frame::{ClientFrame, ServerFrame};
pub use gract::{CollectionDisplay, Gract};
pub use ids::{CardId, CollectionId, GameId, PlayerId, TypeId};
pub use possibility::{Action, Possibility};
