//! Identifier types shared across the wire boundary.
//!
//! Game and player identifiers are engine-assigned counters and are never
//! negative. Type, collection and card identifiers are chosen by the
//! module; by convention a module may use negative ids for collections it
//! considers "central" rather than player-owned (see the demo module).

/// Assigned by the manager, unique for the lifetime of the process.
pub type GameId = u64;

/// Assigned by an engine, unique within that game.
pub type PlayerId = u64;

/// Module-chosen, unique within the game.
pub type TypeId = i64;

/// Module-chosen, unique within the game. May be negative.
pub type CollectionId = i64;

/// Module-chosen, unique within the game.
pub type CardId = i64;
