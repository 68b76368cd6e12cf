//! A concrete card-game module: standard rummy for two to four players.

mod deck;
mod hand;
mod rummy;

pub use rummy::{RummyFactory, RummyModule};
