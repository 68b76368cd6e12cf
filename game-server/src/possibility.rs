//! Per-player possibility tracking (C4): the set of actions a player is
//! currently allowed to submit, replaced wholesale by the module.

use protocol::{Action, Possibility};

/// A player's currently advertised possibility set.
///
/// Starts empty: a freshly admitted player may submit nothing until the
/// module sends them a `possible-actions` gract.
#[derive(Debug, Clone, Default)]
pub struct PossibilityTracker {
    possibilities: Vec<Possibility>,
}

impl PossibilityTracker {
    /// Installs a new possibility set, discarding whatever was there.
    pub fn replace(&mut self, possibilities: Vec<Possibility>) {
        self.possibilities = possibilities;
    }

    /// First-match-wins scan: is `action` admitted by any current
    /// possibility?
    pub fn validate(&self, action: &Action) -> bool {
        self.possibilities.iter().any(|p| p.admits(action))
    }
}
