//! Possibilities: the action options a module advertises to a player via
//! [`crate::gract::Gract::PossibleActions`], and the player-submitted
//! actions they are checked against.

use serde::{Deserialize, Serialize};

use crate::ids::{CardId, CollectionId, TypeId};

/// An option a module has advertised as available to a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Possibility {
    /// A generic acknowledgement/advance, with no associated data.
    Next,
    SelectCard { card_ids: Vec<CardId> },
    SelectCollection { collection_ids: Vec<CollectionId> },
    AgainstCard {
        select_card_id: CardId,
        against_card_ids: Vec<CardId>,
    },
    WildCard {
        card_id: CardId,
        type_ids: Vec<TypeId>,
    },
}

/// An action a player has submitted, prior to validation against their
/// current possibility set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action-type", rename_all = "kebab-case")]
pub enum Action {
    Next,
    Select { card_id: CardId },
    SelectColl { coll_id: CollectionId },
    Against {
        select_card_id: CardId,
        against_card_id: CardId,
    },
    Wild { card_id: CardId, type_id: TypeId },
}

impl Possibility {
    /// True iff `action` is one of the options this possibility advertises.
    pub fn admits(&self, action: &Action) -> bool {
        match (self, action) {
            (Possibility::Next, Action::Next) => true,
            (Possibility::SelectCard { card_ids }, Action::Select { card_id }) => {
                card_ids.contains(card_id)
            }
            (Possibility::SelectCollection { collection_ids }, Action::SelectColl { coll_id }) => {
                collection_ids.contains(coll_id)
            }
            (
                Possibility::AgainstCard {
                    select_card_id,
                    against_card_ids,
                },
                Action::Against {
                    select_card_id: s,
                    against_card_id: a,
                },
            ) => select_card_id == s && against_card_ids.contains(a),
            (
                Possibility::WildCard { card_id, type_ids },
                Action::Wild {
                    card_id: c,
                    type_id: t,
                },
            ) => card_id == c && type_ids.contains(t),
            _ => false,
        }
    }
}
