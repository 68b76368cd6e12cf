//! The gract (graphical action) taxonomy: the closed set of instructions a
//! module may emit for a single player's client to render.

use serde::{Deserialize, Serialize};

use crate::ids::{CardId, CollectionId, PlayerId, TypeId};
use crate::possibility::Possibility;

/// How a collection should be laid out on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionDisplay {
    Hand,
    Spread,
    Stack,
}

/// A single instruction describing a change to what a player can see, or a
/// replacement of their advertised possibilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Gract {
    ShowType {
        type_id: TypeId,
        name: String,
        description: String,
        image_url: String,
    },
    ShowCollection {
        collection_id: CollectionId,
        anchor_player_id: Option<PlayerId>,
        display: CollectionDisplay,
    },
    HideCollection {
        collection_id: CollectionId,
    },
    ShowCard {
        card_id: CardId,
        type_id: TypeId,
        collection_id: CollectionId,
    },
    HideCard {
        card_id: CardId,
    },
    /// Preconditions: both `card_id` and `collection_id` have already been
    /// shown to the recipient.
    MoveCard {
        card_id: CardId,
        collection_id: CollectionId,
    },
    /// Flips a card face-up. The identifier may be rewritten in the same
    /// gract to defeat client-side tracking of the pre-reveal identity.
    RevealCard {
        old_card_id: CardId,
        new_card_id: CardId,
        new_type_id: TypeId,
    },
    /// Same mechanics as [`Gract::RevealCard`], opposite semantic direction.
    ConcealCard {
        old_card_id: CardId,
        new_card_id: CardId,
        new_type_id: TypeId,
    },
    /// Wholesale replacement of the recipient's possibility set. If a gract
    /// list carries more than one of these for the same player, the last
    /// one wins.
    PossibleActions {
        possibilities: Vec<Possibility>,
    },
}
