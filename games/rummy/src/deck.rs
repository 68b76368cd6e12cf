//! The fixed 52-card deck and its [`Gract::ShowType`] descriptions, plus one
//! extra "unknown" type used for face-down cards. Built once per module
//! instance and then treated as read-only data.

use protocol::{CardId, Gract};

const SUITS: [&str; 4] = ["Clubs", "Diamonds", "Hearts", "Spades"];
const RANKS: [&str; 13] = [
    "Ace", "2", "3", "4", "5", "6", "7", "8", "9", "10", "Jack", "Queen", "King",
];

/// A card's id encodes its suit and rank: `suit_index * 100 + rank_index + 1`.
/// Ids within one suit are consecutive integers in rank order, which
/// [`crate::hand::is_winning_hand`] relies on to detect runs.
pub fn build_deck() -> (Vec<Gract>, Vec<CardId>) {
    let mut types = vec![Gract::ShowType {
        type_id: 0,
        name: "Unknown".to_string(),
        description: "The card type is unknown".to_string(),
        image_url: "/playing-cards/0.svg".to_string(),
    }];
    let mut ids = Vec::with_capacity(52);

    for (suit_no, suit) in SUITS.iter().enumerate() {
        for (rank_no, rank) in RANKS.iter().enumerate() {
            let id = suit_no as CardId * 100 + rank_no as CardId + 1;
            ids.push(id);
            types.push(Gract::ShowType {
                type_id: id,
                name: format!("{rank} of {suit}"),
                description: format!("{rank} of {suit}"),
                image_url: format!("/playing-cards/{id}.svg"),
            });
        }
    }

    (types, ids)
}
