//! Win-condition checking: a hand is complete when every card belongs to
//! either a same-rank set of three or more, or a run of three or more
//! consecutive ranks within one suit.

use protocol::CardId;

/// True iff every card in `hand` can be assigned to a set or a run, with no
/// leftovers. `hand` is not required to be sorted.
pub fn is_winning_hand(hand: &[CardId]) -> bool {
    let mut slots: Vec<Option<CardId>> = hand.iter().copied().map(Some).collect();
    slots.sort_by_key(|c| c.unwrap());

    mark_sets(&mut slots);
    if !mark_runs(&mut slots) {
        return false;
    }

    slots.iter().all(|c| c.is_none())
}

/// Marks every run of three-or-more same-rank cards as consumed.
/// A set can only start within the first `len - 2` positions of the sorted
/// hand, since it needs at least two more cards to its right.
fn mark_sets(slots: &mut [Option<CardId>]) {
    let scan_bound = slots.len().saturating_sub(2);

    for i in 0..scan_bound {
        let Some(value) = slots[i] else { continue };
        let rank = value % 100;
        let count = slots[i + 1..]
            .iter()
            .filter(|c| c.is_some_and(|c| c % 100 == rank))
            .count()
            + 1;

        if count >= 3 {
            for slot in slots[i..].iter_mut() {
                if slot.is_some_and(|c| c % 100 == rank) {
                    *slot = None;
                }
            }
        }
    }
}

/// Marks every run of three-or-more consecutive card ids (same suit,
/// consecutive rank — see [`crate::deck::build_deck`]) as consumed.
/// Returns `false` as soon as a maximal run shorter than three is found,
/// since no later pass can extend a run once its boundary has been
/// crossed.
fn mark_runs(slots: &mut [Option<CardId>]) -> bool {
    let mut start_idx: Option<usize> = None;
    let mut end_idx: Option<usize> = None;
    let mut prev_card: Option<CardId> = None;

    for i in 0..slots.len() {
        let Some(card) = slots[i] else { continue };
        end_idx = Some(i);

        match start_idx {
            None => start_idx = Some(i),
            Some(start) => {
                let consecutive = prev_card == Some(card - 1);
                if !consecutive || (i - start) == 4 {
                    if (i - start) < 3 {
                        return false;
                    }
                    for slot in slots[start..i].iter_mut() {
                        *slot = None;
                    }
                    start_idx = Some(i);
                }
            }
        }
        prev_card = Some(card);
    }

    if let (Some(start), Some(end)) = (start_idx, end_idx) {
        if end - start + 1 >= 3 {
            for slot in slots[start..=end].iter_mut() {
                *slot = None;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_of_a_kind_plus_a_run_wins() {
        // Three aces (clubs/diamonds/hearts) plus a 4-5-6 run of spades.
        let hand: Vec<CardId> = vec![1, 101, 201, 304, 305, 306];
        assert!(is_winning_hand(&hand));
    }

    #[test]
    fn incomplete_hand_loses() {
        let hand: Vec<CardId> = vec![1, 2, 101, 201, 304, 305];
        assert!(!is_winning_hand(&hand));
    }

    #[test]
    fn seven_card_run_in_one_suit_wins() {
        let hand: Vec<CardId> = vec![1, 2, 3, 4, 5, 6, 7];
        assert!(is_winning_hand(&hand));
    }

    #[test]
    fn run_of_exactly_five_is_unplayable_alone() {
        // A quirk carried over from the source rule set: a maximal run is
        // chunked into pieces of at most four, so a lone five-run leaves a
        // one-card remainder and never completes.
        let hand: Vec<CardId> = vec![1, 2, 3, 4, 5];
        assert!(!is_winning_hand(&hand));
    }
}
