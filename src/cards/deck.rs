//! Deck generation.

use smallvec::SmallVec;

use super::card::Card;
use crate::core::GameRng;

/// Number of cards on the board.
pub const DECK_SIZE: usize = 9;

/// Highest card value; flipping it in order wins the game.
pub const MAX_VALUE: u8 = DECK_SIZE as u8;

/// The board: nine cards, stored inline.
pub type Board = SmallVec<[Card; DECK_SIZE]>;

/// Deal a fresh board: the values 1 through 9 in uniformly random order,
/// every card face-down and unmatched.
pub fn generate_deck(rng: &mut GameRng) -> Board {
    let mut values: [u8; DECK_SIZE] = std::array::from_fn(|i| i as u8 + 1);
    rng.shuffle(&mut values);
    values.into_iter().map(Card::new).collect()
}

/// Is `cards` a complete board, i.e. a permutation of 1 through 9?
#[must_use]
pub fn is_full_deck(cards: &[Card]) -> bool {
    if cards.len() != DECK_SIZE {
        return false;
    }
    let mut seen = [false; DECK_SIZE];
    for card in cards {
        let slot = match card.value.checked_sub(1).map(usize::from) {
            Some(slot) if slot < DECK_SIZE => slot,
            _ => return false,
        };
        if std::mem::replace(&mut seen[slot], true) {
            return false;
        }
    }
    true
}
