//! Cards and the deck generator.

pub mod card;
pub mod deck;

pub use card::Card;
pub use deck::{generate_deck, is_full_deck, Board, DECK_SIZE, MAX_VALUE};
