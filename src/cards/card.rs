//! A single numbered card on the board.

use serde::{Deserialize, Serialize};

/// One board position.
///
/// `value` never changes after the deck is dealt; only the two flags move.
/// A matched card is always face-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Face value, 1 through 9, unique within a session.
    pub value: u8,

    /// Is the card currently face-up?
    pub is_flipped: bool,

    /// Has the card been claimed by a winning streak?
    pub is_matched: bool,
}

impl Card {
    /// A face-down, unmatched card.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self {
            value,
            is_flipped: false,
            is_matched: false,
        }
    }

    /// Can this card be flipped by a move?
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.is_flipped && !self.is_matched
    }

    /// Face-up but not yet claimed.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.is_flipped && !self.is_matched
    }
}
