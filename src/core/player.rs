//! Player seats.
//!
//! A session always has exactly two seats. The host created the session and
//! plays first; the guest joins later. On the wire seats are the integers
//! `1` (host) and `2` (guest).

use serde::{Deserialize, Serialize};

/// One of the two seats at a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerSeat {
    /// Player 1, the creator of the session.
    Host,
    /// Player 2, admitted by a successful join.
    Guest,
}

impl PlayerSeat {
    /// Both seats in turn order.
    pub const ALL: [PlayerSeat; 2] = [PlayerSeat::Host, PlayerSeat::Guest];

    /// Wire number of this seat (1 or 2).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            PlayerSeat::Host => 1,
            PlayerSeat::Guest => 2,
        }
    }

    /// Resolve a wire number to a seat.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(PlayerSeat::Host),
            2 => Some(PlayerSeat::Guest),
            _ => None,
        }
    }

    /// The seat that plays after this one.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            PlayerSeat::Host => PlayerSeat::Guest,
            PlayerSeat::Guest => PlayerSeat::Host,
        }
    }
}

impl From<PlayerSeat> for u8 {
    fn from(seat: PlayerSeat) -> Self {
        seat.number()
    }
}

impl TryFrom<u8> for PlayerSeat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PlayerSeat::from_number(value).ok_or_else(|| format!("invalid player id {value}, expected 1 or 2"))
    }
}

impl std::fmt::Display for PlayerSeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_numbers() {
        assert_eq!(PlayerSeat::Host.number(), 1);
        assert_eq!(PlayerSeat::Guest.number(), 2);
        assert_eq!(PlayerSeat::from_number(1), Some(PlayerSeat::Host));
        assert_eq!(PlayerSeat::from_number(2), Some(PlayerSeat::Guest));
        assert_eq!(PlayerSeat::from_number(0), None);
        assert_eq!(PlayerSeat::from_number(3), None);
    }

    #[test]
    fn test_other_alternates() {
        assert_eq!(PlayerSeat::Host.other(), PlayerSeat::Guest);
        assert_eq!(PlayerSeat::Guest.other(), PlayerSeat::Host);
        for seat in PlayerSeat::ALL {
            assert_eq!(seat.other().other(), seat);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PlayerSeat::Guest), "Player 2");
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&PlayerSeat::Host).unwrap(), "1");
        let seat: PlayerSeat = serde_json::from_str("2").unwrap();
        assert_eq!(seat, PlayerSeat::Guest);
        assert!(serde_json::from_str::<PlayerSeat>("7").is_err());
    }
}
