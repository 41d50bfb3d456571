//! The session entity.
//!
//! ## Lifecycle
//!
//! ```text
//! waiting --join--> active --winning move--> completed
//! ```
//!
//! No other transitions exist. Which optional fields are present follows
//! from the status:
//!
//! | status      | guestPlayer | winner  |
//! |-------------|-------------|---------|
//! | `waiting`   | absent      | absent  |
//! | `active`    | present     | absent  |
//! | `completed` | present     | present |
//!
//! The serialized form (camelCase JSON, `lastUpdated` in epoch millis) is
//! what gets stored and what clients poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{SessionId, ShortCode};
use crate::cards::{is_full_deck, Board, MAX_VALUE};
use crate::core::{GameError, PlayerSeat};

/// Session lifecycle phase. Forward-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, waiting for a guest.
    Waiting,
    /// Both seats filled, moves accepted.
    Active,
    /// Someone flipped 1 through 9 in order.
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionStatus::Waiting => "waiting",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// A stored record that breaks one of the session invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("session invariant violated: {0}")]
pub struct InvariantViolation(pub String);

impl From<InvariantViolation> for GameError {
    fn from(err: InvariantViolation) -> Self {
        GameError::internal(err.to_string())
    }
}

/// One game between a host and a guest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,

    /// Shareable alias registered at creation, if short codes are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_code: Option<ShortCode>,

    pub status: SessionStatus,

    pub host_player: String,

    /// Set exactly once, by the join that activates the session.
    pub guest_player: Option<String>,

    /// Whose turn it is.
    pub current_player: PlayerSeat,

    /// Value the current player must flip next (1..=9).
    pub current_target: u8,

    /// Board positions, fixed at creation.
    pub cards: Board,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,

    /// Board index of a mismatched flip still waiting to be cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incorrect_card: Option<usize>,

    /// Name of the player who won. Set together with `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,

    /// Bumped on every persisted mutation.
    #[serde(default)]
    pub version: u64,
}

impl Session {
    /// A fresh session waiting for its guest. The host moves first.
    #[must_use]
    pub fn new(id: SessionId, host_player: impl Into<String>, cards: Board, now: DateTime<Utc>) -> Self {
        Self {
            id,
            short_code: None,
            status: SessionStatus::Waiting,
            host_player: host_player.into(),
            guest_player: None,
            current_player: PlayerSeat::Host,
            current_target: 1,
            cards,
            last_updated: now,
            incorrect_card: None,
            winner: None,
            version: 0,
        }
    }

    /// Name of the player in `seat`, if that seat is filled.
    #[must_use]
    pub fn player_name(&self, seat: PlayerSeat) -> Option<&str> {
        match seat {
            PlayerSeat::Host => Some(self.host_player.as_str()),
            PlayerSeat::Guest => self.guest_player.as_deref(),
        }
    }

    /// Cards that are face-up but not yet claimed.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_pending()).count()
    }

    /// Is a mismatch waiting to be cleared?
    #[must_use]
    pub fn has_pending_mismatch(&self) -> bool {
        self.incorrect_card.is_some()
    }

    /// Record a mutation: stamp the time and bump the version.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = now;
        self.version += 1;
    }

    /// Check every structural invariant of a session.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let fail = |msg: String| Err(InvariantViolation(msg));

        match (self.status, self.guest_player.is_some(), self.winner.is_some()) {
            (SessionStatus::Waiting, false, false)
            | (SessionStatus::Active, true, false)
            | (SessionStatus::Completed, true, true) => {}
            (status, guest, winner) => {
                return fail(format!(
                    "status {status} with guest present={guest}, winner present={winner}"
                ))
            }
        }

        if self.guest_player.as_deref() == Some(self.host_player.as_str()) {
            return fail("host and guest share a name".to_string());
        }

        if !(1..=MAX_VALUE).contains(&self.current_target) {
            return fail(format!("target {} out of range", self.current_target));
        }

        if !is_full_deck(&self.cards) {
            return fail("board is not a permutation of 1..=9".to_string());
        }

        if self.cards.iter().any(|card| card.is_matched && !card.is_flipped) {
            return fail("matched card is face-down".to_string());
        }

        if let Some(index) = self.incorrect_card {
            if self.status != SessionStatus::Active {
                return fail(format!("pending mismatch in {} session", self.status));
            }
            if !self.cards.get(index).is_some_and(|card| card.is_pending()) {
                return fail(format!("incorrect card {index} is not a face-up card"));
            }
        }

        match self.status {
            SessionStatus::Waiting if self.cards.iter().any(|card| card.is_flipped) => {
                fail("cards flipped before the game started".to_string())
            }
            SessionStatus::Active
                if self.incorrect_card.is_none() && self.pending_count() >= usize::from(self.current_target) =>
            {
                fail(format!(
                    "{} face-up cards but target is {}",
                    self.pending_count(),
                    self.current_target
                ))
            }
            _ => Ok(()),
        }
    }
}
