//! Session transitions.
//!
//! Each transition first runs every check against the untouched session and
//! only then mutates it, so a rejected call leaves the session exactly as it
//! was. Nothing here performs I/O; persistence is the service's job.

use chrono::{DateTime, Utc};

use crate::cards::MAX_VALUE;
use crate::core::{GameError, PlayerSeat};
use crate::session::{Session, SessionStatus};

/// Result of an accepted move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Correct flip; the same player continues with `next_target`.
    Progress { next_target: u8 },
    /// Wrong card; the turn passes to `next_player` once the reveal is cleared.
    Mismatch { card_index: usize, next_player: PlayerSeat },
    /// The 9 was flipped in order.
    Won { winner: String },
}

impl MoveOutcome {
    /// Did this move end the game?
    #[must_use]
    pub fn game_ended(&self) -> bool {
        matches!(self, MoveOutcome::Won { .. })
    }
}

/// Normalize a player name: trimmed, and not empty.
pub fn normalize_name(raw: &str, missing: &str) -> Result<String, GameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(GameError::invalid_input(missing));
    }
    Ok(name.to_string())
}

/// Check that `guest` may join `session`.
pub fn validate_join(session: &Session, guest: &str) -> Result<(), GameError> {
    if session.status != SessionStatus::Waiting || session.guest_player.is_some() {
        return Err(GameError::invalid_state("Game is no longer accepting players"));
    }
    if session.host_player == guest {
        return Err(GameError::invalid_input("Host cannot join their own game"));
    }
    Ok(())
}

/// Seat `guest` and start the game.
pub fn join(session: &mut Session, guest: &str, now: DateTime<Utc>) -> Result<(), GameError> {
    validate_join(session, guest)?;

    session.guest_player = Some(guest.to_string());
    session.status = SessionStatus::Active;
    session.touch(now);
    Ok(())
}

/// Check that `seat` may flip the card at `card_index`.
pub fn validate_move(session: &Session, seat: PlayerSeat, card_index: usize) -> Result<(), GameError> {
    if session.status != SessionStatus::Active {
        return Err(GameError::invalid_state("Game is not active"));
    }
    if session.current_player != seat {
        return Err(GameError::invalid_state("It's not your turn"));
    }
    if session.has_pending_mismatch() {
        return Err(GameError::invalid_state("Previous mismatch has not been cleared yet"));
    }
    let card = session
        .cards
        .get(card_index)
        .ok_or_else(|| GameError::invalid_input(format!("Card index {card_index} is out of range")))?;
    if !card.is_available() {
        return Err(GameError::invalid_state("Card is already flipped or matched"));
    }
    Ok(())
}

/// Flip the card at `card_index` for `seat`.
///
/// Correct flips stay face-up for the rest of the streak. On the winning
/// flip every face-up card is claimed at once, since the whole streak is
/// still showing.
pub fn apply_move(
    session: &mut Session,
    seat: PlayerSeat,
    card_index: usize,
    now: DateTime<Utc>,
) -> Result<MoveOutcome, GameError> {
    validate_move(session, seat, card_index)?;

    let value = session.cards[card_index].value;
    let winning = value == session.current_target && value == MAX_VALUE;

    // Resolve the name before touching anything.
    let winner = if winning {
        let name = session
            .player_name(seat)
            .ok_or_else(|| GameError::internal("active session has no guest"))?;
        Some(name.to_string())
    } else {
        None
    };

    session.cards[card_index].is_flipped = true;

    let outcome = match winner {
        Some(winner) => {
            for card in session.cards.iter_mut().filter(|card| card.is_flipped) {
                card.is_matched = true;
            }
            session.status = SessionStatus::Completed;
            session.winner = Some(winner.clone());
            MoveOutcome::Won { winner }
        }
        None if value == session.current_target => {
            session.current_target += 1;
            MoveOutcome::Progress {
                next_target: session.current_target,
            }
        }
        None => {
            session.incorrect_card = Some(card_index);
            session.current_target = 1;
            session.current_player = seat.other();
            MoveOutcome::Mismatch {
                card_index,
                next_player: session.current_player,
            }
        }
    };

    session.touch(now);
    Ok(outcome)
}

/// Turn every unclaimed card face-down again and drop the mismatch marker.
///
/// Returns `false`, leaving the session untouched, when there is no
/// mismatch to clear.
pub fn clear_mismatch(session: &mut Session, now: DateTime<Utc>) -> bool {
    if session.incorrect_card.is_none() {
        return false;
    }

    for card in session.cards.iter_mut() {
        card.is_flipped = card.is_matched;
    }
    session.incorrect_card = None;
    session.touch(now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Board, Card};
    use crate::session::SessionId;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    /// Active session with the board laid out as `values`.
    fn active(values: [u8; 9]) -> Session {
        let cards: Board = values.into_iter().map(Card::new).collect();
        let mut session = Session::new(SessionId(Uuid::nil()), "alice", cards, at(0));
        join(&mut session, "bob", at(1)).unwrap();
        session
    }

    fn index_of(session: &Session, value: u8) -> usize {
        session.cards.iter().position(|c| c.value == value).unwrap()
    }

    #[test]
    fn test_join_activates() {
        let cards: Board = (1..=9).map(Card::new).collect();
        let mut session = Session::new(SessionId(Uuid::nil()), "alice", cards, at(0));

        join(&mut session, "bob", at(10)).unwrap();

        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.guest_player.as_deref(), Some("bob"));
        assert_eq!(session.last_updated, at(10));
        assert_eq!(session.version, 1);
    }

    #[test]
    fn test_join_rejects_host_name() {
        let cards: Board = (1..=9).map(Card::new).collect();
        let mut session = Session::new(SessionId(Uuid::nil()), "alice", cards, at(0));
        let before = session.clone();

        let err = join(&mut session, "alice", at(10)).unwrap_err();
        assert!(matches!(err, GameError::InvalidInput(_)));
        assert_eq!(session, before);

        // Case-sensitive identity.
        assert!(join(&mut session, "Alice", at(10)).is_ok());
    }

    #[test]
    fn test_second_join_rejected() {
        let mut session = active([1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let before = session.clone();

        let err = join(&mut session, "carol", at(20)).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
        assert_eq!(session, before);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  bob ", "missing").unwrap(), "bob");
        assert_eq!(
            normalize_name("   ", "Host player name is required").unwrap_err(),
            GameError::InvalidInput("Host player name is required".into())
        );
    }

    #[test]
    fn test_progressing_move() {
        let mut session = active([4, 3, 1, 2, 9, 8, 7, 6, 5]);
        session.cards[2].is_flipped = true; // 1
        session.cards[3].is_flipped = true; // 2
        session.current_target = 3;

        let outcome = apply_move(&mut session, PlayerSeat::Host, 1, at(50)).unwrap();

        assert_eq!(outcome, MoveOutcome::Progress { next_target: 4 });
        assert!(!outcome.game_ended());
        assert_eq!(session.current_target, 4);
        assert_eq!(session.current_player, PlayerSeat::Host);
        assert!(session.cards[1].is_flipped);
        assert!(!session.cards[1].is_matched);
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_mismatch_then_clear() {
        let mut session = active([3, 5, 1, 2, 4, 6, 7, 8, 9]);
        let five = index_of(&session, 5);

        let outcome = apply_move(&mut session, PlayerSeat::Host, five, at(50)).unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::Mismatch {
                card_index: five,
                next_player: PlayerSeat::Guest
            }
        );
        assert_eq!(session.incorrect_card, Some(five));
        assert_eq!(session.current_target, 1);
        assert_eq!(session.current_player, PlayerSeat::Guest);
        assert!(session.cards[five].is_flipped);
        assert!(session.check_invariants().is_ok());

        assert!(clear_mismatch(&mut session, at(1050)));
        assert!(!session.cards[five].is_flipped);
        assert_eq!(session.incorrect_card, None);
        assert!(session.check_invariants().is_ok());

        let snapshot = session.clone();
        assert!(!clear_mismatch(&mut session, at(2000)));
        assert_eq!(session, snapshot);
    }

    #[test]
    fn test_clear_unflips_whole_streak() {
        let mut session = active([1, 2, 3, 4, 5, 6, 7, 8, 9]);
        apply_move(&mut session, PlayerSeat::Host, 0, at(2)).unwrap();
        apply_move(&mut session, PlayerSeat::Host, 1, at(3)).unwrap();
        apply_move(&mut session, PlayerSeat::Host, 5, at(4)).unwrap();

        assert_eq!(session.pending_count(), 3);
        clear_mismatch(&mut session, at(5));
        assert_eq!(session.pending_count(), 0);
        assert!(session.cards.iter().all(|c| !c.is_flipped));
    }

    #[test]
    fn test_winning_move_sweeps_streak() {
        let mut session = active([1, 2, 3, 4, 5, 6, 7, 8, 9]);
        for value in 1..=8u8 {
            let index = index_of(&session, value);
            apply_move(&mut session, PlayerSeat::Host, index, at(i64::from(value))).unwrap();
        }
        assert_eq!(session.pending_count(), 8);

        let outcome = apply_move(&mut session, PlayerSeat::Host, 8, at(100)).unwrap();

        assert_eq!(outcome, MoveOutcome::Won { winner: "alice".into() });
        assert!(outcome.game_ended());
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.winner.as_deref(), Some("alice"));
        assert!(session.cards.iter().all(|c| c.is_flipped && c.is_matched));
        assert!(session.check_invariants().is_ok());
    }

    #[test]
    fn test_winning_sweep_claims_every_face_up_card() {
        let mut session = active([3, 1, 7, 9, 2, 5, 4, 6, 8]);
        session.cards[2].is_flipped = true;
        session.cards[5].is_flipped = true;
        session.current_target = 9;

        let outcome = apply_move(&mut session, PlayerSeat::Host, 3, at(9)).unwrap();

        assert!(outcome.game_ended());
        for index in [2, 3, 5] {
            assert!(session.cards[index].is_matched, "card {index}");
        }
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.winner.as_deref(), Some("alice"));
    }

    #[test]
    fn test_guest_can_win() {
        let mut session = active([9, 1, 2, 3, 4, 5, 6, 7, 8]);
        session.current_player = PlayerSeat::Guest;
        for index in 1..9 {
            apply_move(&mut session, PlayerSeat::Guest, index, at(10)).unwrap();
        }
        let outcome = apply_move(&mut session, PlayerSeat::Guest, 0, at(11)).unwrap();
        assert_eq!(outcome, MoveOutcome::Won { winner: "bob".into() });
    }

    #[test]
    fn test_rejections_leave_session_untouched() {
        let mut session = active([2, 1, 3, 4, 5, 6, 7, 8, 9]);
        apply_move(&mut session, PlayerSeat::Host, 1, at(5)).unwrap();
        let before = session.clone();

        let wrong_turn = apply_move(&mut session, PlayerSeat::Guest, 0, at(6)).unwrap_err();
        assert_eq!(wrong_turn, GameError::InvalidState("It's not your turn".into()));

        let taken = apply_move(&mut session, PlayerSeat::Host, 1, at(6)).unwrap_err();
        assert_eq!(taken, GameError::InvalidState("Card is already flipped or matched".into()));

        let out_of_range = apply_move(&mut session, PlayerSeat::Host, 9, at(6)).unwrap_err();
        assert!(matches!(out_of_range, GameError::InvalidInput(_)));

        assert_eq!(session, before);
    }

    #[test]
    fn test_waiting_and_completed_reject_moves() {
        let cards: Board = (1..=9).map(Card::new).collect();
        let mut waiting = Session::new(SessionId(Uuid::nil()), "alice", cards, at(0));
        assert_eq!(
            apply_move(&mut waiting, PlayerSeat::Host, 0, at(1)).unwrap_err(),
            GameError::InvalidState("Game is not active".into())
        );

        let mut done = active([1, 2, 3, 4, 5, 6, 7, 8, 9]);
        for index in 0..9 {
            apply_move(&mut done, PlayerSeat::Host, index, at(2)).unwrap();
        }
        let before = done.clone();
        assert!(matches!(
            apply_move(&mut done, PlayerSeat::Host, 0, at(3)),
            Err(GameError::InvalidState(_))
        ));
        assert_eq!(done, before);
    }

    #[test]
    fn test_pending_mismatch_blocks_next_move() {
        let mut session = active([2, 1, 3, 4, 5, 6, 7, 8, 9]);
        apply_move(&mut session, PlayerSeat::Host, 0, at(1)).unwrap();
        let before = session.clone();

        let err = apply_move(&mut session, PlayerSeat::Guest, 1, at(2)).unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
        assert_eq!(session, before);

        clear_mismatch(&mut session, at(3));
        assert!(apply_move(&mut session, PlayerSeat::Guest, 1, at(4)).is_ok());
    }
}
