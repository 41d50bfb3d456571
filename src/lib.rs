//! # flip-in-order
//!
//! Server side of "Flip in Order", a two-player memory game. Nine cards
//! numbered 1 to 9 lie face-down in random order. On their turn a player
//! flips cards looking for 1, then 2, and so on; a wrong card passes the
//! turn and turns the streak face-down again. Whoever flips 1 through 9 in
//! one streak wins.
//!
//! ## Architecture
//!
//! - **Stateless operations**: each call (create, join, fetch, move, clear)
//!   loads the session from a shared key-value store, applies one pure rule
//!   transition and writes it back. Clients converge by polling.
//!
//! - **Conditional writes**: updates go through a compare-and-swap on the
//!   stored record, so racing joins or double-submitted moves cannot
//!   clobber each other.
//!
//! - **Bounded lifetime**: sessions and their short codes expire one hour
//!   after creation; expired sessions are simply not found.
//!
//! ## Modules
//!
//! - `core`: seats, RNG, clock, configuration, errors
//! - `cards`: card record and deck generator
//! - `session`: session entity, ids and short codes
//! - `rules`: join / move / clear-mismatch transitions
//! - `store`: key-value capability, in-memory backend, session repository
//! - `service`: the operations and their JSON request/response surface

pub mod core;
pub mod cards;
pub mod session;
pub mod rules;
pub mod store;
pub mod service;

// Re-export commonly used types
pub use crate::core::{
    Clock, ManualClock, SystemClock,
    ErrorCategory, GameError,
    GameRng, PlayerSeat, SessionConfig,
};

pub use crate::cards::{generate_deck, Board, Card, DECK_SIZE};

pub use crate::session::{Session, SessionId, SessionStatus, ShortCode};

pub use crate::rules::MoveOutcome;

pub use crate::store::{KvStore, MemoryStore, SessionRepository, StoreError};

pub use crate::service::{
    ApiResponse, GameApi, GameResponse, GameService, GameServiceBuilder,
    JoinTarget, MoveResult, Operation,
};
