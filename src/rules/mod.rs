//! Game rules.
//!
//! Pure transitions over [`Session`](crate::session::Session): joining,
//! flipping a card and clearing a mismatch.

pub mod engine;

pub use engine::{apply_move, clear_mismatch, join, normalize_name, validate_join, validate_move, MoveOutcome};
