//! The session entity and its identifiers.

pub mod id;
pub mod state;

pub use id::{SessionId, ShortCode};
pub use state::{InvariantViolation, Session, SessionStatus};
