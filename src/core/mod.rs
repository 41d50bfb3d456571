//! Core building blocks: seats, randomness, time, configuration, errors.

pub mod player;
pub mod rng;
pub mod clock;
pub mod config;
pub mod error;

pub use player::PlayerSeat;
pub use rng::GameRng;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use error::{ErrorCategory, GameError};
