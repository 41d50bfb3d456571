//! Session operations and their JSON surface.

pub mod api;
pub mod game;

pub use api::{ApiResponse, GameApi, GameResponse, Operation};
pub use game::{GameService, GameServiceBuilder, JoinTarget, MoveResult};
