//! Session identifiers: the opaque id and the shareable short code.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{GameError, GameRng};

/// Opaque, unique session identifier. Also the primary store key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Draw a random (version 4) id.
    #[must_use]
    pub fn generate(rng: &mut GameRng) -> Self {
        Self(uuid::Builder::from_random_bytes(rng.random_bytes()).into_uuid())
    }

    /// Parse an id supplied by a caller. `None` if it is not a UUID, in which
    /// case it cannot name any session.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Short numeric alias for a session, typed in by the joining player.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Draw a random code of `len` digits.
    #[must_use]
    pub fn generate(rng: &mut GameRng, len: usize) -> Self {
        Self(rng.digits(len))
    }

    /// Validate a caller-supplied code: exactly `len` ASCII digits after
    /// trimming surrounding whitespace.
    pub fn parse(raw: &str, len: usize) -> Result<Self, GameError> {
        let code = raw.trim();
        if code.len() != len || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GameError::invalid_input(format!("Game code must be {len} digits")));
        }
        Ok(Self(code.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
