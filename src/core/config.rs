//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for session handling.
///
/// The defaults match the deployed game: sessions live for one hour, codes
/// are six digits, and a mismatched card stays visible for one second.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a session (and its short code), measured from creation.
    pub session_ttl: Duration,

    /// Whether CreateSession allocates a short code.
    pub short_codes: bool,

    /// Number of digits in a short code.
    pub short_code_len: usize,

    /// Attempts at finding an unused short code before giving up.
    pub short_code_attempts: u32,

    /// Attempts at a conditional write before reporting a conflict.
    pub write_attempts: u32,

    /// How long callers should leave a mismatched card visible before
    /// asking for the mismatch to be cleared. Not enforced here.
    pub mismatch_reveal_delay: Duration,

    /// Minimum spacing callers should leave between two move submissions.
    /// Not enforced here.
    pub move_cooldown: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(60 * 60),
            short_codes: true,
            short_code_len: 6,
            short_code_attempts: 16,
            write_attempts: 5,
            mismatch_reveal_delay: Duration::from_millis(1000),
            move_cooldown: Duration::from_millis(300),
        }
    }
}

impl SessionConfig {
    /// Set the session lifetime.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Enable or disable short codes.
    #[must_use]
    pub fn with_short_codes(mut self, enabled: bool) -> Self {
        self.short_codes = enabled;
        self
    }

    /// Set the number of conditional-write attempts (at least one).
    #[must_use]
    pub fn with_write_attempts(mut self, attempts: u32) -> Self {
        self.write_attempts = attempts.max(1);
        self
    }

    /// Set the number of short-code allocation attempts (at least one).
    #[must_use]
    pub fn with_short_code_attempts(mut self, attempts: u32) -> Self {
        self.short_code_attempts = attempts.max(1);
        self
    }
}
