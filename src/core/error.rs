//! Domain error taxonomy.
//!
//! Every operation fails with exactly one [`GameError`]. Domain checks run
//! before anything is written, so an error never leaves a partial write
//! behind.

use thiserror::Error;

use crate::store::StoreError;

/// Failure of a session operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Caller-supplied field is missing or malformed. Not worth retrying
    /// until the caller fixes the request.
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown or expired session id or short code.
    #[error("{0}")]
    NotFound(String),

    /// Not legal in the current session state (wrong turn, card taken,
    /// game not active...). Refresh and decide whether to retry.
    #[error("{0}")]
    InvalidState(String),

    /// Store or encoding failure. Safe to retry.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        GameError::InvalidInput(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        GameError::NotFound(message.into())
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        GameError::InvalidState(message.into())
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        GameError::Internal(message.into())
    }

    /// Category used by the request/response surface.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            GameError::InvalidInput(_) => ErrorCategory::BadInput,
            GameError::NotFound(_) => ErrorCategory::NotFound,
            GameError::InvalidState(_) => ErrorCategory::Conflict,
            GameError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Message safe to show to a player. Internal details stay in the logs.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            GameError::Internal(_) => "Something went wrong, please try again".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        GameError::Internal(err.to_string())
    }
}

/// Coarse error category seen by clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    BadInput,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorCategory {
    /// HTTP-style status code for this category.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorCategory::BadInput => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::Internal => 500,
        }
    }

    /// Whether resubmitting the same request can succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, ErrorCategory::Conflict | ErrorCategory::Internal)
    }
}
