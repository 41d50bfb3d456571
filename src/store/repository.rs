//! Session records on top of a [`KvStore`].
//!
//! ## Key layout
//!
//! - `session:<id>`: the session as camelCase JSON
//! - `code:<code>`: the session id a short code stands for
//!
//! Both expire a fixed time after creation.

use std::time::Duration;

use tracing::warn;

use super::kv::{KvStore, StoreError};
use crate::core::GameError;
use crate::session::{Session, SessionId, ShortCode};

/// A session together with the exact encoding it was read from. The encoding
/// is the precondition for the conditional write that replaces it.
#[derive(Clone, Debug)]
pub struct Stored {
    pub session: Session,
    raw: String,
}

/// Typed access to session records.
pub struct SessionRepository<S> {
    store: S,
    ttl: Duration,
}

impl<S: KvStore> SessionRepository<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn session_key(id: SessionId) -> String {
        format!("session:{id}")
    }

    #[must_use]
    pub fn code_key(code: &ShortCode) -> String {
        format!("code:{code}")
    }

    /// Persist a brand-new session and start its expiry clock.
    pub fn insert(&self, session: &Session) -> Result<(), GameError> {
        let key = Self::session_key(session.id);
        let raw = encode(&key, session)?;
        if !self.store.set_if_absent_with_ttl(&key, raw, self.ttl)? {
            return Err(GameError::internal(format!("session id collision on {key}")));
        }
        Ok(())
    }

    /// Claim `code` for `id`. Returns `false` if the code is already taken.
    pub fn register_code(&self, code: &ShortCode, id: SessionId) -> Result<bool, GameError> {
        let key = Self::code_key(code);
        Ok(self.store.set_if_absent_with_ttl(&key, id.to_string(), self.ttl)?)
    }

    /// Give a code back, e.g. when the session it was claimed for could not
    /// be stored.
    pub fn release_code(&self, code: &ShortCode) -> Result<(), GameError> {
        self.store.delete(&Self::code_key(code))?;
        Ok(())
    }

    /// Resolve a short code to a session id.
    pub fn resolve_code(&self, code: &ShortCode) -> Result<Option<SessionId>, GameError> {
        let key = Self::code_key(code);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        let id = SessionId::parse(&raw).ok_or_else(|| StoreError::Corrupt {
            key,
            reason: format!("not a session id: {raw:?}"),
        })?;
        Ok(Some(id))
    }

    /// Load a session. Records that fail to decode or break an invariant are
    /// reported as internal errors.
    pub fn load(&self, id: SessionId) -> Result<Option<Stored>, GameError> {
        let key = Self::session_key(id);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        let session: Session = serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
            key: key.clone(),
            reason: err.to_string(),
        })?;
        if let Err(violation) = session.check_invariants() {
            warn!(%key, %violation, "stored session is inconsistent");
            return Err(violation.into());
        }
        Ok(Some(Stored { session, raw }))
    }

    /// Replace `previous` with `next` if nobody else wrote in between.
    /// Returns `false` when the record changed (or vanished) since it was read.
    pub fn replace(&self, previous: &Stored, next: &Session) -> Result<bool, GameError> {
        let key = Self::session_key(next.id);
        let raw = encode(&key, next)?;
        Ok(self.store.compare_and_swap(&key, &previous.raw, raw)?)
    }
}

fn encode(key: &str, session: &Session) -> Result<String, StoreError> {
    serde_json::to_string(session).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}
