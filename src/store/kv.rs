//! Key-value store capability.
//!
//! The session service only ever talks to storage through [`KvStore`]. Any
//! backend with string keys and values, per-key expiry and atomic
//! conditional writes can host sessions.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Storage failure. Always safe to retry from the caller's point of view.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode record {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// String key-value store with expiry.
///
/// Writes to an existing key keep that key's expiry, so a TTL set at
/// creation keeps counting down across later updates.
pub trait KvStore: Send + Sync {
    /// Read a key. Expired keys read as absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a key unconditionally.
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Expire `key` after `ttl`. Returns `false` if the key does not exist.
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Remove a key. Returns `false` if it did not exist.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Write `key` only if it does not exist. Returns whether it was written.
    fn set_if_absent(&self, key: &str, value: String) -> Result<bool, StoreError>;

    /// Write `key` with an expiry only if it does not exist (`SET NX EX`).
    ///
    /// The default writes then expires, and deletes the key again if the
    /// expiry cannot be set, so a failed call never leaves an immortal key.
    /// Backends with a native atomic form should override it.
    fn set_if_absent_with_ttl(&self, key: &str, value: String, ttl: Duration) -> Result<bool, StoreError> {
        if !self.set_if_absent(key, value)? {
            return Ok(false);
        }
        if let Err(err) = self.expire(key, ttl) {
            if let Err(cleanup) = self.delete(key) {
                warn!(%key, error = %cleanup, "could not remove key after failed expire");
            }
            return Err(err);
        }
        Ok(true)
    }

    /// Replace the value at `key` only if it currently equals `expected`.
    /// Returns whether the swap happened; a missing key never swaps.
    fn compare_and_swap(&self, key: &str, expected: &str, value: String) -> Result<bool, StoreError>;
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).expire(key, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key)
    }

    fn set_if_absent(&self, key: &str, value: String) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value)
    }

    fn set_if_absent_with_ttl(&self, key: &str, value: String, ttl: Duration) -> Result<bool, StoreError> {
        (**self).set_if_absent_with_ttl(key, value, ttl)
    }

    fn compare_and_swap(&self, key: &str, expected: &str, value: String) -> Result<bool, StoreError> {
        (**self).compare_and_swap(key, expected, value)
    }
}
