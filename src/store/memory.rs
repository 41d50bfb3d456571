//! In-process [`KvStore`] with lazy expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use super::kv::{KvStore, StoreError};
use crate::core::{Clock, SystemClock};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Map-backed store. Expired keys are dropped when next touched.
///
/// Every operation takes the single lock, which makes the conditional
/// writes atomic.
pub struct MemoryStore {
    entries: Mutex<FxHashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Store on the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store on a custom clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(FxHashMap::default()),
            clock,
        }
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.lock().values().filter(|entry| entry.is_live(now)).count()
    }

    /// True if no live keys remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired key. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Lock and evict `key` if it has expired.
    fn live(&self, key: &str) -> MutexGuard<'_, FxHashMap<String, Entry>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        entries
    }

    fn deadline(&self, ttl: Duration) -> Result<DateTime<Utc>, StoreError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|err| StoreError::Unavailable(format!("invalid ttl: {err}")))?;
        Ok(self.clock.now() + ttl)
    }

    fn insert_new(&self, key: &str, value: String, expires_at: Option<DateTime<Utc>>) -> Result<bool, StoreError> {
        let mut entries = self.live(key);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(true)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.live(key).get(key).map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.live(key);
        match entries.get_mut(key) {
            Some(entry) => entry.value = value,
            None => {
                entries.insert(key.to_string(), Entry { value, expires_at: None });
            }
        }
        Ok(())
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let deadline = self.deadline(ttl)?;
        let mut entries = self.live(key);
        Ok(match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                true
            }
            None => false,
        })
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.live(key).remove(key).is_some())
    }

    fn set_if_absent(&self, key: &str, value: String) -> Result<bool, StoreError> {
        self.insert_new(key, value, None)
    }

    fn set_if_absent_with_ttl(&self, key: &str, value: String, ttl: Duration) -> Result<bool, StoreError> {
        let deadline = self.deadline(ttl)?;
        self.insert_new(key, value, Some(deadline))
    }

    fn compare_and_swap(&self, key: &str, expected: &str, value: String) -> Result<bool, StoreError> {
        let mut entries = self.live(key);
        match entries.get_mut(key) {
            Some(entry) if entry.value == expected => {
                entry.value = value;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    fn store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryStore::with_clock(clock.clone());
        (clock, store)
    }

    #[test]
    fn test_get_set_delete() {
        let (_, store) = store();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1".into()).unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.set("a", "2".into()).unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_expiry() {
        let (clock, store) = store();
        store.set("a", "1".into()).unwrap();
        assert!(store.expire("a", Duration::from_secs(60)).unwrap());
        assert!(!store.expire("missing", Duration::from_secs(60)).unwrap());

        clock.advance(chrono::Duration::seconds(59));
        assert!(store.get("a").unwrap().is_some());

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(store.get("a").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_keeps_expiry() {
        let (clock, store) = store();
        store.set("a", "1".into()).unwrap();
        store.expire("a", Duration::from_secs(10)).unwrap();

        clock.advance(chrono::Duration::seconds(5));
        store.set("a", "2".into()).unwrap();
        assert!(store.compare_and_swap("a", "2", "3".into()).unwrap());

        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_set_if_absent() {
        let (clock, store) = store();
        assert!(store.set_if_absent("a", "1".into()).unwrap());
        assert!(!store.set_if_absent("a", "2".into()).unwrap());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.expire("a", Duration::from_secs(1)).unwrap();
        clock.advance(chrono::Duration::seconds(1));
        assert!(store.set_if_absent("a", "3".into()).unwrap());
    }

    #[test]
    fn test_set_if_absent_with_ttl() {
        let (clock, store) = store();
        assert!(store.set_if_absent_with_ttl("a", "1".into(), Duration::from_secs(10)).unwrap());
        assert!(!store.set_if_absent_with_ttl("a", "2".into(), Duration::from_secs(10)).unwrap());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        clock.advance(chrono::Duration::seconds(10));
        assert_eq!(store.get("a").unwrap(), None);
        assert!(store.set_if_absent_with_ttl("a", "3".into(), Duration::from_secs(10)).unwrap());
    }

    #[test]
    fn test_compare_and_swap() {
        let (_, store) = store();
        assert!(!store.compare_and_swap("a", "x", "y".into()).unwrap());

        store.set("a", "x".into()).unwrap();
        assert!(!store.compare_and_swap("a", "stale", "y".into()).unwrap());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("x"));

        assert!(store.compare_and_swap("a", "x", "y".into()).unwrap());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("y"));
    }

    #[test]
    fn test_purge_expired() {
        let (clock, store) = store();
        store.set("keep", "1".into()).unwrap();
        store.set("drop", "1".into()).unwrap();
        store.expire("drop", Duration::from_secs(1)).unwrap();

        clock.advance(chrono::Duration::seconds(2));
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }
}
