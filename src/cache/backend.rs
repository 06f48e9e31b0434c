//! Key-value blob backend capability.
//!
//! The store needs nothing beyond `get` / `has` / `put` / `delete` with a
//! per-key TTL, over a flat key namespace. [`MemoryBackend`] is the in-process
//! implementation; anything else (Redis, memcached, a disk cache) plugs in by
//! implementing [`CacheBackend`].

use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;

/// Errors reported by a [`CacheBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend rejected key {key}: {reason}")]
    Rejected { key: String, reason: String },
}

/// The storage primitive underneath the cache store.
///
/// `ttl = None` means "the backend's default lifetime". A zero TTL expires the
/// value immediately.
pub trait CacheBackend: Send + Sync {
    /// Fetches the value stored under `key`, or `None` on a miss.
    fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError>;

    /// Returns `true` if a live value is stored under `key`.
    fn has(&self, key: &str) -> Result<bool, BackendError>;

    /// Stores `value` under `key`.
    ///
    /// With `overwrite = false` an existing live value is kept and the call
    /// still succeeds.
    fn put(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        overwrite: bool,
    ) -> Result<(), BackendError>;

    /// Removes `key`, returning `true` if a live value was removed.
    fn delete(&self, key: &str) -> Result<bool, BackendError>;

    /// Stores `value` only if `key` is absent, returning `true` if this call
    /// inserted it.
    ///
    /// The default implementation is a non-atomic `has` + `put`; backends
    /// with a native conditional write should override it.
    fn add(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<bool, BackendError> {
        if self.has(key)? {
            return Ok(false);
        }
        self.put(key, value, ttl, false)?;
        Ok(true)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Thread-safe in-memory backend with per-key expiry.
///
/// Expired values are dropped lazily when touched, or in bulk by
/// [`evict_expired`](Self::evict_expired).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use bytes::Bytes;
/// use rttp_cache::cache::{CacheBackend, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// backend.put("k", Bytes::from_static(b"v"), Some(Duration::from_secs(60)), true).unwrap();
/// assert_eq!(backend.get("k").unwrap().as_deref(), Some(&b"v"[..]));
/// assert!(backend.delete("k").unwrap());
/// assert!(!backend.has("k").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slots: DashMap<String, Slot>,
    default_ttl: Option<Duration>,
}

impl MemoryBackend {
    /// Creates a backend whose values live forever unless given a TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that applies `default_ttl` to writes without a TTL.
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            default_ttl: Some(default_ttl),
        }
    }

    /// Drops every expired value, returning how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.is_live(now));
        before - self.slots.len()
    }

    /// Number of stored values, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A TTL past the representable `Instant` range never expires.
    fn slot(&self, value: Bytes, ttl: Option<Duration>) -> Slot {
        Slot {
            value,
            expires_at: ttl
                .or(self.default_ttl)
                .and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let now = Instant::now();
        if let Some(slot) = self.slots.get(key) {
            if slot.is_live(now) {
                return Ok(Some(slot.value.clone()));
            }
        }
        self.slots.remove_if(key, |_, slot| !slot.is_live(now));
        Ok(None)
    }

    fn has(&self, key: &str) -> Result<bool, BackendError> {
        Ok(self.get(key)?.is_some())
    }

    fn put(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        overwrite: bool,
    ) -> Result<(), BackendError> {
        if overwrite {
            self.slots.insert(key.to_owned(), self.slot(value, ttl));
        } else {
            self.add(key, value, ttl)?;
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, BackendError> {
        let now = Instant::now();
        Ok(self
            .slots
            .remove(key)
            .is_some_and(|(_, slot)| slot.is_live(now)))
    }

    fn add(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<bool, BackendError> {
        let now = Instant::now();
        match self.slots.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return Ok(false);
                }
                occupied.insert(self.slot(value, ttl));
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(self.slot(value, ttl));
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn bytes(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn put_overwrites_by_default() {
        let backend = MemoryBackend::new();
        backend.put("k", bytes("a"), None, true).unwrap();
        backend.put("k", bytes("b"), None, true).unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(bytes("b")));
    }

    #[test]
    fn non_overwriting_put_keeps_first_value() {
        let backend = MemoryBackend::new();
        backend.put("k", bytes("first"), None, false).unwrap();
        backend.put("k", bytes("second"), None, false).unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(bytes("first")));
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let backend = MemoryBackend::new();
        backend
            .put("k", bytes("v"), Some(Duration::ZERO), true)
            .unwrap();
        assert!(!backend.has("k").unwrap());
        assert!(backend.is_empty());
    }

    #[test]
    fn default_ttl_applies_without_explicit_ttl() {
        let backend = MemoryBackend::with_default_ttl(Duration::from_millis(20));
        backend.put("k", bytes("v"), None, true).unwrap();
        assert!(backend.has("k").unwrap());
        thread::sleep(Duration::from_millis(40));
        assert!(!backend.has("k").unwrap());
    }

    #[test]
    fn non_overwriting_put_replaces_expired_value() {
        let backend = MemoryBackend::new();
        backend
            .put("k", bytes("old"), Some(Duration::ZERO), true)
            .unwrap();
        backend.put("k", bytes("new"), None, false).unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(bytes("new")));
    }

    #[test]
    fn add_reports_whether_it_inserted() {
        let backend = MemoryBackend::new();
        assert!(backend.add("lock", bytes("1"), None).unwrap());
        assert!(!backend.add("lock", bytes("1"), None).unwrap());
        assert!(backend.delete("lock").unwrap());
        assert!(backend.add("lock", bytes("1"), None).unwrap());
    }

    #[test]
    fn delete_missing_key() {
        let backend = MemoryBackend::new();
        assert!(!backend.delete("nope").unwrap());
    }

    #[test]
    fn huge_ttl_never_expires() {
        let backend = MemoryBackend::new();
        backend
            .put("k", bytes("v"), Some(Duration::MAX), true)
            .unwrap();
        assert!(backend.has("k").unwrap());
        assert_eq!(backend.evict_expired(), 0);
    }

    #[test]
    fn evict_expired_sweeps() {
        let backend = MemoryBackend::new();
        backend
            .put("gone", bytes("v"), Some(Duration::ZERO), true)
            .unwrap();
        backend.put("kept", bytes("v"), None, true).unwrap();
        assert_eq!(backend.evict_expired(), 1);
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn concurrent_adds_elect_one_winner() {
        let backend = MemoryBackend::new();
        let winners = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| backend.add("lock", bytes("1"), None).unwrap()))
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().ok())
                .filter(|won| *won)
                .count()
        });
        assert_eq!(winners, 1);
    }
}
