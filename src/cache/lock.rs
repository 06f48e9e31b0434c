//! Single-flight locking over the backend.

use std::time::Duration;

use bytes::Bytes;

use super::backend::{BackendError, CacheBackend};
use super::key::CacheKey;

/// How `lock` / `unlock` / `is_locked` behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStrategy {
    /// No mutual exclusion: `lock` and `unlock` always succeed and nothing is
    /// ever reported as locked.
    #[default]
    Disabled,
    /// An acquire-if-absent key per cache key. `ttl` bounds how long a lock
    /// outlives a holder that never unlocks.
    Backend { ttl: Duration },
}

impl LockStrategy {
    pub(crate) fn acquire(
        self,
        backend: &dyn CacheBackend,
        key: &CacheKey,
    ) -> Result<bool, BackendError> {
        match self {
            Self::Disabled => Ok(true),
            Self::Backend { ttl } => {
                backend.add(&key.lock_key(), Bytes::from_static(b"1"), Some(ttl))
            }
        }
    }

    pub(crate) fn release(
        self,
        backend: &dyn CacheBackend,
        key: &CacheKey,
    ) -> Result<bool, BackendError> {
        match self {
            Self::Disabled => Ok(true),
            Self::Backend { .. } => backend.delete(&key.lock_key()),
        }
    }

    pub(crate) fn is_held(
        self,
        backend: &dyn CacheBackend,
        key: &CacheKey,
    ) -> Result<bool, BackendError> {
        match self {
            Self::Disabled => Ok(false),
            Self::Backend { .. } => backend.has(&key.lock_key()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;

    #[test]
    fn disabled_strategy_never_excludes() {
        let backend = MemoryBackend::new();
        let key = CacheKey::for_uri("/a");
        let lock = LockStrategy::Disabled;
        assert!(lock.acquire(&backend, &key).unwrap());
        assert!(lock.acquire(&backend, &key).unwrap());
        assert!(!lock.is_held(&backend, &key).unwrap());
        assert!(lock.release(&backend, &key).unwrap());
        assert!(backend.is_empty());
    }

    #[test]
    fn backend_strategy_is_exclusive() {
        let backend = MemoryBackend::new();
        let key = CacheKey::for_uri("/a");
        let lock = LockStrategy::Backend {
            ttl: Duration::from_secs(30),
        };
        assert!(lock.acquire(&backend, &key).unwrap());
        assert!(!lock.acquire(&backend, &key).unwrap());
        assert!(lock.is_held(&backend, &key).unwrap());
        assert!(lock.release(&backend, &key).unwrap());
        assert!(!lock.is_held(&backend, &key).unwrap());
        assert!(!lock.release(&backend, &key).unwrap());
    }

    #[test]
    fn lock_expires_with_ttl() {
        let backend = MemoryBackend::new();
        let key = CacheKey::for_uri("/a");
        let lock = LockStrategy::Backend { ttl: Duration::ZERO };
        assert!(lock.acquire(&backend, &key).unwrap());
        assert!(!lock.is_held(&backend, &key).unwrap());
        assert!(lock.acquire(&backend, &key).unwrap());
    }
}
