//! Content-addressed keys for the meta store and the entity store.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Prefix of metadata-list keys.
const META_TAG: &str = "md";
/// Prefix of entity (body) keys.
const ENTITY_TAG: &str = "en";
/// Prefix of single-flight lock keys.
const LOCK_TAG: &str = "lk";

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Key of the metadata list for one request URI: `"md"` + hex SHA-256 of the URI.
///
/// # Examples
///
/// ```
/// use rttp_cache::cache::CacheKey;
///
/// let key = CacheKey::for_uri("http://example.com/a");
/// assert!(key.as_str().starts_with("md"));
/// assert_eq!(key.as_str().len(), 66);
/// assert_eq!(key, CacheKey::for_uri("http://example.com/a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key from an already-normalized URI. No further
    /// normalization is applied.
    pub fn for_uri(uri: &str) -> Self {
        Self(format!("{META_TAG}{}", sha256_hex(uri.as_bytes())))
    }

    /// Returns the key as stored in the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the single-flight lock guarding this cache key.
    pub(crate) fn lock_key(&self) -> String {
        format!("{LOCK_TAG}{}", &self.0[META_TAG.len()..])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of a stored body: `"en"` + hex SHA-256 of the body bytes.
///
/// Identical bodies share one digest, so the entity store deduplicates them.
///
/// # Examples
///
/// ```
/// use rttp_cache::cache::ContentDigest;
///
/// let digest = ContentDigest::of(b"hello");
/// assert_eq!(
///     digest.as_str(),
///     "en2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Digests a response body.
    pub fn of(body: &[u8]) -> Self {
        Self(format!("{ENTITY_TAG}{}", sha256_hex(body)))
    }

    /// Returns the digest as stored in the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable() {
        assert_eq!(CacheKey::for_uri("http://h/a"), CacheKey::for_uri("http://h/a"));
    }

    #[test]
    fn key_differs_per_uri() {
        assert_ne!(CacheKey::for_uri("http://h/a"), CacheKey::for_uri("https://h/a"));
    }

    #[test]
    fn key_format() {
        let key = CacheKey::for_uri("/a");
        let (tag, hash) = key.as_str().split_at(2);
        assert_eq!(tag, "md");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn lock_key_shares_hash() {
        let key = CacheKey::for_uri("/a");
        let lock = key.lock_key();
        assert!(lock.starts_with("lk"));
        assert_eq!(&lock[2..], &key.as_str()[2..]);
    }

    #[test]
    fn identical_bodies_share_digest() {
        assert_eq!(ContentDigest::of(b"body"), ContentDigest::of(b"body"));
        assert_ne!(ContentDigest::of(b"body"), ContentDigest::of(b"other"));
    }

    #[test]
    fn empty_body_digest() {
        assert_eq!(
            ContentDigest::of(b"").as_str(),
            "ene3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
