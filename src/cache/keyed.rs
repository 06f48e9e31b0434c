//! A request paired with its lazily computed cache key.

use std::cell::OnceCell;

use super::key::CacheKey;
use crate::http::Request;

/// Borrowed request plus a memo of its [`CacheKey`].
///
/// The kernel builds one per processing pass and hands the same value to
/// `lookup`, `write`, `invalidate` and the lock calls, so the URI is hashed at
/// most once. Because it only borrows the request, the memo cannot outlive it.
///
/// # Examples
///
/// ```
/// use rttp_cache::cache::{CacheKey, KeyedRequest};
/// use rttp_cache::http::Request;
///
/// let request = Request::get("http://example.com/a");
/// let keyed = KeyedRequest::new(&request);
/// assert_eq!(keyed.key(), &CacheKey::for_uri("http://example.com/a"));
/// ```
#[derive(Debug)]
pub struct KeyedRequest<'a> {
    request: &'a Request,
    key: OnceCell<CacheKey>,
}

impl<'a> KeyedRequest<'a> {
    /// Wraps `request`; the key is computed on first use.
    pub fn new(request: &'a Request) -> Self {
        Self {
            request,
            key: OnceCell::new(),
        }
    }

    /// Wraps `request` with a key the caller already computed.
    pub fn with_key(request: &'a Request, key: CacheKey) -> Self {
        Self {
            request,
            key: OnceCell::from(key),
        }
    }

    /// The cache key of the request URI.
    pub fn key(&self) -> &CacheKey {
        self.key
            .get_or_init(|| CacheKey::for_uri(self.request.uri()))
    }

    /// The wrapped request.
    pub fn request(&self) -> &'a Request {
        self.request
    }
}

impl<'a> From<&'a Request> for KeyedRequest<'a> {
    fn from(request: &'a Request) -> Self {
        Self::new(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_computed_once() {
        let request = Request::get("http://h/a");
        let keyed = KeyedRequest::new(&request);
        let first: *const CacheKey = keyed.key();
        let second: *const CacheKey = keyed.key();
        assert_eq!(first, second);
    }

    #[test]
    fn preset_key_is_used_verbatim() {
        let request = Request::get("http://h/a");
        let preset = CacheKey::for_uri("http://h/b");
        let keyed = KeyedRequest::with_key(&request, preset.clone());
        assert_eq!(keyed.key(), &preset);
    }
}
