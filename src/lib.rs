//! # rttp-cache
//!
//! HTTP response cache store for a caching reverse proxy, built on nothing
//! more than a key-value blob backend with TTLs.
//!
//! The proxy kernel decides what is cacheable and whether a cached response
//! is still fresh; this crate persists, retrieves, invalidates and purges
//! responses, handling `Vary` negotiation, content-addressed body storage and
//! private-header stripping on the way.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rttp_cache::{CacheStore, KeyedRequest, MemoryBackend, Request, Response, StatusCode};
//!
//! let store = CacheStore::new(Arc::new(MemoryBackend::new()));
//!
//! let request = Request::get("https://example.com/a").header("Accept-Language", "en");
//! let keyed = KeyedRequest::new(&request);
//!
//! if store.lookup(&keyed).is_none() {
//!     let mut response = Response::new(StatusCode::Ok)
//!         .header("Cache-Control", "max-age=60")
//!         .header("Vary", "Accept-Language")
//!         .body("hello");
//!     store.write(&keyed, &mut response)?;
//! }
//!
//! let cached = store.lookup(&keyed).expect("just written");
//! assert_eq!(cached.content().as_ref(), b"hello");
//! # Ok::<(), rttp_cache::StoreError>(())
//! ```

pub mod cache;
pub mod config;
pub mod http;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{
    BackendError, CacheBackend, CacheKey, CacheStore, ContentDigest, KeyedRequest, LockStrategy,
    MemoryBackend, StoreError, StoreOptions,
};
pub use config::{ConfigError, StoreConfig};
pub use http::{Headers, Method, Request, Response, StatusCode};
