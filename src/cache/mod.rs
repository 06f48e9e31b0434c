//! HTTP response cache store over a key-value blob backend.
//!
//! The backend only offers `get` / `has` / `put` / `delete` with a TTL; this
//! module layers the HTTP cache semantics on top of it:
//!
//! - [`CacheKey`] / [`ContentDigest`] — content-addressed keys for metadata
//!   lists and bodies
//! - [`requests_match`] — Vary-based content negotiation
//! - [`metadata`] — typed request/response snapshots and their codec
//! - [`KeyedRequest`] — a request with its memoized cache key
//! - [`CacheStore`] — lookup, write, invalidate, purge and locking
//!
//! Bodies are stored once per digest and never overwritten, so identical
//! bodies are deduplicated and concurrent writers of the same body converge.

pub mod backend;
pub mod key;
pub mod keyed;
pub mod lock;
pub mod log;
pub mod metadata;
pub mod store;
pub mod vary;

pub use backend::{BackendError, CacheBackend, MemoryBackend};
pub use key::{CacheKey, ContentDigest};
pub use keyed::KeyedRequest;
pub use lock::LockStrategy;
pub use metadata::{MetadataEntry, MetadataList, ResponseSnapshot};
pub use store::{CacheStore, StoreError, StoreOptions};
pub use vary::requests_match;
