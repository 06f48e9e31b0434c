//! The HTTP cache store facade.
//!
//! Storage layout over the backend's flat namespace:
//!
//! | Key                | Value                                   | TTL                                  |
//! |--------------------|-----------------------------------------|--------------------------------------|
//! | `md` + sha256(uri) | encoded [`MetadataList`], newest first  | freshness lifetime, else default     |
//! | `en` + sha256(body)| response body, written once             | freshness lifetime + 1, else 1       |
//! | `lk` + sha256(uri) | lock marker (only with a backend lock)  | [`LockStrategy`] TTL                 |
//!
//! Metadata updates are read-modify-write without compare-and-swap: two
//! writers racing on one key resolve last-writer-wins.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{Level, debug, info, warn};

use super::backend::{BackendError, CacheBackend};
use super::key::{CacheKey, ContentDigest};
use super::keyed::KeyedRequest;
use super::lock::LockStrategy;
use super::log::{describe_fragment, describe_vary};
use super::metadata::{
    self, CONTENT_DIGEST_HEADER, MetadataEntry, MetadataList, ResponseSnapshot,
};
use super::vary::requests_match;
use crate::http::{Request, Response};

/// Errors surfaced by the cache store.
///
/// Only writes fail loudly: a half-written cache is worse than none. Read
/// problems degrade to a miss and are logged instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to store the entity {digest}: {source}")]
    EntityWrite {
        digest: String,
        #[source]
        source: BackendError,
    },

    #[error("unable to store the metadata {key}: {source}")]
    MetadataWrite {
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("unable to encode the metadata: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("lock operation on {key} failed: {source}")]
    Lock {
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("unable to purge {key}: {source}")]
    Purge {
        key: String,
        #[source]
        source: BackendError,
    },
}

/// Behavior knobs fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Response headers never persisted (case-insensitive).
    pub private_headers: Vec<String>,
    /// Behavior of `lock` / `unlock` / `is_locked`.
    pub lock: LockStrategy,
    /// Drop a metadata entry on lookup when its body is gone from the backend.
    pub purge_orphaned_metadata: bool,
    /// Emit hit / miss / write events.
    pub log_events: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            private_headers: vec!["Set-Cookie".to_owned()],
            lock: LockStrategy::Disabled,
            purge_orphaned_metadata: false,
            log_events: true,
        }
    }
}

/// HTTP response cache over a key-value blob backend.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use rttp_cache::cache::{CacheStore, KeyedRequest, MemoryBackend};
/// use rttp_cache::http::{Request, Response, StatusCode};
///
/// let store = CacheStore::new(Arc::new(MemoryBackend::new()));
///
/// let request = Request::get("http://example.com/a");
/// let keyed = KeyedRequest::new(&request);
/// let mut response = Response::new(StatusCode::Ok)
///     .header("Cache-Control", "max-age=60")
///     .body("hello");
///
/// store.write(&keyed, &mut response).unwrap();
///
/// let hit = store.lookup(&keyed).unwrap();
/// assert_eq!(hit.content().as_ref(), b"hello");
/// ```
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    options: StoreOptions,
}

impl CacheStore {
    /// Creates a store with default options.
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_options(backend, StoreOptions::default())
    }

    /// Creates a store with explicit options.
    pub fn with_options(backend: Arc<dyn CacheBackend>, options: StoreOptions) -> Self {
        Self { backend, options }
    }

    /// The options this store was built with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Finds the cached response matching `request`.
    ///
    /// The first entry whose stored request matches under that entry's own
    /// Vary wins. `None` when nothing matches, the matched body is no
    /// longer in the entity store, or the stored status code is unsupported.
    /// Only a missing body counts as an orphan.
    pub fn lookup(&self, request: &KeyedRequest<'_>) -> Option<Response> {
        let key = request.key();
        let entries = self.metadata(key);
        if entries.is_empty() {
            return None;
        }

        let current = request.request().headers().to_fields();
        let index = entries.iter().position(|entry| {
            requests_match(&entry.response.vary_spec(), &current, &entry.request)
        })?;
        let entry = &entries[index];

        let Some(body) = self.load_entity(&entry.response.digest) else {
            if let Some((vary, fragment)) = self.annotate(request.request(), &entry.response.vary) {
                info!(uri = request.request().uri(), %fragment, %vary, "http cache miss");
            }
            if self.options.purge_orphaned_metadata {
                self.drop_orphan(key, entries, index);
            }
            return None;
        };

        let Some(response) = entry.response.restore(body) else {
            warn!(
                key = %key,
                status = entry.response.status,
                "cached response has an unsupported status code"
            );
            return None;
        };

        if let Some((vary, fragment)) = self.annotate(request.request(), &entry.response.vary) {
            info!(uri = request.request().uri(), %fragment, %vary, "http cache hit");
        }
        Some(response)
    }

    /// Stores `response` as the representation of `request`.
    ///
    /// The body goes to the entity store under its digest (never
    /// overwritten) for the remaining freshness plus one second, or one
    /// second when the response carries no freshness information. The list
    /// takes the remaining freshness, or the backend default TTL. `response`
    /// is stamped with `X-Content-Digest` and,
    /// unless chunked, a `Content-Length`. Existing entries with the same Vary
    /// whose stored request matches this one are superseded.
    ///
    /// # Errors
    ///
    /// [`StoreError::EntityWrite`] or [`StoreError::MetadataWrite`] when the
    /// backend rejects a put; [`StoreError::Encode`] if the list cannot be
    /// serialized.
    pub fn write(
        &self,
        request: &KeyedRequest<'_>,
        response: &mut Response,
    ) -> Result<CacheKey, StoreError> {
        let key = request.key().clone();
        let stored_env = request.request().headers().to_fields();

        let digest = ContentDigest::of(response.content());
        response
            .headers_mut()
            .set(CONTENT_DIGEST_HEADER, digest.as_str());

        let ttl = response.ttl();
        self.backend
            .put(
                digest.as_str(),
                response.content().clone(),
                Some(seconds(ttl.map_or(1, |ttl| ttl.saturating_add(1)))),
                false,
            )
            .map_err(|source| StoreError::EntityWrite {
                digest: digest.to_string(),
                source,
            })?;

        if !response.headers().contains("transfer-encoding") {
            let length = response.content().len().to_string();
            response.headers_mut().set("Content-Length", length);
        }

        let mut snapshot = ResponseSnapshot::capture(response, digest);
        let vary = snapshot.vary_spec();

        let mut entries: MetadataList = self
            .metadata(&key)
            .into_iter()
            .filter(|entry| {
                entry.response.vary_spec() != vary
                    || !requests_match(&vary, &entry.request, &stored_env)
            })
            .collect();

        snapshot.strip("age");
        for name in &self.options.private_headers {
            snapshot.strip(name);
        }

        if let Some((vary, fragment)) = self.annotate(request.request(), &snapshot.vary) {
            info!(
                uri = request.request().uri(),
                %vary,
                %fragment,
                ttl = ttl.unwrap_or_default(),
                "http cache write"
            );
        }

        entries.insert(
            0,
            MetadataEntry {
                request: stored_env,
                response: snapshot,
            },
        );

        let blob = metadata::encode(&entries)?;
        self.backend
            .put(key.as_str(), blob, ttl.map(seconds), true)
            .map_err(|source| StoreError::MetadataWrite {
                key: key.to_string(),
                source,
            })?;

        Ok(key)
    }

    /// Marks every still-fresh representation of `request` as stale.
    ///
    /// Entries stay in the list; a fresh one is aged to its full lifetime so
    /// its remaining freshness drops to zero. The list is only rewritten if
    /// something changed, and then with the backend's default TTL.
    ///
    /// # Errors
    ///
    /// [`StoreError::MetadataWrite`] when the rewrite is rejected.
    pub fn invalidate(&self, request: &KeyedRequest<'_>) -> Result<(), StoreError> {
        let key = request.key();
        let mut expired = 0usize;

        let entries: MetadataList = self
            .metadata(key)
            .into_iter()
            .map(|mut entry| {
                if let Some(mut response) = entry.response.restore(Bytes::new()) {
                    if response.is_fresh() {
                        response.expire();
                        entry.response =
                            ResponseSnapshot::capture(&response, entry.response.digest.clone());
                        expired += 1;
                    }
                }
                entry
            })
            .collect();

        if expired == 0 {
            return Ok(());
        }

        let blob = metadata::encode(&entries)?;
        self.backend
            .put(key.as_str(), blob, None, true)
            .map_err(|source| StoreError::MetadataWrite {
                key: key.to_string(),
                source,
            })?;

        debug!(uri = request.request().uri(), expired, "http cache invalidate");
        Ok(())
    }

    /// Takes the single-flight lock for `request`.
    ///
    /// Returns `false` if another caller holds it. Always `true` with
    /// [`LockStrategy::Disabled`].
    ///
    /// # Errors
    ///
    /// [`StoreError::Lock`] when the backend fails.
    pub fn lock(&self, request: &KeyedRequest<'_>) -> Result<bool, StoreError> {
        let key = request.key();
        let acquired = self
            .options
            .lock
            .acquire(self.backend.as_ref(), key)
            .map_err(|source| lock_error(key, source))?;
        debug!(uri = request.request().uri(), acquired, "http cache lock");
        Ok(acquired)
    }

    /// Releases the lock for `request`, returning whether one was held.
    ///
    /// # Errors
    ///
    /// [`StoreError::Lock`] when the backend fails.
    pub fn unlock(&self, request: &KeyedRequest<'_>) -> Result<bool, StoreError> {
        let key = request.key();
        self.options
            .lock
            .release(self.backend.as_ref(), key)
            .map_err(|source| lock_error(key, source))
    }

    /// Returns `true` while some caller holds the lock for `request`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Lock`] when the backend fails.
    pub fn is_locked(&self, request: &KeyedRequest<'_>) -> Result<bool, StoreError> {
        let key = request.key();
        self.options
            .lock
            .is_held(self.backend.as_ref(), key)
            .map_err(|source| lock_error(key, source))
    }

    /// Removes the metadata of `url` under both its `http:` and `https:`
    /// spelling. Bodies are left to expire on their own TTL.
    ///
    /// Returns `true` if either variant was cached.
    ///
    /// # Errors
    ///
    /// [`StoreError::Purge`] when a delete fails.
    pub fn purge(&self, url: &str) -> Result<bool, StoreError> {
        let http = match url.strip_prefix("https:") {
            Some(rest) => format!("http:{rest}"),
            None => url.to_owned(),
        };
        let https = match url.strip_prefix("http:") {
            Some(rest) => format!("https:{rest}"),
            None => url.to_owned(),
        };

        let purged_http = self.purge_uri(&http)?;
        let purged_https = self.purge_uri(&https)?;
        Ok(purged_http || purged_https)
    }

    /// Expiry belongs to the backend; nothing to do.
    pub fn cleanup(&self) {}

    /// Decoded metadata list stored under `key`; empty on a miss, a backend
    /// read failure or a corrupt blob.
    pub fn metadata(&self, key: &CacheKey) -> MetadataList {
        match self.backend.get(key.as_str()) {
            Ok(Some(blob)) => metadata::decode(&blob),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "cache metadata read failed");
                Vec::new()
            }
        }
    }

    fn purge_uri(&self, uri: &str) -> Result<bool, StoreError> {
        let synthetic = Request::get(uri);
        let keyed = KeyedRequest::new(&synthetic);
        let key = keyed.key();
        let purged = self
            .backend
            .delete(key.as_str())
            .map_err(|source| StoreError::Purge {
                key: key.to_string(),
                source,
            })?;
        debug!(uri, purged, "http cache purge");
        Ok(purged)
    }

    fn load_entity(&self, digest: &ContentDigest) -> Option<Bytes> {
        self.backend
            .get(digest.as_str())
            .unwrap_or_else(|e| {
                warn!(digest = %digest, error = %e, "cache entity read failed");
                None
            })
    }

    fn drop_orphan(&self, key: &CacheKey, mut entries: MetadataList, index: usize) {
        let orphan = entries.remove(index);
        let result = if entries.is_empty() {
            self.backend.delete(key.as_str()).map(drop)
        } else {
            match metadata::encode(&entries) {
                Ok(blob) => self.backend.put(key.as_str(), blob, None, true),
                Err(e) => {
                    warn!(key = %key, error = %e, "cannot re-encode cache metadata");
                    return;
                }
            }
        };

        match result {
            Ok(()) => warn!(key = %key, digest = %orphan.response.digest, "dropped cache metadata with missing entity"),
            Err(e) => warn!(key = %key, error = %e, "failed to drop orphaned cache metadata"),
        }
    }

    /// Log annotations, or `None` when the event would not be emitted.
    fn annotate(&self, request: &Request, vary: &[String]) -> Option<(String, String)> {
        if !self.options.log_events || !tracing::enabled!(Level::INFO) {
            return None;
        }
        Some((
            describe_vary(vary, request.headers()),
            describe_fragment(request.uri()),
        ))
    }
}

fn seconds(ttl: i64) -> Duration {
    Duration::from_secs(u64::try_from(ttl).unwrap_or(0))
}

fn lock_error(key: &CacheKey, source: BackendError) -> StoreError {
    StoreError::Lock {
        key: key.to_string(),
        source,
    }
}
