//! Typed metadata entries and the codec for the meta store.
//!
//! One cache key maps to a single blob holding a [`MetadataList`]: the
//! cached representations of one URI, newest first. Each entry pairs the
//! request headers captured at write time with a snapshot of the response
//! headers that points into the entity store.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::key::ContentDigest;
use crate::http::{HeaderFields, Headers, Response, StatusCode};

/// Header that carries the entity-store digest on responses handed back to the kernel.
pub const CONTENT_DIGEST_HEADER: &str = "X-Content-Digest";

/// Ordered list of cached representations for one URI, newest first.
pub type MetadataList = Vec<MetadataEntry>;

/// Persisted view of a response: everything except the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// Numeric status code.
    pub status: u16,
    /// Response header fields, lower-cased, without the digest header.
    pub headers: HeaderFields,
    /// Values of the response's `Vary` header(s).
    #[serde(default)]
    pub vary: Vec<String>,
    /// Entity-store key of the body.
    pub digest: ContentDigest,
}

impl ResponseSnapshot {
    /// Captures the headers and status of `response`.
    pub fn capture(response: &Response, digest: ContentDigest) -> Self {
        let mut headers = response.headers().to_fields();
        headers.shift_remove(&CONTENT_DIGEST_HEADER.to_ascii_lowercase());
        let vary = response
            .headers()
            .get_all("vary")
            .map(str::to_owned)
            .collect();
        Self {
            status: response.status().as_u16(),
            headers,
            vary,
            digest,
        }
    }

    /// Drops a header field (case-insensitive) from the snapshot.
    pub fn strip(&mut self, name: &str) {
        self.headers.shift_remove(&name.to_ascii_lowercase());
    }

    /// All `Vary` values joined into one comma-separated list.
    pub fn vary_spec(&self) -> String {
        self.vary.join(", ")
    }

    /// Rebuilds a response around `body`, re-stamping the digest header.
    ///
    /// Returns `None` if the stored status code is not one this crate models.
    pub fn restore(&self, body: Bytes) -> Option<Response> {
        let status = StatusCode::from_u16(self.status)?;
        let mut headers = Headers::from_fields(&self.headers);
        headers.set(CONTENT_DIGEST_HEADER, self.digest.as_str());
        Some(Response::from_parts(status, headers, body))
    }
}

/// One cached representation: request snapshot plus response snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Request header fields captured when the representation was written.
    pub request: HeaderFields,
    /// The stored response headers.
    pub response: ResponseSnapshot,
}

/// Serializes a metadata list into a backend blob.
///
/// # Errors
///
/// Returns the serializer error; with the types above this only happens on
/// allocation failure inside `serde_json`.
pub fn encode(entries: &[MetadataEntry]) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(entries).map(Bytes::from)
}

/// Deserializes a backend blob. A corrupt blob decodes to an empty list.
pub fn decode(blob: &[u8]) -> MetadataList {
    serde_json::from_slice(blob).unwrap_or_else(|e| {
        warn!(error = %e, "discarding undecodable cache metadata");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> MetadataEntry {
        let request = HeaderFields::from([("accept".to_owned(), vec!["text/html".to_owned()])]);
        let response = Response::new(StatusCode::Ok)
            .header("Vary", "Accept")
            .header("X-Content-Digest", "stale")
            .header("Content-Type", "text/html");
        MetadataEntry {
            request,
            response: ResponseSnapshot::capture(&response, ContentDigest::of(b"hi")),
        }
    }

    #[test]
    fn capture_extracts_vary_and_drops_digest_header() {
        let entry = sample_entry();
        assert_eq!(entry.response.vary, vec!["Accept"]);
        assert_eq!(entry.response.vary_spec(), "Accept");
        assert!(!entry.response.headers.contains_key("x-content-digest"));
        assert_eq!(entry.response.status, 200);
    }

    #[test]
    fn restore_stamps_digest_header() {
        let entry = sample_entry();
        let response = entry.response.restore(Bytes::from_static(b"hi")).unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(
            response.headers().get("x-content-digest"),
            Some(ContentDigest::of(b"hi").as_str())
        );
        assert_eq!(response.headers().get("content-type"), Some("text/html"));
        assert_eq!(response.content().as_ref(), b"hi");
    }

    #[test]
    fn restore_keeps_header_order() {
        let response = Response::new(StatusCode::Ok)
            .header("Server", "rttp")
            .header("Content-Type", "text/html")
            .header("Cache-Control", "max-age=60");
        let snapshot = ResponseSnapshot::capture(&response, ContentDigest::of(b""));
        let restored = snapshot.restore(Bytes::new()).unwrap();
        let names: Vec<_> = restored.headers().iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["server", "content-type", "cache-control", "X-Content-Digest"]
        );
    }

    #[test]
    fn restore_rejects_unknown_status() {
        let mut entry = sample_entry();
        entry.response.status = 299;
        assert!(entry.response.restore(Bytes::new()).is_none());
    }

    #[test]
    fn strip_is_case_insensitive() {
        let mut entry = sample_entry();
        entry.response.strip("Content-Type");
        assert!(!entry.response.headers.contains_key("content-type"));
    }

    #[test]
    fn codec_preserves_order() {
        let first = sample_entry();
        let mut second = sample_entry();
        second.response.status = 404;

        let blob = encode(&[first.clone(), second.clone()]).unwrap();
        assert_eq!(decode(&blob), vec![first, second]);
    }

    #[test]
    fn corrupt_blob_decodes_empty() {
        assert!(decode(b"not json").is_empty());
        assert!(decode(b"{\"request\":{}}").is_empty());
        assert!(decode(b"").is_empty());
    }
}
