//! HTTP/1.1 response model with freshness arithmetic.
//!
//! A [`Response`] is what the kernel hands to the cache store on write and what
//! the store hands back on a hit. Freshness follows RFC 9111 §4.2: the
//! lifetime comes from `s-maxage`, `max-age` or `Expires`, and the current age
//! from `Age` or `Date`.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::cache_control::{CacheControl, delta_seconds, parse_http_date};
use super::{Headers, StatusCode};

/// An HTTP/1.1 response.
///
/// # Examples
///
/// ```
/// use rttp_cache::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok)
///     .header("Cache-Control", "max-age=60")
///     .body("hello");
///
/// assert_eq!(response.content().as_ref(), b"hello");
/// assert_eq!(response.max_age(), Some(60));
/// assert!(response.is_fresh());
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Assembles a response from already-built parts.
    pub fn from_parts(status: StatusCode, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the response body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the response headers for in-place decoration.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Returns the response body.
    pub fn content(&self) -> &Bytes {
        &self.body
    }

    /// Number of seconds after which the response is no longer fresh, measured
    /// from its generation.
    ///
    /// `s-maxage` wins over `max-age`, which wins over `Expires − Date`. An
    /// unparseable `Expires` counts as already expired. `None` when the
    /// response carries no freshness information at all.
    pub fn max_age(&self) -> Option<i64> {
        self.max_age_at(Utc::now())
    }

    /// Current age of the response in seconds.
    pub fn age(&self) -> i64 {
        self.age_at(Utc::now())
    }

    /// Remaining freshness in seconds; negative once the response is stale.
    pub fn ttl(&self) -> Option<i64> {
        self.ttl_at(Utc::now())
    }

    /// Returns `true` while the remaining freshness is positive.
    pub fn is_fresh(&self) -> bool {
        self.ttl().is_some_and(|ttl| ttl > 0)
    }

    /// Marks a fresh response as stale by aging it to its full lifetime.
    ///
    /// Stale responses are left untouched.
    pub fn expire(&mut self) {
        let now = Utc::now();
        if !self.ttl_at(now).is_some_and(|ttl| ttl > 0) {
            return;
        }
        if let Some(max_age) = self.max_age_at(now) {
            self.headers.set("Age", max_age.to_string());
            self.headers.remove("Expires");
        }
    }

    fn cache_control(&self) -> CacheControl {
        let joined = self
            .headers
            .get_all("cache-control")
            .collect::<Vec<_>>()
            .join(", ");
        CacheControl::parse(&joined)
    }

    fn date_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.headers
            .get("date")
            .and_then(parse_http_date)
            .unwrap_or(now)
    }

    fn max_age_at(&self, now: DateTime<Utc>) -> Option<i64> {
        let cc = self.cache_control();
        if let Some(secs) = cc.seconds("s-maxage").or_else(|| cc.seconds("max-age")) {
            return Some(secs);
        }

        let expires = self.headers.get("expires")?;
        Some(match parse_http_date(expires) {
            Some(expires) => (expires - self.date_at(now)).num_seconds(),
            None => 0,
        })
    }

    /// A malformed or negative `Age` is ignored in favor of `Date`.
    fn age_at(&self, now: DateTime<Utc>) -> i64 {
        if let Some(age) = self.headers.get("age").and_then(delta_seconds) {
            return age;
        }
        (now - self.date_at(now)).num_seconds().max(0)
    }

    fn ttl_at(&self, now: DateTime<Utc>) -> Option<i64> {
        self.max_age_at(now)
            .map(|max_age| max_age.saturating_sub(self.age_at(now)))
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::cache_control::MAX_DELTA_SECONDS;

    #[test]
    fn no_freshness_information() {
        let r = Response::new(StatusCode::Ok).body("x");
        assert_eq!(r.max_age(), None);
        assert_eq!(r.ttl(), None);
        assert!(!r.is_fresh());
    }

    #[test]
    fn s_maxage_wins_over_max_age() {
        let r = Response::new(StatusCode::Ok).header("Cache-Control", "max-age=10, s-maxage=99");
        assert_eq!(r.max_age(), Some(99));
    }

    #[test]
    fn age_header_reduces_ttl() {
        let r = Response::new(StatusCode::Ok)
            .header("Cache-Control", "max-age=100")
            .header("Age", "40");
        assert_eq!(r.age(), 40);
        assert_eq!(r.ttl(), Some(60));
    }

    #[test]
    fn negative_age_is_ignored() {
        let r = Response::new(StatusCode::Ok)
            .header("Cache-Control", "max-age=9223372036854775800")
            .header("Age", "-100");
        assert_eq!(r.age(), 0);
        assert_eq!(r.max_age(), Some(MAX_DELTA_SECONDS));
        assert_eq!(r.ttl(), Some(MAX_DELTA_SECONDS));
        assert!(r.is_fresh());
    }

    #[test]
    fn expires_relative_to_date() {
        let r = Response::new(StatusCode::Ok)
            .header("Date", "Sun, 06 Nov 1994 08:49:37 GMT")
            .header("Expires", "Sun, 06 Nov 1994 08:50:37 GMT");
        assert_eq!(r.max_age(), Some(60));
        // Date lies decades in the past, so the response is long stale.
        assert!(!r.is_fresh());
    }

    #[test]
    fn invalid_expires_is_already_expired() {
        let r = Response::new(StatusCode::Ok).header("Expires", "0");
        assert_eq!(r.max_age(), Some(0));
        assert!(!r.is_fresh());
    }

    #[test]
    fn expire_ages_fresh_response_to_zero_ttl() {
        let mut r = Response::new(StatusCode::Ok)
            .header("Cache-Control", "max-age=300")
            .header("Expires", "Fri, 01 Jan 2100 00:00:00 GMT");
        r.expire();
        assert_eq!(r.headers().get("age"), Some("300"));
        assert!(!r.headers().contains("expires"));
        assert_eq!(r.ttl(), Some(0));
        assert!(!r.is_fresh());
    }

    #[test]
    fn expire_leaves_stale_response_alone() {
        let mut r = Response::new(StatusCode::Ok)
            .header("Cache-Control", "max-age=10")
            .header("Age", "20");
        r.expire();
        assert_eq!(r.headers().get("age"), Some("20"));
    }
}
