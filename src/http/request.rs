//! HTTP/1.1 request model, parsed with the [`httparse`] crate or built directly.

use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete — more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),
}

/// An HTTP request as seen by the cache store.
///
/// The store only cares about the absolute URI (the cache key is derived from
/// it) and the header fields (Vary matching runs against them).
///
/// # Examples
///
/// ```
/// use rttp_cache::http::{Method, Request};
///
/// let raw = b"GET /hello?name=world HTTP/1.1\r\nHost: localhost\r\nAccept: text/html\r\n\r\n";
/// let (request, _offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method(), &Method::Get);
/// assert_eq!(request.uri(), "http://localhost/hello?name=world");
/// assert_eq!(request.headers().get("accept"), Some("text/html"));
///
/// let built = Request::get("https://example.com/a").header("Accept", "text/html");
/// assert_eq!(built.uri(), "https://example.com/a");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    headers: Headers,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Creates a request for `uri` with no headers.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Headers::new(),
        }
    }

    /// Shorthand for a `GET` request, the shape of most cacheable traffic.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::Get, uri)
    }

    /// Appends a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Parse a raw HTTP/1.1 request from a byte slice.
    ///
    /// The request target is made absolute with the `Host` header and an
    /// `http` scheme; targets that are already absolute are kept as-is.
    /// Returns the parsed `Request` and the byte offset at which the body begins
    /// in `buf` (i.e. immediately after the `\r\n\r\n` header terminator).
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`] — more data is needed to complete the request headers.
    /// - [`RequestError::Parse`] — the data is malformed and cannot be parsed.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        // A complete parse always carries both.
        let (Some(method), Some(target)) = (raw_req.method, raw_req.path) else {
            return Err(RequestError::Incomplete);
        };
        let method = match method.parse::<Method>() {
            Ok(method) => method,
            Err(never) => match never {},
        };

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        let uri = match header_map.get("host") {
            Some(host) if target.starts_with('/') => format!("http://{host}{target}"),
            _ => target.to_owned(),
        };

        Ok((
            Self {
                method,
                uri,
                headers: header_map,
            },
            body_offset,
        ))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute request URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}
