//! Information about the inbound request as the transport saw it.
//!
//! The method is kept as the raw string the client sent; it is validated against
//! the closed [`Method`](super::Method) set only when the pipeline builds its
//! envelope, so an unknown method surfaces as a request failure.

use thiserror::Error;

use super::Headers;

/// Errors that can occur while reading a raw HTTP/1.x request head.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request head is incomplete: more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

static NO_HEADERS: Headers = Headers::new();

/// Accessors the pipeline needs from whatever represents the current request.
pub trait ProvidesRequestInfo: Send + Sync {
    /// Method string as received.
    fn method(&self) -> &str;

    /// Request path, without the query string.
    fn uri(&self) -> &str;

    /// Raw query string without the leading `?`.
    fn query_string(&self) -> Option<&str>;

    /// Request headers. Providers that cannot see headers report none.
    fn headers(&self) -> &Headers {
        &NO_HEADERS
    }
}

/// Snapshot of the inbound request line and headers.
///
/// # Examples
///
/// ```
/// use icehawk::http::{ProvidesRequestInfo, RequestInfo};
///
/// let raw = b"GET /domain/read?id=7 HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (info, _offset) = RequestInfo::parse(raw).unwrap();
///
/// assert_eq!(info.method(), "GET");
/// assert_eq!(info.uri(), "/domain/read");
/// assert_eq!(info.query_string(), Some("id=7"));
/// assert_eq!(info.headers().get("host"), Some("localhost"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    method: String,
    uri: String,
    query: Option<String>,
    headers: Headers,
}

impl RequestInfo {
    /// Maximum number of headers read from a raw request head.
    const MAX_HEADERS: usize = 64;

    /// Builds request info for `uri`; a `?query` suffix is split off.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let (uri, query) = match uri.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (uri, None),
        };
        Self {
            method: method.into(),
            uri,
            query,
            headers: Headers::new(),
        }
    }

    /// Snapshots any provider into an owned value.
    pub fn from_provider(provider: &dyn ProvidesRequestInfo) -> Self {
        Self {
            method: provider.method().to_owned(),
            uri: provider.uri().to_owned(),
            query: provider.query_string().map(str::to_owned),
            headers: provider.headers().clone(),
        }
    }

    /// Reads request info from a raw HTTP/1.x request head.
    ///
    /// Returns the info and the byte offset at which the body begins in `buf`.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`]: the head is not terminated yet.
    /// - [`RequestError::Parse`]: the head is malformed.
    /// - [`RequestError::MissingField`]: method or path is absent.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method = raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?;
        let path = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;

        let mut info = Self::new(method, path);
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                info.headers.insert(header.name, value);
            }
        }

        Ok((info, body_offset))
    }

    #[must_use]
    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.headers.get("host")
    }
}

impl ProvidesRequestInfo for RequestInfo {
    fn method(&self) -> &str {
        &self.method
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    fn headers(&self) -> &Headers {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_splits_query() {
        let info = RequestInfo::new("GET", "/a/b?x=1&y=2");
        assert_eq!(info.uri(), "/a/b");
        assert_eq!(info.query_string(), Some("x=1&y=2"));
    }

    #[test]
    fn parse_post_head_and_body_offset() {
        let raw = b"POST /domain/write HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello";
        let (info, offset) = RequestInfo::parse(raw).unwrap();
        assert_eq!(info.method(), "POST");
        assert_eq!(info.uri(), "/domain/write");
        assert_eq!(info.query_string(), None);
        assert_eq!(info.host(), Some("example.com"));
        assert_eq!(&raw[offset..], b"hello");
    }

    #[test]
    fn parse_keeps_unknown_method_verbatim() {
        let raw = b"BREW /pot HTTP/1.1\r\n\r\n";
        let (info, _) = RequestInfo::parse(raw).unwrap();
        assert_eq!(info.method(), "BREW");
    }

    #[test]
    fn parse_incomplete() {
        let raw = b"GET / HTTP/1.1\r\nHost:";
        assert!(matches!(
            RequestInfo::parse(raw),
            Err(RequestError::Incomplete)
        ));
    }

    #[test]
    fn from_provider_snapshots() {
        let original = RequestInfo::new("PUT", "/x?y=z").with_header("Host", "h");
        let copy = RequestInfo::from_provider(&original);
        assert_eq!(copy.method(), "PUT");
        assert_eq!(copy.uri(), "/x");
        assert_eq!(copy.query_string(), Some("y=z"));
        assert_eq!(copy.host(), Some("h"));
        assert_eq!(copy, original);
    }

    struct LineOnly;

    impl ProvidesRequestInfo for LineOnly {
        fn method(&self) -> &str {
            "GET"
        }

        fn uri(&self) -> &str {
            "/a/b"
        }

        fn query_string(&self) -> Option<&str> {
            None
        }
    }

    #[test]
    fn provider_without_headers_snapshots_none() {
        let copy = RequestInfo::from_provider(&LineOnly);
        assert!(copy.headers().is_empty());
        assert_eq!(copy.host(), None);
        assert_eq!(copy, RequestInfo::new("GET", "/a/b"));
    }
}
