//! The in-flight request as it moves through proxying and routing.

use crate::http::{Method, Parameters, UploadedFiles};

/// Method, URI and parameter mappings of one request.
///
/// Envelopes are never changed in place: every stage produces a new one with the
/// `with_*` builders, so one request's data is never visible to another.
///
/// # Examples
///
/// ```
/// use icehawk::http::{Method, Parameters};
/// use icehawk::request::RequestEnvelope;
///
/// let envelope = RequestEnvelope::new(Method::Post, "/companies/1/stocks")
///     .with_body([("stock", "3")].into_iter().collect::<Parameters>());
///
/// let moved = envelope.clone().with_method(Method::Get).with_uri("/stocks");
/// assert_eq!(envelope.method(), Method::Post);
/// assert_eq!(moved.uri(), "/stocks");
/// assert_eq!(moved.body().get("stock"), Some("3"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    method: Method,
    uri: String,
    query: Parameters,
    body: Parameters,
    files: UploadedFiles,
}

impl RequestEnvelope {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            query: Parameters::new(),
            body: Parameters::new(),
            files: UploadedFiles::new(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn query(&self) -> &Parameters {
        &self.query
    }

    pub fn body(&self) -> &Parameters {
        &self.body
    }

    pub fn files(&self) -> &UploadedFiles {
        &self.files
    }

    /// The query data rendered back into a query string.
    pub fn query_string(&self) -> String {
        self.query.to_query_string()
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: Parameters) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Parameters) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_files(mut self, files: UploadedFiles) -> Self {
        self.files = files;
        self
    }
}
