//! Requests as handlers see them.
//!
//! [`RequestEnvelope`] is the untyped form used while proxying and routing. Once a
//! target is resolved, [`RequestBuilder`] turns the envelope into a [`Request`]
//! shaped by the method's read/write classification:
//!
//! - [`ReadRequest`]: input is the query data.
//! - [`WriteRequest`]: input is the body data; query data and uploads come along.
//!
//! In both cases the resolved URI parameters override same-named input values.

mod envelope;

pub use envelope::RequestEnvelope;

use crate::http::{Method, Parameters, RequestKind, UploadedFiles};
use crate::resolve::UriComponents;

/// Request for a safe method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    method: Method,
    uri: String,
    input: Parameters,
}

impl ReadRequest {
    pub fn new(method: Method, uri: impl Into<String>, input: Parameters) -> Self {
        Self {
            method,
            uri: uri.into(),
            input,
        }
    }
}

/// Request for a state-changing method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    method: Method,
    uri: String,
    input: Parameters,
    query: Parameters,
    files: UploadedFiles,
}

impl WriteRequest {
    pub fn new(method: Method, uri: impl Into<String>, input: Parameters) -> Self {
        Self {
            method,
            uri: uri.into(),
            input,
            query: Parameters::new(),
            files: UploadedFiles::new(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Parameters) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_files(mut self, files: UploadedFiles) -> Self {
        self.files = files;
        self
    }

    pub fn query(&self) -> &Parameters {
        &self.query
    }

    pub fn files(&self) -> &UploadedFiles {
        &self.files
    }
}

/// A typed request handed to handlers and carried by lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Read(ReadRequest),
    Write(WriteRequest),
}

impl Request {
    pub fn method(&self) -> Method {
        match self {
            Request::Read(r) => r.method,
            Request::Write(w) => w.method,
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Request::Read(r) => &r.uri,
            Request::Write(w) => &w.uri,
        }
    }

    /// Query data for reads, body data for writes.
    pub fn input(&self) -> &Parameters {
        match self {
            Request::Read(r) => &r.input,
            Request::Write(w) => &w.input,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.input().get(key)
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Read(_) => RequestKind::Read,
            Request::Write(_) => RequestKind::Write,
        }
    }
}

/// Builds the typed [`Request`] for resolved [`UriComponents`].
pub struct RequestBuilder<'a> {
    components: &'a UriComponents,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(components: &'a UriComponents) -> Self {
        Self { components }
    }

    pub fn build(&self) -> Request {
        let envelope = self.components.request();
        let params = self.components.params();

        match envelope.method().kind() {
            RequestKind::Read => Request::Read(ReadRequest::new(
                envelope.method(),
                envelope.uri(),
                envelope.query().with_overrides(params),
            )),
            RequestKind::Write => Request::Write(
                WriteRequest::new(
                    envelope.method(),
                    envelope.uri(),
                    envelope.body().with_overrides(params),
                )
                .with_query(envelope.query().clone())
                .with_files(envelope.files().clone()),
            ),
        }
    }
}
