//! HTTP primitives shared by every stage of the dispatch pipeline.
//!
//! This module provides [`Method`], [`StatusCode`], [`Headers`], [`RequestInfo`],
//! the opaque input mappings ([`Parameters`], [`UploadedFiles`], [`RequestInput`])
//! and the outbound [`Response`] / [`Redirect`] types.

use std::fmt;

use thiserror::Error;

pub mod headers;
pub mod input;
pub mod request_info;
pub mod response;

pub use headers::Headers;
pub use input::{Parameters, RequestInput, UploadedFile, UploadedFiles};
pub use request_info::{ProvidesRequestInfo, RequestInfo};
pub use response::{BufferedResponder, Redirect, Responder, Response};

/// Boxed error returned by domain collaborators (handlers, listeners, responders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An HTTP response status code.
///
/// # Examples
///
/// ```
/// use icehawk::http::StatusCode;
///
/// let status = StatusCode::MovedPermanently;
/// assert_eq!(status.as_u16(), 301);
/// assert_eq!(status.canonical_reason(), "Moved Permanently");
/// assert!(status.is_redirection());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    // 2xx Success
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,

    // 3xx Redirection
    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    NotModified = 304,
    TemporaryRedirect = 307,
    PermanentRedirect = 308,

    // 4xx Client Error
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    Conflict = 409,
    Gone = 410,
    UnprocessableEntity = 422,

    // 5xx Server Error
    InternalServerError = 500,
    NotImplemented = 501,
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Returns the numeric status code as a `u16`.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns `true` for 3xx codes.
    pub fn is_redirection(self) -> bool {
        (300..400).contains(&self.as_u16())
    }

    /// Returns the canonical reason phrase for this status code.
    pub fn canonical_reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::Accepted => "Accepted",
            Self::NoContent => "No Content",
            Self::MovedPermanently => "Moved Permanently",
            Self::Found => "Found",
            Self::SeeOther => "See Other",
            Self::NotModified => "Not Modified",
            Self::TemporaryRedirect => "Temporary Redirect",
            Self::PermanentRedirect => "Permanent Redirect",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::Conflict => "Conflict",
            Self::Gone => "Gone",
            Self::UnprocessableEntity => "Unprocessable Entity",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented => "Not Implemented",
            Self::ServiceUnavailable => "Service Unavailable",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.canonical_reason())
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.as_u16()
    }
}

/// A method string that is not part of the closed [`Method`] set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized HTTP method: {0:?}")]
pub struct UnrecognizedMethod(pub String);

/// Whether a method reads state or changes it.
///
/// Drives where routing parameters are merged when a request is redirected,
/// and which shape of [`Request`](crate::request::Request) is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Safe methods; parameters travel in the query data.
    Read,
    /// State-changing methods; parameters travel in the body data.
    Write,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// An HTTP request method.
///
/// The set is closed: parsing any other string fails with [`UnrecognizedMethod`]
/// instead of producing a silent non-match later on.
///
/// # Examples
///
/// ```
/// use icehawk::http::{Method, RequestKind};
///
/// let method: Method = "get".parse().unwrap();
/// assert_eq!(method, Method::Get);
/// assert_eq!(method.as_str(), "GET");
/// assert_eq!(method.kind(), RequestKind::Read);
/// assert!("BREW".parse::<Method>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Connect,
    Trace,
}

impl Method {
    /// Returns the method as an upper-case string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
        }
    }

    /// Returns `true` for safe methods (RFC 9110 §9.2.1): GET, HEAD, OPTIONS, TRACE.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace)
    }

    /// Returns `true` for every method that is not [`is_read`](Self::is_read).
    pub fn is_write(&self) -> bool {
        !self.is_read()
    }

    /// Read/write classification of this method.
    pub fn kind(&self) -> RequestKind {
        if self.is_read() {
            RequestKind::Read
        } else {
            RequestKind::Write
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = UnrecognizedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            _ => return Err(UnrecognizedMethod(s.to_owned())),
        })
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
