//! Route redirects: rewrite method, URI and parameters before routing.

use tracing::debug;

use super::{MatchResult, RoutingError, UriPattern};
use crate::http::{Method, RequestKind};
use crate::request::RequestEnvelope;

// A piece of a target template: literal text or a `:name` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Parameter(String),
}

// Splits `/stocks/store/:storeId` into segments. A `:` not followed by an
// identifier start is literal text.
fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        let starts_name = c == ':'
            && chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_');

        if !starts_name {
            literal.push(c);
            continue;
        }

        if !literal.is_empty() {
            segments.push(Segment::Static(std::mem::take(&mut literal)));
        }

        let mut name = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_ascii_alphanumeric() || n == '_' {
                name.push(n);
                chars.next();
            } else {
                break;
            }
        }
        segments.push(Segment::Parameter(name));
    }

    if !literal.is_empty() {
        segments.push(Segment::Static(literal));
    }

    segments
}

/// Sends requests matching a pattern to a target URI and method.
///
/// The target template's `:name` placeholders are filled from the pattern's named
/// captures. Every placeholder must name a capture group of the pattern; this is
/// checked when the redirect is built, never per request.
///
/// The captures are also merged into the parameters the *target* method reads:
/// query data for read methods, body data for write methods. Values the request
/// already carries win over captures of the same name.
///
/// # Examples
///
/// ```
/// use icehawk::http::Method;
/// use icehawk::request::RequestEnvelope;
/// use icehawk::routing::RouteRedirect;
///
/// let redirect = RouteRedirect::from_strings(
///     r"^/companies/(?<companyId>\d*)/stores/(?<storeId>\d*)/stocks$",
///     "/stocks/store/:storeId",
///     "GET",
/// )
/// .unwrap();
///
/// let proxied = redirect
///     .redirect(&RequestEnvelope::new(Method::Post, "/companies/1/stores/2/stocks"))
///     .unwrap();
///
/// assert_eq!(proxied.uri(), "/stocks/store/2");
/// assert_eq!(proxied.method(), Method::Get);
/// assert_eq!(proxied.query_string(), "companyId=1&storeId=2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRedirect {
    pattern: UriPattern,
    target: String,
    segments: Vec<Segment>,
    method: Method,
}

impl RouteRedirect {
    /// # Errors
    ///
    /// [`RoutingError::UnresolvedPlaceholder`] when `target` names a placeholder
    /// the pattern does not capture.
    pub fn new(pattern: UriPattern, target: &str, method: Method) -> Result<Self, RoutingError> {
        let segments = parse_template(target);

        for segment in &segments {
            if let Segment::Parameter(name) = segment {
                if !pattern.capture_names().any(|capture| capture == name) {
                    return Err(RoutingError::UnresolvedPlaceholder {
                        placeholder: name.clone(),
                        target: target.to_owned(),
                        pattern: pattern.as_str().to_owned(),
                    });
                }
            }
        }

        Ok(Self {
            pattern,
            target: target.to_owned(),
            segments,
            method,
        })
    }

    pub fn from_strings(pattern: &str, target: &str, method: &str) -> Result<Self, RoutingError> {
        Self::new(UriPattern::new(pattern)?, target, method.parse()?)
    }

    pub fn pattern(&self) -> &UriPattern {
        &self.pattern
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Tests the request URI only.
    pub fn matches(&self, request: &RequestEnvelope) -> MatchResult {
        self.pattern.match_uri(request.uri())
    }

    /// The envelope this redirect turns `request` into, or `None` if it does not apply.
    pub fn redirect(&self, request: &RequestEnvelope) -> Option<RequestEnvelope> {
        let result = self.matches(request);
        if !result.matched() {
            return None;
        }

        let captures = result.parameters();
        let uri: String = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Static(text) => text.as_str(),
                // Groups that did not take part in the match substitute as empty.
                Segment::Parameter(name) => captures.get(name).unwrap_or_default(),
            })
            .collect();

        debug!(
            from_method = %request.method(),
            from_uri = request.uri(),
            to_method = %self.method,
            to_uri = %uri,
            "route redirect applied"
        );

        let redirected = request.clone().with_method(self.method).with_uri(uri);

        Some(match self.method.kind() {
            RequestKind::Read => {
                let query = request.query().with_defaults(captures);
                redirected.with_query(query)
            }
            RequestKind::Write => {
                let body = request.body().with_defaults(captures);
                redirected.with_body(body)
            }
        })
    }
}
