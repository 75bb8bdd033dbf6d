//! Leaf routes: one method, one pattern, one handler.

use std::fmt;

use tracing::debug;

use super::{RoutingError, UriPattern};
use crate::http::{Method, Parameters};
use crate::request::RequestEnvelope;

/// Identifies a request handler in a [`HandlerRegistry`](crate::handler::HandlerRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifies a middleware in a [`HandlerRegistry`](crate::handler::HandlerRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MiddlewareId(String);

impl MiddlewareId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MiddlewareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MiddlewareId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A successful route match.
///
/// Carries the handler and middleware to run plus the modified request: the
/// original envelope with the route's captured parameters merged into its query data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    handler: HandlerId,
    middlewares: Vec<MiddlewareId>,
    parameters: Parameters,
    request: RequestEnvelope,
}

impl RouteMatch {
    pub(crate) fn new(
        handler: HandlerId,
        middlewares: Vec<MiddlewareId>,
        parameters: Parameters,
        request: RequestEnvelope,
    ) -> Self {
        Self {
            handler,
            middlewares,
            parameters,
            request,
        }
    }

    pub fn handler(&self) -> &HandlerId {
        &self.handler
    }

    pub fn middlewares(&self) -> &[MiddlewareId] {
        &self.middlewares
    }

    /// Captured URI parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn modified_request(&self) -> &RequestEnvelope {
        &self.request
    }

    pub fn into_parts(self) -> (HandlerId, Vec<MiddlewareId>, Parameters, RequestEnvelope) {
        (self.handler, self.middlewares, self.parameters, self.request)
    }
}

/// Binds a method and a URI pattern to a handler and its middleware chain.
///
/// Routes are immutable; matching derives a [`RouteMatch`] and never touches the route.
///
/// # Examples
///
/// ```
/// use icehawk::http::Method;
/// use icehawk::request::RequestEnvelope;
/// use icehawk::routing::Route;
///
/// let route = Route::from_strings("GET", "/unit/(?<testKey>.*)", "unit/test", &["auth"]).unwrap();
///
/// let matched = route
///     .matches_request(&RequestEnvelope::new(Method::Get, "/unit/test"))
///     .unwrap();
/// assert_eq!(matched.handler().as_str(), "unit/test");
/// assert_eq!(matched.modified_request().query().get("testKey"), Some("test"));
///
/// assert!(route.matches_request(&RequestEnvelope::new(Method::Post, "/unit/test")).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: Method,
    pattern: UriPattern,
    handler: HandlerId,
    middlewares: Vec<MiddlewareId>,
}

impl Route {
    pub fn new(
        method: Method,
        pattern: UriPattern,
        handler: HandlerId,
        middlewares: Vec<MiddlewareId>,
    ) -> Self {
        Self {
            method,
            pattern,
            handler,
            middlewares,
        }
    }

    /// Builds a route from configuration strings.
    ///
    /// # Errors
    ///
    /// [`RoutingError::UnrecognizedMethod`] for a method outside the closed set,
    /// [`RoutingError::InvalidPattern`] for a pattern that does not compile.
    pub fn from_strings(
        method: &str,
        pattern: &str,
        handler: &str,
        middlewares: &[&str],
    ) -> Result<Self, RoutingError> {
        Ok(Self::new(
            method.parse()?,
            UriPattern::new(pattern)?,
            HandlerId::new(handler),
            middlewares.iter().copied().map(MiddlewareId::new).collect(),
        ))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &UriPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &HandlerId {
        &self.handler
    }

    pub fn middlewares(&self) -> &[MiddlewareId] {
        &self.middlewares
    }

    /// Tests method and URI; on success the captures override same-named query values.
    pub fn matches_request(&self, request: &RequestEnvelope) -> Option<RouteMatch> {
        if self.method != request.method() {
            return None;
        }

        let result = self.pattern.match_uri(request.uri());
        if !result.matched() {
            return None;
        }

        debug!(
            method = %self.method,
            uri = request.uri(),
            handler = %self.handler,
            "route matched"
        );

        let parameters = result.into_parameters();
        let modified = request
            .clone()
            .with_query(request.query().with_overrides(&parameters));

        Some(RouteMatch::new(
            self.handler.clone(),
            self.middlewares.clone(),
            parameters,
            modified,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(pattern: &str) -> Route {
        Route::from_strings("GET", pattern, "unit/handler", &["first", "second"]).unwrap()
    }

    #[test]
    fn from_strings_keeps_identifiers() {
        let r = route("/unit/test");
        assert_eq!(r.method(), Method::Get);
        assert_eq!(r.handler().as_str(), "unit/handler");
        assert_eq!(
            r.middlewares(),
            &[MiddlewareId::new("first"), MiddlewareId::new("second")]
        );
    }

    #[test]
    fn from_strings_rejects_unknown_method() {
        let err = Route::from_strings("FETCH", "/x", "h", &[]).unwrap_err();
        assert!(matches!(err, RoutingError::UnrecognizedMethod(_)));
    }

    #[test]
    fn from_strings_method_is_case_normalized() {
        let r = Route::from_strings("post", "/x", "h", &[]).unwrap();
        assert_eq!(r.method(), Method::Post);
    }

    #[test]
    fn matches_request_succeeds() {
        let request = RequestEnvelope::new(Method::Get, "/unit/test");
        assert!(route("/unit/test").matches_request(&request).is_some());
    }

    #[test]
    fn method_mismatch_fails() {
        let request = RequestEnvelope::new(Method::Post, "/unit/test");
        assert!(route("/unit/test").matches_request(&request).is_none());
    }

    #[test]
    fn pattern_mismatch_fails() {
        let request = RequestEnvelope::new(Method::Get, "/unit/test");
        assert!(route("/not-matching").matches_request(&request).is_none());
    }

    #[test]
    fn modified_request_gets_captures_in_query_only() {
        let request = RequestEnvelope::new(Method::Get, "/unit/test");
        let matched = route("/unit/(?<testKey>.*)").matches_request(&request).unwrap();

        assert_eq!(matched.modified_request().query().get("testKey"), Some("test"));
        assert_eq!(matched.modified_request().body().get("testKey"), None);
        assert_eq!(matched.parameters().get("testKey"), Some("test"));
    }

    #[test]
    fn captures_override_existing_query_values() {
        let request = RequestEnvelope::new(Method::Get, "/unit/test").with_query(
            [("testKey", "from-caller"), ("page", "3")]
                .into_iter()
                .collect(),
        );
        let matched = route("/unit/(?<testKey>.*)").matches_request(&request).unwrap();

        let query = matched.modified_request().query();
        assert_eq!(query.get("testKey"), Some("test"));
        assert_eq!(query.get("page"), Some("3"));
    }

    #[test]
    fn matching_leaves_input_envelope_untouched() {
        let request = RequestEnvelope::new(Method::Get, "/unit/test");
        let _ = route("/unit/(?<testKey>.*)").matches_request(&request);
        assert!(request.query().is_empty());
    }
}
