//! Route groups: hierarchical matching under a shared URI prefix.

use tracing::debug;

use super::{HandlerId, MiddlewareId, Route, RouteMatch, RoutingError, UriPattern};
use crate::request::RequestEnvelope;

/// A node in a route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteNode {
    Route(Route),
    Group(RouteGroup),
}

impl RouteNode {
    pub fn matches_request(&self, request: &RequestEnvelope) -> Option<RouteMatch> {
        match self {
            RouteNode::Route(route) => route.matches_request(request),
            RouteNode::Group(group) => group.matches_request(request),
        }
    }
}

impl From<Route> for RouteNode {
    fn from(route: Route) -> Self {
        RouteNode::Route(route)
    }
}

impl From<RouteGroup> for RouteNode {
    fn from(group: RouteGroup) -> Self {
        RouteNode::Group(group)
    }
}

/// A pattern with its own handler and an ordered list of child nodes.
///
/// Matching tests only the URI (leaf routes discriminate by method):
///
/// 1. Own pattern does not match → no match; children are not tested.
/// 2. Own pattern matches the whole URI → the group's own handler wins,
///    even if a child would match too.
/// 3. Own pattern matches part of the URI → the first matching child, in
///    declaration order, supplies handler, middleware and parameters.
///
/// # Examples
///
/// ```
/// use icehawk::http::Method;
/// use icehawk::request::RequestEnvelope;
/// use icehawk::routing::{Route, RouteGroup};
///
/// let group = RouteGroup::from_strings("^/companies", "companies/list")
///     .unwrap()
///     .with_route(Route::from_strings("GET", r"^/companies/(?<id>\d+)$", "companies/show", &[]).unwrap());
///
/// let whole = group.matches_request(&RequestEnvelope::new(Method::Get, "/companies")).unwrap();
/// assert_eq!(whole.handler().as_str(), "companies/list");
///
/// let child = group.matches_request(&RequestEnvelope::new(Method::Get, "/companies/7")).unwrap();
/// assert_eq!(child.handler().as_str(), "companies/show");
/// assert_eq!(child.parameters().get("id"), Some("7"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGroup {
    pattern: UriPattern,
    handler: HandlerId,
    middlewares: Vec<MiddlewareId>,
    children: Vec<RouteNode>,
}

impl RouteGroup {
    pub fn new(pattern: UriPattern, handler: HandlerId) -> Self {
        Self {
            pattern,
            handler,
            middlewares: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn from_strings(pattern: &str, handler: &str) -> Result<Self, RoutingError> {
        Ok(Self::new(UriPattern::new(pattern)?, HandlerId::new(handler)))
    }

    /// Middleware run when the group's own handler is selected.
    #[must_use]
    pub fn with_middlewares(mut self, middlewares: Vec<MiddlewareId>) -> Self {
        self.middlewares = middlewares;
        self
    }

    /// Appends a child; declaration order decides ties between overlapping children.
    #[must_use]
    pub fn with_route(mut self, child: impl Into<RouteNode>) -> Self {
        self.add_route(child);
        self
    }

    pub fn add_route(&mut self, child: impl Into<RouteNode>) {
        self.children.push(child.into());
    }

    pub fn pattern(&self) -> &UriPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &HandlerId {
        &self.handler
    }

    pub fn children(&self) -> &[RouteNode] {
        &self.children
    }

    pub fn matches_request(&self, request: &RequestEnvelope) -> Option<RouteMatch> {
        let result = self.pattern.match_uri(request.uri());

        if !result.matched() {
            return None;
        }

        if result.exact() {
            debug!(uri = request.uri(), handler = %self.handler, "route group matched exactly");
            let parameters = result.into_parameters();
            let modified = request
                .clone()
                .with_query(request.query().with_overrides(&parameters));
            return Some(RouteMatch::new(
                self.handler.clone(),
                self.middlewares.clone(),
                parameters,
                modified,
            ));
        }

        let found = self
            .children
            .iter()
            .find_map(|child| child.matches_request(request));

        if found.is_some() {
            debug!(uri = request.uri(), pattern = self.pattern.as_str(), "route group delegated to child");
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    fn get(uri: &str) -> RequestEnvelope {
        RequestEnvelope::new(Method::Get, uri)
    }

    fn route(method: &str, pattern: &str, handler: &str) -> Route {
        Route::from_strings(method, pattern, handler, &[]).unwrap()
    }

    #[test]
    fn own_pattern_mismatch_short_circuits() {
        let group = RouteGroup::from_strings("^/companies", "group")
            .unwrap()
            .with_route(route("GET", ".*", "catch-all"));
        assert!(group.matches_request(&get("/stores/1")).is_none());
    }

    #[test]
    fn exact_match_beats_children() {
        let group = RouteGroup::from_strings("^/companies$", "group")
            .unwrap()
            .with_route(route("GET", ".*", "always"));
        let matched = group.matches_request(&get("/companies")).unwrap();
        assert_eq!(matched.handler().as_str(), "group");
    }

    #[test]
    fn exact_match_ignores_method() {
        let group = RouteGroup::from_strings("^/companies$", "group").unwrap();
        let post = RequestEnvelope::new(Method::Post, "/companies");
        assert!(group.matches_request(&post).is_some());
    }

    #[test]
    fn exact_match_carries_own_captures() {
        let group = RouteGroup::from_strings(r"^/companies/(?<companyId>\d+)$", "group")
            .unwrap()
            .with_middlewares(vec![MiddlewareId::new("auth")]);
        let matched = group.matches_request(&get("/companies/5")).unwrap();
        assert_eq!(matched.parameters().get("companyId"), Some("5"));
        assert_eq!(matched.modified_request().query().get("companyId"), Some("5"));
        assert_eq!(matched.middlewares(), &[MiddlewareId::new("auth")]);
    }

    #[test]
    fn partial_match_first_child_wins() {
        let group = RouteGroup::from_strings("^/companies", "group")
            .unwrap()
            .with_route(route("GET", r"^/companies/(?<id>\d+)$", "first"))
            .with_route(route("GET", r"^/companies/\d+$", "second"));
        let matched = group.matches_request(&get("/companies/9")).unwrap();
        assert_eq!(matched.handler().as_str(), "first");
        assert_eq!(matched.parameters().get("id"), Some("9"));
    }

    #[test]
    fn partial_match_skips_children_of_other_methods() {
        let group = RouteGroup::from_strings("^/companies", "group")
            .unwrap()
            .with_route(route("POST", r"^/companies/\d+$", "write"))
            .with_route(route("GET", r"^/companies/\d+$", "read"));
        let matched = group.matches_request(&get("/companies/9")).unwrap();
        assert_eq!(matched.handler().as_str(), "read");
    }

    #[test]
    fn partial_match_without_matching_child_fails() {
        let group = RouteGroup::from_strings("^/companies", "group")
            .unwrap()
            .with_route(route("GET", r"^/companies/\d+$", "numeric"));
        assert!(group.matches_request(&get("/companies/abc")).is_none());
    }

    #[test]
    fn nested_groups_recurse() {
        let inner = RouteGroup::from_strings(r"^/companies/\d+/stores", "stores")
            .unwrap()
            .with_route(route("GET", r"^/companies/\d+/stores/(?<storeId>\d+)$", "store"));
        let outer = RouteGroup::from_strings("^/companies", "companies")
            .unwrap()
            .with_route(inner);

        let store = outer.matches_request(&get("/companies/1/stores/2")).unwrap();
        assert_eq!(store.handler().as_str(), "store");
        assert_eq!(store.parameters().get("storeId"), Some("2"));

        let stores = outer.matches_request(&get("/companies/1/stores")).unwrap();
        assert_eq!(stores.handler().as_str(), "stores");
    }

    #[test]
    fn matching_does_not_change_the_group() {
        let group = RouteGroup::from_strings("^/companies", "group")
            .unwrap()
            .with_route(route("GET", r"^/companies/\d+$", "child"));
        let before = group.clone();
        let _ = group.matches_request(&get("/companies/1"));
        assert_eq!(group, before);
        assert_eq!(group.handler().as_str(), "group");
    }
}
