//! Ordered first-match lookup over route trees.

use super::{Route, RouteGroup, RouteMatch, RouteNode};
use crate::request::RequestEnvelope;

/// The top level of the route table.
///
/// Nodes are evaluated in registration order; the first [`Route`] or
/// [`RouteGroup`] that matches the request wins.
///
/// # Examples
///
/// ```
/// use icehawk::http::Method;
/// use icehawk::request::RequestEnvelope;
/// use icehawk::routing::{Route, Router};
///
/// let mut router = Router::new();
/// router.add(Route::from_strings("GET", "^/ping$", "health/ping", &[]).unwrap());
///
/// let matched = router.find(&RequestEnvelope::new(Method::Get, "/ping")).unwrap();
/// assert_eq!(matched.handler().as_str(), "health/ping");
/// assert!(router.find(&RequestEnvelope::new(Method::Post, "/ping")).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Router {
    nodes: Vec<RouteNode>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: impl Into<RouteNode>) {
        self.nodes.push(node.into());
    }

    #[must_use]
    pub fn with_route(mut self, route: Route) -> Self {
        self.add(route);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: RouteGroup) -> Self {
        self.add(group);
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The match of the first node accepting `request`.
    pub fn find(&self, request: &RequestEnvelope) -> Option<RouteMatch> {
        self.nodes
            .iter()
            .find_map(|node| node.matches_request(request))
    }
}
