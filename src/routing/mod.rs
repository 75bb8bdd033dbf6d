//! Request routing: redirect, then map method and URI to a handler.
//!
//! The pieces, leaves first:
//!
//! | Type              | Role                                                              |
//! |-------------------|-------------------------------------------------------------------|
//! | [`UriPattern`]    | compiled regex; reports matched / exact / named captures          |
//! | [`Route`]         | method + pattern → handler and middleware                         |
//! | [`RouteGroup`]    | pattern gate over ordered children; exact own match wins          |
//! | [`Router`]        | ordered list of routes and groups; first match wins               |
//! | [`RouteRedirect`] | pattern → new method + URI template, captures merged into params  |
//! | [`RequestProxy`]  | ordered redirects; the first match applies, at most one per request |
//!
//! Captured parameters are merged at two sites with opposite precedence:
//! a route's captures override the request's query values, while a redirect's
//! captures never replace values the request already carries.
//!
//! All of these are built once at configuration time and only read afterwards;
//! matching returns new values and never mutates the route table, so a table can
//! be shared freely between concurrent requests.

use thiserror::Error;

use crate::http::UnrecognizedMethod;

mod group;
mod pattern;
mod proxy;
mod redirect;
mod route;
mod router;

pub use group::{RouteGroup, RouteNode};
pub use pattern::{MatchResult, UriPattern};
pub use proxy::RequestProxy;
pub use redirect::RouteRedirect;
pub use route::{HandlerId, MiddlewareId, Route, RouteMatch};
pub use router::Router;

/// Errors raised while building routes, groups and redirects.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("invalid URI pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    UnrecognizedMethod(#[from] UnrecognizedMethod),

    #[error("redirect target {target:?} uses placeholder :{placeholder} not captured by {pattern:?}")]
    UnresolvedPlaceholder {
        placeholder: String,
        target: String,
        pattern: String,
    },
}
