//! Declarative routing tables loaded from JSON.
//!
//! ```json
//! {
//!   "redirects": [
//!     { "pattern": "^/companies/(?<companyId>\\d+)/stocks$", "target": "/stocks", "method": "GET" }
//!   ],
//!   "routes": [
//!     { "method": "GET", "pattern": "^/stocks$", "handler": "stocks/list" },
//!     {
//!       "pattern": "^/admin",
//!       "handler": "admin/index",
//!       "middlewares": ["auth"],
//!       "routes": [
//!         { "method": "GET", "pattern": "^/admin/users$", "handler": "admin/users" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! An entry with a `routes` array is a group; every other entry is a route.
//! Groups take no `method`, and keys outside the ones shown are rejected.

use serde::Deserialize;

use super::ConfigError;
use crate::resolve::RoutingUriResolver;
use crate::routing::{
    HandlerId, MiddlewareId, RequestProxy, Route, RouteGroup, RouteNode, RouteRedirect, Router, RoutingError,
    UriPattern,
};

/// Redirects and routes as written in configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    #[serde(default)]
    pub redirects: Vec<RedirectEntry>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// A redirect applied by the [`RequestProxy`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RedirectEntry {
    pub pattern: String,
    pub target: String,
    pub method: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawRouteEntry")]
pub enum RouteEntry {
    Group(GroupEntry),
    Route(LeafEntry),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub pattern: String,
    pub handler: String,
    pub middlewares: Vec<String>,
    pub routes: Vec<RouteEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    pub method: String,
    pub pattern: String,
    pub handler: String,
    pub middlewares: Vec<String>,
}

/// Every key a route or group may carry; the shape is decided after parsing.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRouteEntry {
    method: Option<String>,
    pattern: String,
    handler: String,
    #[serde(default)]
    middlewares: Vec<String>,
    routes: Option<Vec<RouteEntry>>,
}

impl TryFrom<RawRouteEntry> for RouteEntry {
    type Error = String;

    fn try_from(raw: RawRouteEntry) -> Result<Self, Self::Error> {
        let RawRouteEntry {
            method,
            pattern,
            handler,
            middlewares,
            routes,
        } = raw;

        match (method, routes) {
            (None, Some(routes)) => Ok(RouteEntry::Group(GroupEntry {
                pattern,
                handler,
                middlewares,
                routes,
            })),
            (Some(method), None) => Ok(RouteEntry::Route(LeafEntry {
                method,
                pattern,
                handler,
                middlewares,
            })),
            (Some(method), Some(_)) => Err(format!(
                "group {pattern:?} declares method {method:?}; methods belong on the routes inside it"
            )),
            (None, None) => Err(format!("route {pattern:?} has neither a `method` nor a `routes` array")),
        }
    }
}

fn middleware_ids(names: &[String]) -> Vec<MiddlewareId> {
    names.iter().map(|name| MiddlewareId::new(name.as_str())).collect()
}

impl RouteEntry {
    fn compile(&self) -> Result<RouteNode, RoutingError> {
        match self {
            RouteEntry::Route(leaf) => Ok(Route::new(
                leaf.method.parse()?,
                UriPattern::new(&leaf.pattern)?,
                HandlerId::new(leaf.handler.as_str()),
                middleware_ids(&leaf.middlewares),
            )
            .into()),
            RouteEntry::Group(group) => {
                let mut compiled = RouteGroup::new(UriPattern::new(&group.pattern)?, HandlerId::new(group.handler.as_str()))
                    .with_middlewares(middleware_ids(&group.middlewares));
                for child in &group.routes {
                    compiled.add_route(child.compile()?);
                }
                Ok(compiled.into())
            }
        }
    }
}

impl RoutingConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compiles every pattern and checks every redirect target.
    ///
    /// # Errors
    ///
    /// The first [`RoutingError`] found, in declaration order.
    pub fn build(&self) -> Result<(RequestProxy, Router), RoutingError> {
        let mut proxy = RequestProxy::new();
        for entry in &self.redirects {
            proxy.add_redirect(RouteRedirect::from_strings(&entry.pattern, &entry.target, &entry.method)?);
        }

        let mut router = Router::new();
        for entry in &self.routes {
            router.add(entry.compile()?);
        }

        Ok((proxy, router))
    }

    pub fn into_resolver(self) -> Result<RoutingUriResolver, RoutingError> {
        let (proxy, router) = self.build()?;
        Ok(RoutingUriResolver::new(proxy, router))
    }

    /// Parses and compiles a JSON routing table in one step.
    pub fn load_resolver(json: &str) -> Result<RoutingUriResolver, ConfigError> {
        Ok(Self::from_json(json)?.into_resolver()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Parameters};
    use crate::request::RequestEnvelope;
    use crate::resolve::ResolvesUri;

    const TABLE: &str = r#"{
        "redirects": [
            {
                "pattern": "^/companies/(?<companyId>\\d+)/stores/(?<storeId>\\d+)/stocks$",
                "target": "/stores/:storeId/stocks",
                "method": "GET"
            }
        ],
        "routes": [
            { "method": "GET", "pattern": "^/stores/(?<storeId>\\d+)/stocks$", "handler": "stocks/by-store" },
            {
                "pattern": "^/admin",
                "handler": "admin/index",
                "middlewares": ["auth"],
                "routes": [
                    { "method": "POST", "pattern": "^/admin/users$", "handler": "admin/create-user", "middlewares": ["audit"] }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_routes_and_groups() {
        let config = RoutingConfig::from_json(TABLE).unwrap();
        assert_eq!(config.redirects.len(), 1);
        assert!(matches!(config.routes[0], RouteEntry::Route(_)));
        match &config.routes[1] {
            RouteEntry::Group(group) => {
                assert_eq!(group.middlewares, vec!["auth"]);
                assert_eq!(group.routes.len(), 1);
            }
            other => panic!("expected a group, got {other:?}"),
        }
    }

    #[test]
    fn built_resolver_routes_through_proxy() {
        let resolver = RoutingConfig::load_resolver(TABLE).unwrap();
        let components = resolver
            .resolve_uri(RequestEnvelope::new(Method::Post, "/companies/4/stores/9/stocks"))
            .unwrap();
        assert_eq!(components.target().as_str(), "stocks/by-store");
        assert_eq!(components.request().method(), Method::Get);
        assert_eq!(components.request().query().get("companyId"), Some("4"));
        assert_eq!(components.params().get("storeId"), Some("9"));
    }

    #[test]
    fn nested_route_uses_its_own_middleware() {
        let resolver = RoutingConfig::load_resolver(TABLE).unwrap();
        let components = resolver
            .resolve_uri(
                RequestEnvelope::new(Method::Post, "/admin/users")
                    .with_body([("name", "ada")].into_iter().collect::<Parameters>()),
            )
            .unwrap();
        assert_eq!(components.target().as_str(), "admin/create-user");
        assert_eq!(components.middlewares(), &[MiddlewareId::new("audit")]);
    }

    #[test]
    fn empty_table_is_valid() {
        let (proxy, router) = RoutingConfig::from_json("{}").unwrap().build().unwrap();
        assert!(proxy.is_empty());
        assert!(router.is_empty());
    }

    #[test]
    fn bad_method_fails_at_build_time() {
        let config = RoutingConfig::from_json(
            r#"{ "routes": [ { "method": "BREW", "pattern": "^/pot$", "handler": "pot/brew" } ] }"#,
        )
        .unwrap();
        assert!(matches!(config.build(), Err(RoutingError::UnrecognizedMethod(_))));
    }

    #[test]
    fn unresolved_placeholder_fails_at_build_time() {
        let config = RoutingConfig::from_json(
            r#"{ "redirects": [ { "pattern": "^/a$", "target": "/b/:id", "method": "GET" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            config.build(),
            Err(RoutingError::UnresolvedPlaceholder { placeholder, .. }) if placeholder == "id"
        ));
    }

    fn json_error(json: &str) -> String {
        match RoutingConfig::from_json(json) {
            Err(ConfigError::Json(err)) => err.to_string(),
            other => panic!("expected a JSON error, got {other:?}"),
        }
    }

    #[test]
    fn group_with_method_is_rejected() {
        let message = json_error(
            r#"{ "routes": [ { "method": "GET", "pattern": "^/a", "handler": "a/index", "routes": [] } ] }"#,
        );
        assert!(message.contains("declares method \"GET\""), "{message}");
    }

    #[test]
    fn misspelled_key_is_named() {
        let message = json_error(r#"{ "routes": [ { "method": "GET", "pattern": "^/a$", "handlr": "a/show" } ] }"#);
        assert!(message.contains("unknown field `handlr`"), "{message}");

        let message = json_error(
            r#"{ "redirects": [ { "pattern": "^/a$", "target": "/b", "method": "GET", "code": 301 } ] }"#,
        );
        assert!(message.contains("unknown field `code`"), "{message}");
    }

    #[test]
    fn missing_key_is_named() {
        let message = json_error(r#"{ "routes": [ { "method": "GET", "pattern": "^/a$" } ] }"#);
        assert!(message.contains("missing field `handler`"), "{message}");

        let message = json_error(r#"{ "routes": [ { "pattern": "^/a$", "handler": "a/show" } ] }"#);
        assert!(message.contains("neither a `method` nor a `routes` array"), "{message}");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            RoutingConfig::load_resolver("{ routes: "),
            Err(ConfigError::Json(_))
        ));
    }
}
