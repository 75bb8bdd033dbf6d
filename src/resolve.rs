//! URI resolution: from a request envelope to the handler target.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::http::{Method, Parameters};
use crate::request::RequestEnvelope;
use crate::routing::{HandlerId, MiddlewareId, RequestProxy, Router};

/// Errors raised while resolving a request URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("malformed request URI: {uri:?}")]
    MalformedUri { uri: String },

    #[error("no route matches {method} {uri}")]
    NoRouteFound { method: Method, uri: String },
}

/// What a resolver found: the handler target, its middleware, the URI
/// parameters, and the request as routing left it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriComponents {
    target: HandlerId,
    middlewares: Vec<MiddlewareId>,
    params: Parameters,
    request: RequestEnvelope,
}

impl UriComponents {
    pub fn new(target: HandlerId, request: RequestEnvelope) -> Self {
        Self {
            target,
            middlewares: Vec::new(),
            params: Parameters::new(),
            request,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_middlewares(mut self, middlewares: Vec<MiddlewareId>) -> Self {
        self.middlewares = middlewares;
        self
    }

    pub fn target(&self) -> &HandlerId {
        &self.target
    }

    pub fn middlewares(&self) -> &[MiddlewareId] {
        &self.middlewares
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn request(&self) -> &RequestEnvelope {
        &self.request
    }
}

/// Resolves a request into [`UriComponents`].
pub trait ResolvesUri: Send + Sync {
    fn resolve_uri(&self, request: RequestEnvelope) -> Result<UriComponents, ResolveError>;
}

// `/<domain>/<demand>` with an optional trailing slash.
static DOMAIN_DEMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([^/?#]+)/([^/?#]+)/?$").expect("domain/demand pattern is valid")
});

/// Resolves `/<domain>/<demand>` to the target `"<domain>/<demand>"`.
///
/// # Examples
///
/// ```
/// use icehawk::http::Method;
/// use icehawk::request::RequestEnvelope;
/// use icehawk::resolve::{ResolvesUri, UriResolver};
///
/// let components = UriResolver
///     .resolve_uri(RequestEnvelope::new(Method::Get, "/users/profile/"))
///     .unwrap();
/// assert_eq!(components.target().as_str(), "users/profile");
///
/// assert!(UriResolver.resolve_uri(RequestEnvelope::new(Method::Get, "/")).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UriResolver;

impl ResolvesUri for UriResolver {
    fn resolve_uri(&self, request: RequestEnvelope) -> Result<UriComponents, ResolveError> {
        let Some(captures) = DOMAIN_DEMAND.captures(request.uri()) else {
            return Err(ResolveError::MalformedUri {
                uri: request.uri().to_owned(),
            });
        };

        let target = HandlerId::new(format!("{}/{}", &captures[1], &captures[2]));
        debug!(uri = request.uri(), target = %target, "uri resolved");

        Ok(UriComponents::new(target, request))
    }
}

/// Resolves through a [`RequestProxy`] and then a [`Router`].
///
/// The proxy may rewrite method, URI and parameters first; the router's first
/// matching node then supplies handler, middleware and URI parameters.
#[derive(Debug, Clone, Default)]
pub struct RoutingUriResolver {
    proxy: RequestProxy,
    router: Router,
}

impl RoutingUriResolver {
    pub fn new(proxy: RequestProxy, router: Router) -> Self {
        Self { proxy, router }
    }

    pub fn proxy(&self) -> &RequestProxy {
        &self.proxy
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl ResolvesUri for RoutingUriResolver {
    fn resolve_uri(&self, request: RequestEnvelope) -> Result<UriComponents, ResolveError> {
        let request = self.proxy.proxy_request(request);

        let Some(matched) = self.router.find(&request) else {
            return Err(ResolveError::NoRouteFound {
                method: request.method(),
                uri: request.uri().to_owned(),
            });
        };

        let (handler, middlewares, params, modified) = matched.into_parts();
        Ok(UriComponents::new(handler, modified)
            .with_params(params)
            .with_middlewares(middlewares))
    }
}
