//! Collaborator wiring for the [`IceHawk`](crate::IceHawk) orchestrator.
//!
//! [`IceHawkConfig`] is assembled once by the host and checked by
//! [`IceHawkConfig::validate`] during `init()`. Collaborators are held in `Arc`s,
//! so a validated configuration is cheap to clone for every request.

mod routing;

pub use routing::{GroupEntry, LeafEntry, RedirectEntry, RouteEntry, RoutingConfig};

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::events::ListensToEvents;
use crate::handler::BuildsRequestHandler;
use crate::http::{ProvidesRequestInfo, Responder};
use crate::resolve::{ResolvesUri, UriResolver};
use crate::rewrite::{RewritesUri, UriRewriter};
use crate::routing::RoutingError;

/// Configuration errors. Raised before the first request, never during one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no URI rewriter configured")]
    MissingUriRewriter,

    #[error("no URI resolver configured")]
    MissingUriResolver,

    #[error("no request info provider configured")]
    MissingRequestInfo,

    #[error("invalid domain namespace {namespace:?}: expected identifiers joined by `::`")]
    InvalidDomainNamespace { namespace: String },

    #[error("no request handler builder configured")]
    MissingHandlerBuilder,

    #[error("no responder configured")]
    MissingResponder,

    #[error("routing table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

static DOMAIN_NAMESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)*$").expect("namespace pattern is valid")
});

/// The collaborators an [`IceHawk`](crate::IceHawk) needs, before validation.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use icehawk::config::IceHawkConfig;
/// use icehawk::handler::HandlerRegistry;
/// use icehawk::http::{BufferedResponder, RequestInfo};
///
/// let config = IceHawkConfig::with_defaults()
///     .with_request_info(Arc::new(RequestInfo::new("GET", "/orders/list")))
///     .with_domain_namespace("Shop::Orders")
///     .with_handler_builder(Arc::new(HandlerRegistry::new("Shop::Orders")))
///     .with_responder(Arc::new(BufferedResponder::new()));
///
/// assert!(config.validate().is_ok());
/// assert!(IceHawkConfig::new().validate().is_err());
/// ```
#[derive(Clone, Default)]
pub struct IceHawkConfig {
    uri_rewriter: Option<Arc<dyn RewritesUri>>,
    uri_resolver: Option<Arc<dyn ResolvesUri>>,
    request_info: Option<Arc<dyn ProvidesRequestInfo>>,
    domain_namespace: String,
    event_listeners: Vec<Arc<dyn ListensToEvents>>,
    handler_builder: Option<Arc<dyn BuildsRequestHandler>>,
    responder: Option<Arc<dyn Responder>>,
}

impl IceHawkConfig {
    /// An empty configuration; nothing is installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration with the rule-less [`UriRewriter`] and the
    /// `/<domain>/<demand>` [`UriResolver`] installed.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_uri_rewriter(Arc::new(UriRewriter::new()))
            .with_uri_resolver(Arc::new(UriResolver))
    }

    #[must_use]
    pub fn with_uri_rewriter(mut self, rewriter: Arc<dyn RewritesUri>) -> Self {
        self.uri_rewriter = Some(rewriter);
        self
    }

    #[must_use]
    pub fn with_uri_resolver(mut self, resolver: Arc<dyn ResolvesUri>) -> Self {
        self.uri_resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn with_request_info(mut self, request_info: Arc<dyn ProvidesRequestInfo>) -> Self {
        self.request_info = Some(request_info);
        self
    }

    #[must_use]
    pub fn with_domain_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.domain_namespace = namespace.into();
        self
    }

    /// Appends a listener; listeners are notified in the order they were added.
    #[must_use]
    pub fn with_event_listener(mut self, listener: Arc<dyn ListensToEvents>) -> Self {
        self.event_listeners.push(listener);
        self
    }

    #[must_use]
    pub fn with_handler_builder(mut self, builder: Arc<dyn BuildsRequestHandler>) -> Self {
        self.handler_builder = Some(builder);
        self
    }

    #[must_use]
    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn domain_namespace(&self) -> &str {
        &self.domain_namespace
    }

    pub fn event_listeners(&self) -> &[Arc<dyn ListensToEvents>] {
        &self.event_listeners
    }

    /// Checks every collaborator and returns the validated set.
    ///
    /// Only the presence of collaborators and the namespace are checked here. What
    /// the request info contains (method, URI) is judged per request, so a bad
    /// request reaches the delegate instead of aborting `init()`.
    ///
    /// # Errors
    ///
    /// The first problem found, checked in this order: rewriter, resolver,
    /// request info, domain namespace, handler builder, responder.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let uri_rewriter = self.uri_rewriter.clone().ok_or(ConfigError::MissingUriRewriter)?;
        let uri_resolver = self.uri_resolver.clone().ok_or(ConfigError::MissingUriResolver)?;
        let request_info = self.request_info.clone().ok_or(ConfigError::MissingRequestInfo)?;

        if !DOMAIN_NAMESPACE.is_match(&self.domain_namespace) {
            return Err(ConfigError::InvalidDomainNamespace {
                namespace: self.domain_namespace.clone(),
            });
        }

        let handler_builder = self.handler_builder.clone().ok_or(ConfigError::MissingHandlerBuilder)?;
        let responder = self.responder.clone().ok_or(ConfigError::MissingResponder)?;

        Ok(ValidatedConfig {
            uri_rewriter,
            uri_resolver,
            request_info,
            domain_namespace: self.domain_namespace.clone(),
            event_listeners: self.event_listeners.clone(),
            handler_builder,
            responder,
        })
    }
}

impl fmt::Debug for IceHawkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IceHawkConfig")
            .field("uri_rewriter", &self.uri_rewriter.is_some())
            .field("uri_resolver", &self.uri_resolver.is_some())
            .field("request_info", &self.request_info.is_some())
            .field("domain_namespace", &self.domain_namespace)
            .field("event_listeners", &self.event_listeners.len())
            .field("handler_builder", &self.handler_builder.is_some())
            .field("responder", &self.responder.is_some())
            .finish()
    }
}

/// A configuration that passed [`IceHawkConfig::validate`]: every collaborator is present.
#[derive(Clone)]
pub struct ValidatedConfig {
    pub(crate) uri_rewriter: Arc<dyn RewritesUri>,
    pub(crate) uri_resolver: Arc<dyn ResolvesUri>,
    pub(crate) request_info: Arc<dyn ProvidesRequestInfo>,
    pub(crate) domain_namespace: String,
    pub(crate) event_listeners: Vec<Arc<dyn ListensToEvents>>,
    pub(crate) handler_builder: Arc<dyn BuildsRequestHandler>,
    pub(crate) responder: Arc<dyn Responder>,
}

impl ValidatedConfig {
    pub fn domain_namespace(&self) -> &str {
        &self.domain_namespace
    }
}

impl fmt::Debug for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedConfig")
            .field("domain_namespace", &self.domain_namespace)
            .field("event_listeners", &self.event_listeners.len())
            .finish_non_exhaustive()
    }
}
