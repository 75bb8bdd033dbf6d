//! Request handlers and the registry that builds them.
//!
//! Handlers are selected by a string identifier, but nothing is looked up by
//! reflection: the host registers a factory per identifier at configuration time
//! and [`HandlerRegistry`] only ever consults that table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::http::{BoxError, Method, RequestKind};
use crate::middleware::{MiddlewareHandler, Next};
use crate::request::Request;
use crate::resolve::UriComponents;
use crate::routing::{HandlerId, MiddlewareId};

/// Errors raised while building or running a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler namespace {requested:?} is not served by this registry ({served:?})")]
    UnknownNamespace { requested: String, served: String },

    #[error("no {kind} handler registered for {target}")]
    NotFound { kind: RequestKind, target: HandlerId },

    #[error("no middleware registered as {0}")]
    UnknownMiddleware(MiddlewareId),

    #[error("request handler failed: {0}")]
    Failed(#[source] BoxError),
}

/// Domain work for one request.
///
/// Implemented for every `Fn(&Request) -> Result<(), BoxError>` closure.
pub trait HandlesRequest: Send + Sync {
    fn handle_request(&self, request: &Request) -> Result<(), BoxError>;
}

impl<F> HandlesRequest for F
where
    F: Fn(&Request) -> Result<(), BoxError> + Send + Sync,
{
    fn handle_request(&self, request: &Request) -> Result<(), BoxError> {
        (self)(request)
    }
}

/// Produces the handler for a resolved request.
pub trait BuildsRequestHandler: Send + Sync {
    fn build(
        &self,
        domain_namespace: &str,
        method: Method,
        components: &UriComponents,
        request: &Request,
    ) -> Result<Box<dyn HandlesRequest>, HandlerError>;
}

/// Creates a fresh handler per request.
pub type HandlerFactory = Arc<dyn Fn(&Request) -> Box<dyn HandlesRequest> + Send + Sync>;

// A handler wrapped in its route's middleware chain.
struct Pipeline {
    middlewares: Vec<MiddlewareHandler>,
    handler: Box<dyn HandlesRequest>,
}

impl HandlesRequest for Pipeline {
    fn handle_request(&self, request: &Request) -> Result<(), BoxError> {
        Next::new(&self.middlewares, self.handler.as_ref()).run(request)
    }
}

/// Handler and middleware table for one domain namespace.
///
/// Handlers are keyed by the request's read/write kind and the resolved target,
/// so one target can have different read and write handlers.
///
/// # Examples
///
/// ```
/// use icehawk::handler::{BuildsRequestHandler, HandlerRegistry};
/// use icehawk::http::{BoxError, Method, RequestKind};
/// use icehawk::request::{Request, RequestBuilder, RequestEnvelope};
/// use icehawk::resolve::UriComponents;
///
/// let mut registry = HandlerRegistry::new("shop");
/// registry.register(RequestKind::Read, "orders/list", |_: &Request| -> Result<(), BoxError> { Ok(()) });
///
/// let components = UriComponents::new("orders/list".into(), RequestEnvelope::new(Method::Get, "/orders/list"));
/// let request = RequestBuilder::new(&components).build();
///
/// let handler = registry.build("shop", Method::Get, &components, &request).unwrap();
/// handler.handle_request(&request).unwrap();
///
/// assert!(registry.build("shop", Method::Post, &components, &request).is_err());
/// ```
#[derive(Clone)]
pub struct HandlerRegistry {
    namespace: String,
    handlers: HashMap<(RequestKind, HandlerId), HandlerFactory>,
    middlewares: HashMap<MiddlewareId, MiddlewareHandler>,
}

impl HandlerRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            handlers: HashMap::new(),
            middlewares: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registers a shared handler for `kind` requests to `target`.
    pub fn register<H>(&mut self, kind: RequestKind, target: impl Into<HandlerId>, handler: H)
    where
        H: HandlesRequest + Clone + 'static,
    {
        self.register_factory(
            kind,
            target,
            Arc::new(move |_: &Request| Box::new(handler.clone()) as Box<dyn HandlesRequest>),
        );
    }

    /// Registers a factory building a new handler for each request.
    pub fn register_factory(&mut self, kind: RequestKind, target: impl Into<HandlerId>, factory: HandlerFactory) {
        self.handlers.insert((kind, target.into()), factory);
    }

    pub fn register_middleware(&mut self, id: impl Into<MiddlewareId>, middleware: MiddlewareHandler) {
        self.middlewares.insert(id.into(), middleware);
    }

    pub fn contains(&self, kind: RequestKind, target: &HandlerId) -> bool {
        self.handlers.contains_key(&(kind, target.clone()))
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("namespace", &self.namespace)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("middlewares", &self.middlewares.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BuildsRequestHandler for HandlerRegistry {
    fn build(
        &self,
        domain_namespace: &str,
        method: Method,
        components: &UriComponents,
        request: &Request,
    ) -> Result<Box<dyn HandlesRequest>, HandlerError> {
        if domain_namespace != self.namespace {
            return Err(HandlerError::UnknownNamespace {
                requested: domain_namespace.to_owned(),
                served: self.namespace.clone(),
            });
        }

        let kind = method.kind();
        let target = components.target();
        let factory = self
            .handlers
            .get(&(kind, target.clone()))
            .ok_or_else(|| HandlerError::NotFound {
                kind,
                target: target.clone(),
            })?;

        let middlewares = components
            .middlewares()
            .iter()
            .map(|id| {
                self.middlewares
                    .get(id)
                    .cloned()
                    .ok_or_else(|| HandlerError::UnknownMiddleware(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            namespace = domain_namespace,
            %method,
            target = %target,
            middlewares = middlewares.len(),
            "request handler built"
        );

        let handler = factory(request);
        if middlewares.is_empty() {
            Ok(handler)
        } else {
            Ok(Box::new(Pipeline {
                middlewares,
                handler,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{LoggerMiddleware, from_middleware};
    use crate::request::{RequestBuilder, RequestEnvelope};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording_handler(name: &'static str, log: &Log) -> impl HandlesRequest + Clone + 'static {
        let log = Arc::clone(log);
        move |request: &Request| -> Result<(), BoxError> {
            log.lock().unwrap().push(format!("{name} {}", request.uri()));
            Ok(())
        }
    }

    fn components(method: Method, uri: &str, target: &str, middlewares: &[&str]) -> UriComponents {
        UriComponents::new(HandlerId::new(target), RequestEnvelope::new(method, uri))
            .with_middlewares(middlewares.iter().copied().map(MiddlewareId::new).collect())
    }

    fn build_and_run(registry: &HandlerRegistry, components: &UriComponents) -> Result<(), BoxError> {
        let request = RequestBuilder::new(components).build();
        let handler = registry.build("app", request.method(), components, &request)?;
        handler.handle_request(&request)
    }

    #[test]
    fn read_and_write_handlers_are_separate() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new("app");
        registry.register(RequestKind::Read, "orders/item", recording_handler("read", &log));
        registry.register(RequestKind::Write, "orders/item", recording_handler("write", &log));

        build_and_run(&registry, &components(Method::Get, "/orders/item", "orders/item", &[])).unwrap();
        build_and_run(&registry, &components(Method::Patch, "/orders/item", "orders/item", &[])).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["read /orders/item", "write /orders/item"]
        );
    }

    #[test]
    fn foreign_namespace_is_rejected() {
        let registry = HandlerRegistry::new("app");
        let c = components(Method::Get, "/a/b", "a/b", &[]);
        let request = RequestBuilder::new(&c).build();
        let err = registry.build("other", Method::Get, &c, &request).err().unwrap();
        assert!(matches!(err, HandlerError::UnknownNamespace { .. }));
    }

    #[test]
    fn missing_handler_is_reported() {
        let registry = HandlerRegistry::new("app");
        let c = components(Method::Delete, "/a/b", "a/b", &[]);
        let request = RequestBuilder::new(&c).build();
        match registry.build("app", Method::Delete, &c, &request) {
            Err(HandlerError::NotFound { kind, target }) => {
                assert_eq!(kind, RequestKind::Write);
                assert_eq!(target.as_str(), "a/b");
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn middleware_wraps_handler_in_route_order() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new("app");
        registry.register(RequestKind::Read, "a/b", recording_handler("handler", &log));
        for tag in ["outer", "inner"] {
            let log = Arc::clone(&log);
            registry.register_middleware(
                tag,
                Arc::new(move |request: &Request, next: Next<'_>| {
                    log.lock().unwrap().push(tag.to_owned());
                    next.run(request)
                }),
            );
        }
        registry.register_middleware("logger", from_middleware(Arc::new(LoggerMiddleware)));

        build_and_run(&registry, &components(Method::Get, "/a/b", "a/b", &["outer", "logger", "inner"])).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner", "handler /a/b"]);
    }

    #[test]
    fn unknown_middleware_is_reported() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new("app");
        registry.register(RequestKind::Read, "a/b", recording_handler("handler", &log));
        let c = components(Method::Get, "/a/b", "a/b", &["missing"]);
        let request = RequestBuilder::new(&c).build();
        assert!(matches!(
            registry.build("app", Method::Get, &c, &request),
            Err(HandlerError::UnknownMiddleware(id)) if id.as_str() == "missing"
        ));
    }

    #[test]
    fn factory_runs_per_build() {
        let builds = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&builds);
        let mut registry = HandlerRegistry::new("app");
        registry.register_factory(
            RequestKind::Read,
            "a/b",
            Arc::new(move |_: &Request| {
                *counter.lock().unwrap() += 1;
                Box::new(|_: &Request| -> Result<(), BoxError> { Ok(()) }) as Box<dyn HandlesRequest>
            }),
        );
        let c = components(Method::Get, "/a/b", "a/b", &[]);
        build_and_run(&registry, &c).unwrap();
        build_and_run(&registry, &c).unwrap();
        assert_eq!(*builds.lock().unwrap(), 2);
    }
}
