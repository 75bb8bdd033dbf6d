//! Middleware pipeline: ordered before/after logic around a request handler.
//!
//! Routes name their middleware by [`MiddlewareId`](crate::routing::MiddlewareId);
//! the [`HandlerRegistry`](crate::handler::HandlerRegistry) resolves those names
//! to [`MiddlewareHandler`]s and runs them, in route order, in front of the handler.
//!
//! ## Core types
//!
//! - [`Middleware`]: trait implemented by all middleware.
//! - [`Next`]: cursor into the remaining chain; call [`Next::run`] to advance.
//! - [`MiddlewareHandler`]: type-erased, cheaply-cloneable middleware function.
//! - [`from_middleware`]: converts a [`Middleware`] into a [`MiddlewareHandler`].
//! - [`LoggerMiddleware`]: built-in request logger.

use std::sync::Arc;
use std::time::Instant;

use crate::handler::HandlesRequest;
use crate::http::BoxError;
use crate::request::Request;

/// A type-erased, reference-counted middleware function.
pub type MiddlewareHandler =
    Arc<dyn Fn(&Request, Next<'_>) -> Result<(), BoxError> + Send + Sync + 'static>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |request: &Request, next: Next<'_>| middleware.handle(request, next))
}

/// A cursor into the remaining middleware chain for one request.
///
/// `Next` is consumed by [`run`](Self::run), so each middleware can forward at most once.
pub struct Next<'a> {
    middlewares: &'a [MiddlewareHandler],
    handler: &'a dyn HandlesRequest,
}

impl<'a> Next<'a> {
    /// Positions a cursor at the start of `middlewares`, ending in `handler`.
    pub fn new(middlewares: &'a [MiddlewareHandler], handler: &'a dyn HandlesRequest) -> Self {
        Self {
            middlewares,
            handler,
        }
    }

    /// Invokes the next middleware, or the handler once the chain is exhausted.
    pub fn run(self, request: &Request) -> Result<(), BoxError> {
        match self.middlewares.split_first() {
            Some((current, rest)) => current(request, Next::new(rest, self.handler)),
            None => self.handler.handle_request(request),
        }
    }
}

/// The core trait for all middleware.
///
/// Implementors may pass through (`next.run(request)`), short-circuit by returning
/// without calling `next`, or act after the downstream result is known.
pub trait Middleware: Send + Sync {
    fn handle(&self, request: &Request, next: Next<'_>) -> Result<(), BoxError>;
}

/// Logs each request's method, URI, outcome and duration.
///
/// Emits a single `tracing::info!` line once the downstream chain has returned.
/// Never short-circuits.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, request: &Request, next: Next<'_>) -> Result<(), BoxError> {
        let start = Instant::now();

        let result = next.run(request);

        let duration = start.elapsed();
        let outcome = if result.is_ok() { "ok" } else { "error" };
        tracing::info!(
            method = %request.method(),
            uri = request.uri(),
            outcome,
            ?duration,
            "request handled"
        );

        result
    }
}
