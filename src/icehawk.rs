//! The front controller: `init()` once, then `handle_request()` for the request.
//!
//! ```text
//! Unconfigured ──init()──▶ Initialized ──handle_request()──▶ Dispatching ──▶ Completed
//!                                                                  │
//!                                                                  └──────▶ Failed
//! ```
//!
//! One [`IceHawk`] serves one request. Hosts keep a single [`IceHawkConfig`]
//! and clone it (every collaborator is an `Arc`) for each incoming request.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{ConfigError, IceHawkConfig, ValidatedConfig};
use crate::events::{Event, EventBus};
use crate::handler::HandlerError;
use crate::http::{
    BoxError, Method, ProvidesRequestInfo, RequestInfo, RequestInput, StatusCode, UnrecognizedMethod,
};
use crate::request::{RequestBuilder, RequestEnvelope};
use crate::resolve::ResolveError;

/// Where an [`IceHawk`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Unconfigured,
    Initialized,
    Dispatching,
    Completed,
    Failed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconfigured => "unconfigured",
            Self::Initialized => "initialized",
            Self::Dispatching => "dispatching",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// How a request cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The rewriter sent the client elsewhere; no handler ran.
    Redirected { url: String, status: StatusCode },
    /// The handler ran and both request events were published.
    Handled,
    /// A failure was handed to the delegate.
    Failed,
}

/// Everything that can go wrong in `init()` or `handle_request()`.
#[derive(Debug, Error)]
pub enum IceHawkError {
    #[error("cannot handle a request in state {state}; init() must succeed first")]
    NotInitialized { state: State },

    #[error("init() called in state {state}")]
    AlreadyInitialized { state: State },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    UnrecognizedMethod(#[from] UnrecognizedMethod),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("event listener failed on {event}: {source}")]
    Listener {
        event: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("sending redirect failed: {0}")]
    Respond(#[source] BoxError),
}

/// Host hooks around the request cycle.
pub trait ControlsHandlingBehaviour: Send + Sync {
    /// Called by `init()` before the configuration is validated.
    fn setup_error_handling(&self) {}

    /// Called by `init()` right after [`setup_error_handling`](Self::setup_error_handling).
    fn setup_session_handling(&self) {}

    /// Receives every failure raised while handling a request, exactly once.
    fn handle_uncaught_exception(&self, error: &IceHawkError);
}

/// Default delegate: no setup, uncaught failures are logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IceHawkDelegate;

impl ControlsHandlingBehaviour for IceHawkDelegate {
    fn handle_uncaught_exception(&self, error: &IceHawkError) {
        error!(error = %error, "uncaught failure while handling request");
    }
}

// Collaborators available once init() has succeeded.
struct Runtime {
    config: ValidatedConfig,
    events: EventBus,
}

impl Runtime {
    fn publish(&self, event: Event) -> Result<(), IceHawkError> {
        self.events
            .publish(&event)
            .map_err(|source| IceHawkError::Listener {
                event: event.name(),
                source,
            })
    }

    fn dispatch(&self, input: RequestInput) -> Result<Outcome, IceHawkError> {
        let config = &self.config;
        let request_info = RequestInfo::from_provider(&*config.request_info);

        let redirect = config.uri_rewriter.rewrite(&request_info);
        if !redirect.url_equals(request_info.uri()) {
            info!(
                uri = request_info.uri(),
                location = redirect.url(),
                status = %redirect.status(),
                "redirecting request"
            );
            redirect.respond(&*config.responder).map_err(IceHawkError::Respond)?;
            return Ok(Outcome::Redirected {
                url: redirect.url().to_owned(),
                status: redirect.status(),
            });
        }

        let method: Method = request_info.method().parse()?;
        let envelope = RequestEnvelope::new(method, request_info.uri())
            .with_query(input.query)
            .with_body(input.body)
            .with_files(input.files);

        let components = config.uri_resolver.resolve_uri(envelope)?;
        let request = RequestBuilder::new(&components).build();
        debug!(
            method = %request.method(),
            uri = request.uri(),
            target = %components.target(),
            "request resolved"
        );

        self.publish(Event::HandlingRequest {
            request_info: request_info.clone(),
            request: request.clone(),
        })?;

        let handler = config.handler_builder.build(
            &config.domain_namespace,
            request.method(),
            &components,
            &request,
        )?;
        handler.handle_request(&request).map_err(HandlerError::Failed)?;

        info!(method = %request.method(), uri = request.uri(), target = %components.target(), "request handled");
        self.publish(Event::RequestHandled { request_info, request })?;

        Ok(Outcome::Handled)
    }
}

/// The request-dispatch orchestrator.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use icehawk::{IceHawk, IceHawkConfig, IceHawkDelegate, Outcome};
/// use icehawk::handler::HandlerRegistry;
/// use icehawk::http::{BoxError, BufferedResponder, RequestInfo, RequestInput, RequestKind};
/// use icehawk::request::Request;
///
/// let mut registry = HandlerRegistry::new("Shop");
/// registry.register(RequestKind::Read, "orders/list", |request: &Request| -> Result<(), BoxError> {
///     assert_eq!(request.get("page"), Some("2"));
///     Ok(())
/// });
///
/// let info = RequestInfo::new("GET", "/orders/list?page=2");
/// let input = RequestInput::from_request_info(&info);
/// let config = IceHawkConfig::with_defaults()
///     .with_request_info(Arc::new(info))
///     .with_domain_namespace("Shop")
///     .with_handler_builder(Arc::new(registry))
///     .with_responder(Arc::new(BufferedResponder::new()));
///
/// let mut icehawk = IceHawk::new(config, Arc::new(IceHawkDelegate));
/// icehawk.init().unwrap();
/// assert_eq!(icehawk.handle_request(input).unwrap(), Outcome::Handled);
/// ```
pub struct IceHawk {
    config: IceHawkConfig,
    delegate: Arc<dyn ControlsHandlingBehaviour>,
    state: State,
    runtime: Option<Runtime>,
}

impl IceHawk {
    pub fn new(config: IceHawkConfig, delegate: Arc<dyn ControlsHandlingBehaviour>) -> Self {
        Self {
            config,
            delegate,
            state: State::Unconfigured,
            runtime: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Runs the delegate's setup hooks, validates the configuration and
    /// publishes [`Event::Initialized`].
    ///
    /// # Errors
    ///
    /// Configuration problems and listener failures are returned as-is and
    /// leave the instance `Unconfigured`; they never reach the delegate.
    pub fn init(&mut self) -> Result<(), IceHawkError> {
        if self.state != State::Unconfigured {
            return Err(IceHawkError::AlreadyInitialized { state: self.state });
        }

        self.delegate.setup_error_handling();
        self.delegate.setup_session_handling();

        let config = self.config.validate()?;
        let runtime = Runtime {
            events: EventBus::new(config.event_listeners.clone()),
            config,
        };
        runtime.publish(Event::Initialized)?;

        info!(
            namespace = runtime.config.domain_namespace(),
            listeners = runtime.events.len(),
            "icehawk initialized"
        );
        self.runtime = Some(runtime);
        self.state = State::Initialized;
        Ok(())
    }

    /// Handles the current request with the caller's query, body and file data.
    ///
    /// Every failure after the precondition check goes to the delegate's
    /// [`handle_uncaught_exception`](ControlsHandlingBehaviour::handle_uncaught_exception)
    /// and yields `Ok(Outcome::Failed)`.
    ///
    /// # Errors
    ///
    /// [`IceHawkError::NotInitialized`] unless the instance is `Initialized`.
    pub fn handle_request(&mut self, input: RequestInput) -> Result<Outcome, IceHawkError> {
        let runtime = match (self.state, &self.runtime) {
            (State::Initialized, Some(runtime)) => runtime,
            (state, _) => return Err(IceHawkError::NotInitialized { state }),
        };

        self.state = State::Dispatching;
        match runtime.dispatch(input) {
            Ok(outcome) => {
                self.state = State::Completed;
                Ok(outcome)
            }
            Err(err) => {
                self.delegate.handle_uncaught_exception(&err);
                self.state = State::Failed;
                Ok(Outcome::Failed)
            }
        }
    }
}

impl fmt::Debug for IceHawk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IceHawk")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
