//! # icehawk
//!
//! The request-dispatch core of a small HTTP front controller.
//!
//! A request passes through these stages, in order:
//!
//! 1. **Rewrite**: a [`RewritesUri`](rewrite::RewritesUri) collaborator decides
//!    whether the client should be sent elsewhere. If so, the redirect is
//!    written and nothing else happens.
//! 2. **Resolve**: a [`ResolvesUri`](resolve::ResolvesUri) collaborator turns the
//!    request into a handler target. The routing resolver first lets a
//!    [`RequestProxy`](routing::RequestProxy) redirect the request internally,
//!    then asks the [`Router`](routing::Router) for the first matching route.
//! 3. **Build**: the resolved parameters are merged into a typed
//!    [`Request`](request::Request), read- or write-shaped by method.
//! 4. **Dispatch**: the handler runs behind its route's middleware, framed by
//!    `HandlingRequest` and `RequestHandled` events.
//!
//! Any failure during a request is handed once to the host's
//! [`ControlsHandlingBehaviour`] delegate.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use icehawk::{IceHawk, IceHawkConfig, IceHawkDelegate, Outcome};
//! use icehawk::config::RoutingConfig;
//! use icehawk::handler::HandlerRegistry;
//! use icehawk::http::{BoxError, BufferedResponder, RequestInfo, RequestInput, RequestKind};
//! use icehawk::request::Request;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = RoutingConfig::load_resolver(
//!         r#"{ "routes": [ { "method": "GET", "pattern": "^/hello/(?<name>\\w+)$", "handler": "hello" } ] }"#,
//!     )?;
//!
//!     let mut handlers = HandlerRegistry::new("Greeter");
//!     handlers.register(RequestKind::Read, "hello", |request: &Request| -> Result<(), BoxError> {
//!         println!("Hello, {}!", request.get("name").unwrap_or("world"));
//!         Ok(())
//!     });
//!
//!     let config = IceHawkConfig::with_defaults()
//!         .with_uri_resolver(Arc::new(resolver))
//!         .with_domain_namespace("Greeter")
//!         .with_handler_builder(Arc::new(handlers))
//!         .with_responder(Arc::new(BufferedResponder::new()));
//!
//!     // One IceHawk per request; the configuration is cloned, not rebuilt.
//!     let info = RequestInfo::new("GET", "/hello/ferris");
//!     let input = RequestInput::from_request_info(&info);
//!     let mut icehawk = IceHawk::new(config.with_request_info(Arc::new(info)), Arc::new(IceHawkDelegate));
//!     icehawk.init()?;
//!     assert_eq!(icehawk.handle_request(input)?, Outcome::Handled);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod events;
pub mod handler;
pub mod http;
pub mod icehawk;
pub mod middleware;
pub mod request;
pub mod resolve;
pub mod rewrite;
pub mod routing;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::{ConfigError, IceHawkConfig, RoutingConfig};
pub use events::{Event, EventBus, EventListener, ListensToEvents};
pub use http::{Method, RequestInfo, RequestInput, StatusCode};
pub use icehawk::{ControlsHandlingBehaviour, IceHawk, IceHawkDelegate, IceHawkError, Outcome, State};
pub use request::Request;
