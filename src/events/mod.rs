//! Lifecycle events and the bus that delivers them.
//!
//! The orchestrator publishes three events: [`Event::Initialized`] once `init`
//! succeeds, then [`Event::HandlingRequest`] and [`Event::RequestHandled`] around
//! the handler call. Listeners see every event they accept, in registration order.

use std::fmt;
use std::sync::Arc;

use crate::http::{BoxError, RequestInfo};
use crate::request::Request;

/// A lifecycle event. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Initialized,
    HandlingRequest {
        request_info: RequestInfo,
        request: Request,
    },
    RequestHandled {
        request_info: RequestInfo,
        request: Request,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Initialized => "initialized",
            Event::HandlingRequest { .. } => "handling_request",
            Event::RequestHandled { .. } => "request_handled",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something that wants to hear about lifecycle events.
pub trait ListensToEvents: Send + Sync {
    /// Whether `notify` should be called for `event`.
    fn accepts_event(&self, event: &Event) -> bool;

    fn notify(&self, event: &Event) -> Result<(), BoxError>;
}

type Predicate = dyn Fn(&Event) -> bool + Send + Sync;
type Notify = dyn Fn(&Event) -> Result<(), BoxError> + Send + Sync;

/// A listener assembled from a predicate and a notify closure.
///
/// # Examples
///
/// ```
/// use icehawk::events::{Event, EventBus, EventListener};
///
/// let listener = EventListener::new(
///     |event| matches!(event, Event::Initialized),
///     |event| {
///         println!("got {event}");
///         Ok(())
///     },
/// );
///
/// let bus = EventBus::new(vec![std::sync::Arc::new(listener)]);
/// bus.publish(&Event::Initialized).unwrap();
/// ```
pub struct EventListener {
    predicate: Box<Predicate>,
    notify: Box<Notify>,
}

impl EventListener {
    pub fn new<P, N>(predicate: P, notify: N) -> Self
    where
        P: Fn(&Event) -> bool + Send + Sync + 'static,
        N: Fn(&Event) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            notify: Box::new(notify),
        }
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener").finish_non_exhaustive()
    }
}

impl ListensToEvents for EventListener {
    fn accepts_event(&self, event: &Event) -> bool {
        (self.predicate)(event)
    }

    fn notify(&self, event: &Event) -> Result<(), BoxError> {
        (self.notify)(event)
    }
}

/// Delivers events to listeners.
///
/// No priorities and no short-circuit on acceptance: every listener is asked, in
/// registration order. A failing listener stops delivery and its error is returned
/// unchanged to the caller.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn ListensToEvents>>,
}

impl EventBus {
    pub fn new(listeners: Vec<Arc<dyn ListensToEvents>>) -> Self {
        Self { listeners }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn publish(&self, event: &Event) -> Result<(), BoxError> {
        for listener in &self.listeners {
            if listener.accepts_event(event) {
                listener.notify(event)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
