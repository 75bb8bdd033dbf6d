//! Outbound side of the pipeline: redirect decisions and the capability used to
//! hand a response to the transport. Writing the response out is the host's job.

use std::sync::{Mutex, PoisonError};

use super::{BoxError, Headers, StatusCode};

/// A status and headers for the host to send. The pipeline only ever produces
/// redirects, so there is no body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }
}

/// The capability of sending a response back to the client.
pub trait Responder: Send + Sync {
    fn respond(&self, response: Response) -> Result<(), BoxError>;
}

/// A [`Responder`] that keeps every response for the host to write out later.
#[derive(Debug, Default)]
pub struct BufferedResponder {
    responses: Mutex<Vec<Response>>,
}

impl BufferedResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every collected response.
    ///
    /// A panic elsewhere while the buffer was locked does not lose what was
    /// already pushed; the vector is never left half-written.
    pub fn take(&self) -> Vec<Response> {
        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *responses)
    }
}

impl Responder for BufferedResponder {
    fn respond(&self, response: Response) -> Result<(), BoxError> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(response);
        Ok(())
    }
}

/// A rewrite decision: where the request should live, and with which status to
/// send the client there if that is not where it is now.
///
/// # Examples
///
/// ```
/// use icehawk::http::{Redirect, StatusCode};
///
/// let redirect = Redirect::new("/domain/rewritten", StatusCode::MovedPermanently);
/// assert!(!redirect.url_equals("/domain/original"));
///
/// let response = redirect.into_response();
/// assert_eq!(response.headers().get("location"), Some("/domain/rewritten"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    url: String,
    status: StatusCode,
}

impl Redirect {
    pub fn new(url: impl Into<String>, status: StatusCode) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// `true` when the decision points at `url` itself, i.e. nothing to redirect.
    pub fn url_equals(&self, url: &str) -> bool {
        self.url == url
    }

    /// Status line plus `Location` header.
    pub fn into_response(self) -> Response {
        Response::new(self.status).header("Location", self.url)
    }

    /// Sends the redirect through `responder`.
    pub fn respond(&self, responder: &dyn Responder) -> Result<(), BoxError> {
        responder.respond(self.clone().into_response())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn redirect_response_carries_location() {
        let response = Redirect::new("/b", StatusCode::SeeOther).into_response();
        assert_eq!(response.status(), StatusCode::SeeOther);
        assert_eq!(response.headers().get("Location"), Some("/b"));
    }

    #[test]
    fn redirect_url_equals() {
        let redirect = Redirect::new("/same", StatusCode::MovedPermanently);
        assert!(redirect.url_equals("/same"));
        assert!(!redirect.url_equals("/same/"));
    }

    #[test]
    fn buffered_responder_collects() {
        let responder = BufferedResponder::new();
        Redirect::new("/x", StatusCode::Found)
            .respond(&responder)
            .unwrap();
        let taken = responder.take();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].status(), StatusCode::Found);
        assert!(responder.take().is_empty());
    }

    #[test]
    fn buffered_responder_survives_a_poisoned_lock() {
        let responder = Arc::new(BufferedResponder::new());
        Redirect::new("/kept", StatusCode::Found)
            .respond(&*responder)
            .unwrap();

        let holder = Arc::clone(&responder);
        let panicked = thread::spawn(move || {
            let _guard = holder.responses.lock().unwrap();
            panic!("writer died while holding the buffer");
        })
        .join();
        assert!(panicked.is_err());
        assert!(responder.responses.is_poisoned());

        Redirect::new("/after", StatusCode::SeeOther)
            .respond(&*responder)
            .unwrap();
        let taken = responder.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].headers().get("Location"), Some("/kept"));
        assert_eq!(taken[1].headers().get("Location"), Some("/after"));
    }
}
