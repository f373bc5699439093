//! transport::request
//!
//! Requests, batches, and URL construction.
//!
//! # Design
//!
//! A [`Request`] owns its callbacks. Callbacks run on the queue's drain
//! task, after the transport completes and before the next request is
//! dispatched. Each callback is handed the queue itself (the default
//! context); any other context is captured by the closure.
//!
//! A [`Batch`] is either one request or an ordered sequence sharing one
//! batch id. Sequence members are drained strictly in order regardless of
//! individual success or failure.

use serde_json::{Map, Value};

use super::queue::TransportQueue;
use super::traits::ErrorEnvelope;

/// Callback invoked with the normalized payload on success.
pub type OkCallback = Box<dyn FnOnce(&TransportQueue, Value) + Send>;

/// Callback invoked with the normalized error on failure.
pub type ErrorCallback = Box<dyn FnOnce(&TransportQueue, ErrorEnvelope) + Send>;

/// Identifier shared by every request of one enqueued batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u64);

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One queued call.
pub struct Request {
    /// Service URL
    pub url: String,
    /// Call parameters
    pub parameters: Option<Map<String, Value>>,
    pub(crate) on_ok: Option<OkCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl Request {
    /// Create a request with no parameters and no callbacks.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parameters: None,
            on_ok: None,
            on_error: None,
        }
    }

    /// Set the call parameters.
    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Set the success callback.
    pub fn on_ok<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&TransportQueue, Value) + Send + 'static,
    {
        self.on_ok = Some(Box::new(callback));
        self
    }

    /// Set the error callback.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&TransportQueue, ErrorEnvelope) + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Whether the request can be queued.
    pub fn is_valid(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("parameters", &self.parameters)
            .field("has_on_ok", &self.on_ok.is_some())
            .field("has_on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Build a request from its parts.
pub fn build_request(
    url: impl Into<String>,
    parameters: Option<Map<String, Value>>,
    on_ok: Option<OkCallback>,
    on_error: Option<ErrorCallback>,
) -> Request {
    Request {
        url: url.into(),
        parameters,
        on_ok,
        on_error,
    }
}

/// One request or an ordered sequence of requests.
#[derive(Debug)]
pub enum Batch {
    Single(Request),
    Sequence(Vec<Request>),
}

impl Batch {
    pub(crate) fn into_requests(self) -> Vec<Request> {
        match self {
            Batch::Single(request) => vec![request],
            Batch::Sequence(requests) => requests,
        }
    }
}

impl From<Request> for Batch {
    fn from(request: Request) -> Self {
        Batch::Single(request)
    }
}

impl From<Vec<Request>> for Batch {
    fn from(requests: Vec<Request>) -> Self {
        Batch::Sequence(requests)
    }
}

/// Join non-empty URL segments with `/`.
///
/// Segments are trimmed of surrounding slashes. URL-encoding is the
/// transport's responsibility.
///
/// # Example
///
/// ```
/// use formweave::transport::build_url;
///
/// assert_eq!(build_url(&["users", "account"], Some("read"), Some("7")), "users/account/read/7");
/// assert_eq!(build_url(&["users", ""], Some("create"), None), "users/create");
/// ```
pub fn build_url<S: AsRef<str>>(path: &[S], action: Option<&str>, key: Option<&str>) -> String {
    path.iter()
        .map(AsRef::as_ref)
        .chain(action)
        .chain(key)
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
