//! transport::mock
//!
//! Mock transport for deterministic testing.
//!
//! # Design
//!
//! Replies are scripted per URL and consumed in order; once a URL's script
//! is exhausted the default reply is used (a success envelope with a `null`
//! payload unless overridden). Every call is recorded before the reply is
//! produced, so the dispatch log also covers failing calls.
//!
//! # Example
//!
//! ```
//! use formweave::transport::{CallEnvelope, MockReply, MockTransport, Transport};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mock = MockTransport::new().reply("users/read/7", MockReply::ok(json!({"id": 7})));
//!
//! let call = CallEnvelope { url: "users/read/7".to_string(), parameters: None };
//! let body = mock.send(&call).await.unwrap();
//!
//! assert_eq!(body["return"], json!({"id": 7}));
//! assert_eq!(mock.dispatched().len(), 1);
//! # });
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::traits::{error_envelope, success_envelope, CallEnvelope, Transport, TransportFailure};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this raw body.
    Body(Value),
    /// Fail with this classification.
    Fail(TransportFailure),
    /// Wait, then produce the inner reply.
    Delayed(Duration, Box<MockReply>),
    /// Never complete.
    Hang,
}

impl MockReply {
    /// A success envelope around `payload`.
    pub fn ok(payload: Value) -> Self {
        MockReply::Body(success_envelope(payload))
    }

    /// A remote error envelope.
    pub fn remote_error(code: i64, message: &str) -> Self {
        MockReply::Body(error_envelope(code, message))
    }
}

/// Mock transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share the
/// script and the dispatch log.
#[derive(Debug, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug)]
struct MockTransportInner {
    /// Scripted replies by URL.
    replies: HashMap<String, VecDeque<MockReply>>,
    /// Reply used when no script applies.
    default_reply: MockReply,
    /// Recorded calls for verification.
    dispatched: Vec<CallEnvelope>,
}

impl MockTransport {
    /// Create a mock that answers every call with an empty success.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                replies: HashMap::new(),
                default_reply: MockReply::ok(Value::Null),
                dispatched: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Script the next reply for `url`.
    ///
    /// Multiple replies for the same URL are consumed in order.
    pub fn reply(self, url: &str, reply: MockReply) -> Self {
        self.lock()
            .replies
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Replace the reply used when no script applies.
    pub fn default_reply(self, reply: MockReply) -> Self {
        self.lock().default_reply = reply;
        self
    }

    /// All recorded calls, in dispatch order.
    pub fn dispatched(&self) -> Vec<CallEnvelope> {
        self.lock().dispatched.clone()
    }

    /// URLs of all recorded calls, in dispatch order.
    pub fn dispatched_urls(&self) -> Vec<String> {
        self.lock()
            .dispatched
            .iter()
            .map(|call| call.url.clone())
            .collect()
    }

    /// Clear the dispatch log.
    pub fn clear_dispatched(&self) {
        self.lock().dispatched.clear();
    }

    fn next_reply(&self, call: &CallEnvelope) -> MockReply {
        let mut inner = self.lock();
        inner.dispatched.push(call.clone());
        let scripted = inner
            .replies
            .get_mut(&call.url)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| inner.default_reply.clone())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

async fn play(mut reply: MockReply) -> Result<Value, TransportFailure> {
    loop {
        match reply {
            MockReply::Body(body) => return Ok(body),
            MockReply::Fail(failure) => return Err(failure),
            MockReply::Delayed(delay, inner) => {
                tokio::time::sleep(delay).await;
                reply = *inner;
            }
            MockReply::Hang => return std::future::pending().await,
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, call: &CallEnvelope) -> Result<Value, TransportFailure> {
        let reply = self.next_reply(call);
        play(reply).await
    }
}
