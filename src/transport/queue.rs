//! transport::queue
//!
//! The serialized request queue.
//!
//! # Design
//!
//! All requests funnel through one FIFO with a single in-flight marker.
//! Enqueueing returns immediately; the first enqueue on an idle queue spawns
//! a drain task that runs until the FIFO is empty. The drain task pops the
//! oldest batch, shifts its first member, puts the remainder back at the
//! front under the same batch id, and dispatches the member through the
//! transport. The member's callback runs before the next member is taken.
//!
//! Ordering guarantees:
//!
//! - Members of one batch are dispatched in enqueue order, one at a time.
//! - A later batch never overtakes an earlier one still being drained.
//! - A failed member does not stop the rest of its batch.
//!
//! A panicking callback is caught and logged; the drain task carries on
//! with the next member.
//!
//! Transport failures never reach the enqueuer. They are classified,
//! mapped to an [`ErrorEnvelope`], and handed to the member's error callback.
//!
//! # Example
//!
//! ```
//! use formweave::transport::{MockTransport, MockReply, Request, TransportQueue};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let mock = MockTransport::new().reply("users/read/7", MockReply::ok(json!({"id": 7})));
//! let queue = TransportQueue::new(Arc::new(mock.clone()), Duration::from_secs(5));
//!
//! queue.enqueue(Request::new("users/read/7")).unwrap();
//! queue.wait_idle().await;
//!
//! assert_eq!(mock.dispatched_urls(), vec!["users/read/7"]);
//! # });
//! ```

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, warn};

use super::request::{Batch, BatchId, Request};
use super::traits::{normalize_response, CallEnvelope, ErrorEnvelope, Transport, TransportFailure};

/// Errors raised synchronously by [`TransportQueue::enqueue`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    /// No request in the batch had a usable URL.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Enqueue was called outside a tokio runtime.
    #[error("no async runtime available to drain the queue")]
    NoRuntime,
}

/// Handle to the shared request queue.
///
/// Clones share the same FIFO and in-flight marker.
#[derive(Clone)]
pub struct TransportQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    state: Mutex<QueueState>,
    idle: Notify,
}

#[derive(Default)]
struct QueueState {
    batches: VecDeque<QueuedBatch>,
    in_flight: bool,
    next_batch_id: u64,
}

struct QueuedBatch {
    id: BatchId,
    requests: VecDeque<Request>,
}

impl QueueState {
    /// Shift the next request, re-queuing the rest of its batch at the front.
    fn take_next(&mut self) -> Option<(BatchId, Request)> {
        loop {
            let mut batch = self.batches.pop_front()?;
            let Some(request) = batch.requests.pop_front() else {
                continue;
            };
            let id = batch.id;
            if !batch.requests.is_empty() {
                self.batches.push_front(batch);
            }
            return Some((id, request));
        }
    }
}

impl TransportQueue {
    /// Create a queue dispatching through `transport`.
    ///
    /// `timeout` is the single global limit applied to every dispatch.
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                transport,
                timeout,
                state: Mutex::new(QueueState {
                    next_batch_id: 1,
                    ..Default::default()
                }),
                idle: Notify::new(),
            }),
        }
    }

    /// The global dispatch timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Name of the underlying transport.
    pub fn transport_name(&self) -> &'static str {
        self.inner.transport.name()
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a request or batch and start draining if idle.
    ///
    /// Members with an empty URL are dropped.
    ///
    /// # Errors
    ///
    /// - [`QueueError::InvalidRequest`] if no member has a usable URL
    /// - [`QueueError::NoRuntime`] if called outside a tokio runtime
    pub fn enqueue(&self, batch: impl Into<Batch>) -> Result<BatchId, QueueError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| QueueError::NoRuntime)?;

        let mut requests = VecDeque::new();
        let mut dropped = 0usize;
        for request in batch.into().into_requests() {
            if request.is_valid() {
                requests.push_back(request);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(dropped, "dropped requests without a url");
        }
        if requests.is_empty() {
            return Err(QueueError::InvalidRequest(
                "batch contains no request with a url".to_string(),
            ));
        }

        let count = requests.len();
        let (id, start) = {
            let mut state = self.state();
            let id = BatchId(state.next_batch_id);
            state.next_batch_id += 1;
            state.batches.push_back(QueuedBatch { id, requests });
            let start = !state.in_flight;
            state.in_flight = true;
            (id, start)
        };

        debug!(batch = %id, requests = count, "enqueued batch");
        if start {
            runtime.spawn(self.clone().drain());
        }
        Ok(id)
    }

    /// Number of queued requests not yet dispatched.
    pub fn pending(&self) -> usize {
        self.state()
            .batches
            .iter()
            .map(|batch| batch.requests.len())
            .sum()
    }

    /// Whether nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        let state = self.state();
        !state.in_flight && state.batches.is_empty()
    }

    /// Wait until the queue has drained completely.
    ///
    /// Requests enqueued by callbacks are drained too.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    async fn drain(self) {
        loop {
            let next = {
                let mut state = self.state();
                match state.take_next() {
                    Some(next) => next,
                    None => {
                        state.in_flight = false;
                        drop(state);
                        self.inner.idle.notify_waiters();
                        return;
                    }
                }
            };
            let (id, request) = next;
            self.dispatch(id, request).await;
        }
    }

    async fn dispatch(&self, id: BatchId, request: Request) {
        let Request {
            url,
            parameters,
            on_ok,
            on_error,
        } = request;
        let call = CallEnvelope { url, parameters };
        debug!(batch = %id, url = %call.url, "dispatching request");

        let outcome = self.send(call.clone()).await;
        let result = match outcome {
            Ok(body) => normalize_response(body),
            Err(failure) => {
                warn!(batch = %id, url = %call.url, error = %failure, "transport failure");
                Err(ErrorEnvelope::from(failure))
            }
        };

        match result {
            Ok(payload) => {
                debug!(batch = %id, url = %call.url, "request succeeded");
                if let Some(callback) = on_ok {
                    self.run_callback(id, &call.url, || callback(self, payload));
                }
            }
            Err(error) => {
                debug!(batch = %id, url = %call.url, code = error.code, "request failed");
                if let Some(callback) = on_error {
                    self.run_callback(id, &call.url, || callback(self, error));
                }
            }
        }
    }

    fn run_callback(&self, id: BatchId, url: &str, callback: impl FnOnce()) {
        if let Err(cause) = panic::catch_unwind(AssertUnwindSafe(callback)) {
            let message = cause
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            warn!(batch = %id, url = %url, panic = %message, "request callback panicked");
        }
    }

    /// Run one transport call under the global timeout.
    async fn send(&self, call: CallEnvelope) -> Result<Value, TransportFailure> {
        let transport = Arc::clone(&self.inner.transport);
        let mut task = tokio::spawn(async move { transport.send(&call).await });
        match tokio::time::timeout(self.inner.timeout, &mut task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_join_error)) => Err(TransportFailure::Aborted),
            Err(_elapsed) => {
                task.abort();
                Err(TransportFailure::TimedOut)
            }
        }
    }
}

impl std::fmt::Debug for TransportQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportQueue")
            .field("transport", &self.inner.transport.name())
            .field("timeout", &self.inner.timeout)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockReply, MockTransport};
    use serde_json::json;

    fn queue_with(mock: &MockTransport) -> TransportQueue {
        TransportQueue::new(Arc::new(mock.clone()), Duration::from_secs(5))
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(url: &str, log: &Log) -> Request {
        let ok_log = Arc::clone(log);
        let err_log = Arc::clone(log);
        let ok_url = url.to_string();
        let err_url = url.to_string();
        Request::new(url)
            .on_ok(move |_, _| ok_log.lock().unwrap().push(format!("ok {}", ok_url)))
            .on_error(move |_, e| {
                err_log
                    .lock()
                    .unwrap()
                    .push(format!("err {} {}", err_url, e.code))
            })
    }

    mod enqueue {
        use super::*;

        #[tokio::test]
        async fn assigns_increasing_ids() {
            let mock = MockTransport::new();
            let queue = queue_with(&mock);
            let a = queue.enqueue(Request::new("a")).unwrap();
            let b = queue.enqueue(Request::new("b")).unwrap();
            assert!(b > a);
            queue.wait_idle().await;
        }

        #[tokio::test]
        async fn rejects_batch_without_urls() {
            let mock = MockTransport::new();
            let queue = queue_with(&mock);
            let result = queue.enqueue(vec![Request::new(""), Request::new(" ")]);
            assert!(matches!(result, Err(QueueError::InvalidRequest(_))));
            assert!(queue.is_idle());
        }

        #[tokio::test]
        async fn drops_invalid_members() {
            let mock = MockTransport::new();
            let queue = queue_with(&mock);
            queue
                .enqueue(vec![Request::new("a"), Request::new(""), Request::new("b")])
                .unwrap();
            queue.wait_idle().await;
            assert_eq!(mock.dispatched_urls(), vec!["a", "b"]);
        }

        #[test]
        fn requires_runtime() {
            let mock = MockTransport::new();
            let queue = queue_with(&mock);
            assert_eq!(queue.enqueue(Request::new("a")), Err(QueueError::NoRuntime));
        }
    }

    mod ordering {
        use super::*;

        #[tokio::test]
        async fn batch_members_run_in_order_despite_failure() {
            let mock = MockTransport::new().reply("r1", MockReply::Fail(TransportFailure::HttpStatus(500)));
            let queue = queue_with(&mock);
            let log: Log = Arc::default();
            queue
                .enqueue(vec![
                    recording("r1", &log),
                    recording("r2", &log),
                    recording("r3", &log),
                ])
                .unwrap();
            queue.wait_idle().await;

            assert_eq!(mock.dispatched_urls(), vec!["r1", "r2", "r3"]);
            assert_eq!(
                *log.lock().unwrap(),
                vec!["err r1 500", "ok r2", "ok r3"]
            );
        }

        #[tokio::test]
        async fn later_batch_waits_for_earlier() {
            let mock = MockTransport::new().reply(
                "slow",
                MockReply::Delayed(Duration::from_millis(30), Box::new(MockReply::ok(json!(1)))),
            );
            let queue = queue_with(&mock);
            queue
                .enqueue(vec![Request::new("slow"), Request::new("a2")])
                .unwrap();
            queue.enqueue(Request::new("b1")).unwrap();
            queue.wait_idle().await;
            assert_eq!(mock.dispatched_urls(), vec!["slow", "a2", "b1"]);
        }

        #[tokio::test]
        async fn panicking_callback_does_not_stall_queue() {
            let mock = MockTransport::new().reply("b", MockReply::remote_error(3, "no"));
            let queue = queue_with(&mock);
            let log: Log = Arc::default();
            queue
                .enqueue(Request::new("a").on_ok(|_, _| panic!("boom")))
                .unwrap();
            queue
                .enqueue(
                    Request::new("b").on_error(|_, _| panic!("{}", String::from("bang"))),
                )
                .unwrap();
            queue.enqueue(recording("c", &log)).unwrap();

            tokio::time::timeout(Duration::from_secs(2), queue.wait_idle())
                .await
                .unwrap();
            assert_eq!(mock.dispatched_urls(), vec!["a", "b", "c"]);
            assert_eq!(*log.lock().unwrap(), vec!["ok c"]);
            assert!(queue.is_idle());

            queue.enqueue(Request::new("d")).unwrap();
            queue.wait_idle().await;
            assert_eq!(queue.pending(), 0);
        }

        #[tokio::test]
        async fn callback_can_enqueue() {
            let mock = MockTransport::new();
            let queue = queue_with(&mock);
            queue
                .enqueue(Request::new("first").on_ok(|queue, _| {
                    queue.enqueue(Request::new("second")).unwrap();
                }))
                .unwrap();
            queue.enqueue(Request::new("third")).unwrap();
            queue.wait_idle().await;
            assert_eq!(mock.dispatched_urls(), vec!["first", "third", "second"]);
        }
    }

    mod classification {
        use super::*;

        async fn error_for(reply: MockReply, timeout: Duration) -> ErrorEnvelope {
            let mock = MockTransport::new().reply("x", reply);
            let queue = TransportQueue::new(Arc::new(mock), timeout);
            let slot: Arc<Mutex<Option<ErrorEnvelope>>> = Arc::default();
            let sink = Arc::clone(&slot);
            queue
                .enqueue(Request::new("x").on_error(move |_, e| *sink.lock().unwrap() = Some(e)))
                .unwrap();
            queue.wait_idle().await;
            let error = slot.lock().unwrap().take();
            error.unwrap()
        }

        #[tokio::test]
        async fn timeout() {
            let error = error_for(MockReply::Hang, Duration::from_millis(20)).await;
            assert_eq!(error.code, -2);
        }

        #[tokio::test]
        async fn remote_error_passes_through() {
            let error = error_for(MockReply::remote_error(5, "locked"), Duration::from_secs(5)).await;
            assert_eq!(error, ErrorEnvelope::new(5, "locked"));
        }

        #[tokio::test]
        async fn malformed_envelope() {
            let error = error_for(MockReply::Body(json!({"id": 7})), Duration::from_secs(5)).await;
            assert_eq!(error.code, -4);
        }

        #[tokio::test]
        async fn network() {
            let error = error_for(
                MockReply::Fail(TransportFailure::Network("refused".into())),
                Duration::from_secs(5),
            )
            .await;
            assert_eq!(error.code, -3);
            assert_eq!(error.message, "network error: refused");
        }
    }

    mod inspection {
        use super::*;

        #[tokio::test]
        async fn pending_counts_queued_members() {
            let mock = MockTransport::new().reply(
                "a",
                MockReply::Delayed(Duration::from_millis(30), Box::new(MockReply::ok(json!(null)))),
            );
            let queue = queue_with(&mock);
            queue
                .enqueue(vec![Request::new("a"), Request::new("b"), Request::new("c")])
                .unwrap();
            // Nothing has been shifted until the drain task runs.
            assert_eq!(queue.pending(), 3);
            assert!(!queue.is_idle());
            queue.wait_idle().await;
            assert_eq!(queue.pending(), 0);
            assert!(queue.is_idle());
        }

        #[tokio::test]
        async fn wait_idle_on_fresh_queue_returns() {
            let mock = MockTransport::new();
            queue_with(&mock).wait_idle().await;
        }
    }
}
