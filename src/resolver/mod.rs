//! resolver
//!
//! Key & Parameter Resolver: turns a service definition plus the current
//! field values into a queued call.
//!
//! # Architecture
//!
//! The [`Resolver`] holds the metadata bundle, the record's
//! [`FieldValueStore`], and a handle to the shared [`TransportQueue`].
//! `execute` builds the call synchronously and returns the batch id; the
//! outcome arrives later on the drain task, which merges returned values
//! into the store and broadcasts a [`Signal`].
//!
//! Resolver failures (`UnknownService`, `KeyUnresolved`,
//! `ParametersRequired`) are returned to the caller and also broadcast as
//! [`Signal::ExecuteNok`]; subscribers are expected to treat them as
//! routine ("no key yet") rather than fatal.
//!
//! # Modules
//!
//! - `key`: Key shapes and candidate resolution
//! - `params`: Allow/exclude parameter filtering
//!
//! # Example
//!
//! ```
//! use formweave::core::metadata::{parse_metadata, FieldValueStore};
//! use formweave::resolver::{Resolver, Signal};
//! use formweave::transport::{MockReply, MockTransport, TransportQueue};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let meta = parse_metadata(r#"{
//!     "services": { "read": { "service": ["users"], "action": "read", "key": "user:id" } }
//! }"#).unwrap();
//! let mock = MockTransport::new().reply("users/read/7", MockReply::ok(json!({"user:name": "ada"})));
//! let queue = TransportQueue::new(Arc::new(mock), Duration::from_secs(5));
//!
//! let resolver = Resolver::new(Arc::new(meta), queue.clone());
//! resolver.set_value("user:id", json!(7)).unwrap();
//! let mut signals = resolver.subscribe();
//!
//! resolver.execute("read").unwrap();
//! queue.wait_idle().await;
//!
//! assert_eq!(signals.recv().await.unwrap(), Signal::ExecuteOk { service: "read".into() });
//! assert_eq!(resolver.value("user:name"), Some(json!("ada")));
//! # });
//! ```

mod key;
mod params;

pub use key::{build_key, can_execute, resolve_shape, ResolvedKey, COMPOSITE_SEPARATOR};
pub use params::{filter_parameters, CallParameters};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::core::metadata::store::FieldValues;
use crate::core::metadata::{FieldValueStore, Metadata, ServiceDef};
use crate::core::types::{FieldId, TypeError};
use crate::registry::{Registry, RegistryError};
use crate::transport::{build_url, BatchId, QueueError, Request, TransportQueue};

/// Registry name under which hosts register the shared [`TransportQueue`].
pub const QUEUE_DEPENDENCY: &str = "transport.queue";

/// Capacity of the signal channel; slow subscribers lag past this.
const SIGNAL_CAPACITY: usize = 64;

/// Errors from resolving and executing a service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No service with this id exists in the metadata.
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// The service requires a key and no candidate shape resolves.
    #[error("service '{0}' has no resolvable key")]
    KeyUnresolved(String),

    /// The service requires parameters and none qualify.
    #[error("service '{0}' requires parameters but none qualify")]
    ParametersRequired(String),

    /// The queue refused the request.
    #[error("failed to queue service '{service}': {source}")]
    Queue { service: String, source: QueueError },
}

/// Outcome notifications broadcast by [`Resolver::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The service call succeeded and its values were merged.
    ExecuteOk { service: String },
    /// The service call failed or could not be issued.
    ///
    /// `code` carries the transport or remote error code; it is `None` when
    /// the call never reached the queue.
    ExecuteNok {
        service: String,
        code: Option<i64>,
        message: String,
    },
}

/// How a successful response is merged into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// `create` / `update`: merged into current values, then promoted to original.
    Save,
    /// `read`: returned values are merged into the current values and
    /// become the sole original values.
    Load,
    /// `delete`: both snapshots are discarded.
    Clear,
    /// Anything else: the store is untouched.
    Other,
}

impl ActionKind {
    /// Classify an action name.
    pub fn classify(action: &str) -> Self {
        match action {
            "create" | "update" => ActionKind::Save,
            "read" => ActionKind::Load,
            "delete" => ActionKind::Clear,
            _ => ActionKind::Other,
        }
    }

    /// Merge a response payload into `store`.
    ///
    /// Object payloads are read as field values; keys that are not valid
    /// field ids are skipped. Non-object payloads merge nothing, except
    /// for `Clear`, which never looks at the payload.
    pub fn apply(self, store: &mut FieldValueStore, payload: &Value) {
        if self == ActionKind::Clear {
            store.clear();
            return;
        }
        let Some(values) = payload_values(payload) else {
            return;
        };
        match self {
            ActionKind::Save => store.save(values),
            ActionKind::Load => store.load(values),
            ActionKind::Clear | ActionKind::Other => {}
        }
    }
}

fn payload_values(payload: &Value) -> Option<FieldValues> {
    let object = payload.as_object()?;
    let mut values = FieldValues::new();
    for (name, value) in object {
        match FieldId::new(name.as_str()) {
            Ok(id) => {
                values.insert(id, value.clone());
            }
            Err(e) => warn!(field = %name, error = %e, "skipping returned value"),
        }
    }
    Some(values)
}

/// Resolves and executes services against one record's values.
#[derive(Clone)]
pub struct Resolver {
    metadata: Arc<Metadata>,
    store: Arc<Mutex<FieldValueStore>>,
    queue: TransportQueue,
    signals: broadcast::Sender<Signal>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("services", &self.metadata.services.len())
            .field("queue", &self.queue)
            .finish()
    }
}

impl Resolver {
    /// Create a resolver with an empty store.
    pub fn new(metadata: Arc<Metadata>, queue: TransportQueue) -> Self {
        Self::with_store(metadata, queue, FieldValueStore::new())
    }

    /// Create a resolver over existing values.
    pub fn with_store(metadata: Arc<Metadata>, queue: TransportQueue, store: FieldValueStore) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            metadata,
            store: Arc::new(Mutex::new(store)),
            queue,
            signals,
        }
    }

    /// Create a resolver whose queue is resolved from `registry` under
    /// [`QUEUE_DEPENDENCY`].
    ///
    /// # Errors
    ///
    /// Returns the registry error if the queue is not registered or is not a
    /// [`TransportQueue`].
    pub fn from_registry(metadata: Arc<Metadata>, registry: &Registry) -> Result<Self, RegistryError> {
        let queue = registry.resolve_as::<TransportQueue>(QUEUE_DEPENDENCY, None)?;
        Ok(Self::new(metadata, (*queue).clone()))
    }

    fn lock(&self) -> MutexGuard<'_, FieldValueStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The metadata bundle.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Subscribe to execute signals.
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.signals.subscribe()
    }

    /// Snapshot of the field value store.
    pub fn store(&self) -> FieldValueStore {
        self.lock().clone()
    }

    /// Set a current value by field id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidFieldId` for a malformed id.
    pub fn set_value(&self, id: &str, value: Value) -> Result<(), TypeError> {
        let id = FieldId::new(id)?;
        self.lock().set(id, value);
        Ok(())
    }

    /// Current value of a field, if present.
    pub fn value(&self, id: &str) -> Option<Value> {
        let id = FieldId::new(id).ok()?;
        self.lock().get(&id).cloned()
    }

    fn service(&self, service_id: &str) -> Result<&ServiceDef, ResolveError> {
        self.metadata
            .service(service_id)
            .ok_or_else(|| ResolveError::UnknownService(service_id.to_string()))
    }

    /// Whether `service_id` exists and can be addressed with the current values.
    pub fn can_execute(&self, service_id: &str) -> bool {
        match self.service(service_id) {
            Ok(service) => can_execute(service, &self.lock()),
            Err(_) => false,
        }
    }

    /// Resolve the key of `service_id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` if the service does not exist.
    pub fn build_key(&self, service_id: &str) -> Result<Option<ResolvedKey>, ResolveError> {
        let service = self.service(service_id)?;
        Ok(build_key(service, &self.lock()))
    }

    /// Resolve the call parameters of `service_id`.
    ///
    /// Returns `None` when no field qualifies and parameters are optional.
    ///
    /// # Errors
    ///
    /// - `UnknownService` if the service does not exist
    /// - `ParametersRequired` if the service requires parameters and none qualify
    pub fn build_parameters(&self, service_id: &str) -> Result<Option<CallParameters>, ResolveError> {
        let service = self.service(service_id)?;
        let params = filter_parameters(&service.parameters, &self.lock());
        if !params.is_empty() {
            return Ok(Some(params));
        }
        if service.parameters.require {
            return Err(ResolveError::ParametersRequired(service_id.to_string()));
        }
        Ok(None)
    }

    /// Build and queue the call for `service_id`.
    ///
    /// On success the returned values are merged according to the action's
    /// [`ActionKind`] and [`Signal::ExecuteOk`] is broadcast; on failure the
    /// store is untouched and [`Signal::ExecuteNok`] carries the error code
    /// and message.
    ///
    /// # Errors
    ///
    /// `UnknownService`, `KeyUnresolved`, `ParametersRequired`, or `Queue`.
    /// Each is also broadcast as `ExecuteNok`. Nothing is queued on error.
    pub fn execute(&self, service_id: &str) -> Result<BatchId, ResolveError> {
        let result = self.issue(service_id);
        if let Err(e) = &result {
            debug!(service = service_id, error = %e, "execute refused");
            self.emit(Signal::ExecuteNok {
                service: service_id.to_string(),
                code: None,
                message: e.to_string(),
            });
        }
        result
    }

    fn issue(&self, service_id: &str) -> Result<BatchId, ResolveError> {
        let service = self.service(service_id)?;

        let key = match &service.key {
            Some(_) => Some(
                build_key(service, &self.lock())
                    .ok_or_else(|| ResolveError::KeyUnresolved(service_id.to_string()))?,
            ),
            None => None,
        };
        let parameters = self.build_parameters(service_id)?;

        let rendered = key.as_ref().map(ResolvedKey::render);
        let url = build_url(&service.path, Some(&service.action), rendered.as_deref());
        let action = ActionKind::classify(&service.action);

        let mut request = Request::new(url);
        if let Some(parameters) = parameters {
            request = request.with_parameters(parameters);
        }

        let ok_ctx = self.clone();
        let ok_id = service_id.to_string();
        let err_ctx = self.clone();
        let err_id = service_id.to_string();
        let request = request
            .on_ok(move |_, payload| {
                action.apply(&mut ok_ctx.lock(), &payload);
                ok_ctx.emit(Signal::ExecuteOk { service: ok_id });
            })
            .on_error(move |_, error| {
                err_ctx.emit(Signal::ExecuteNok {
                    service: err_id,
                    code: Some(error.code),
                    message: error.message,
                });
            });

        self.queue
            .enqueue(request)
            .map_err(|source| ResolveError::Queue {
                service: service_id.to_string(),
                source,
            })
    }

    fn emit(&self, signal: Signal) {
        debug!(signal = ?signal, "resolver signal");
        // No subscribers is not an error.
        let _ = self.signals.send(signal);
    }
}
