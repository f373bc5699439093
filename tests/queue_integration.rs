//! Integration tests for the transport queue and resolver.
//!
//! These tests wire the pieces the way a host does: a registry holding the
//! shared queue, a resolver resolved from it, and a scripted mock transport
//! standing in for the network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use formweave::core::metadata::{parse_metadata, Metadata};
use formweave::core::types::FieldId;
use formweave::registry::{Definition, Registry};
use formweave::resolver::{ResolveError, Resolver, Signal, QUEUE_DEPENDENCY};
use formweave::transport::{
    build_request, build_url, ErrorEnvelope, MockReply, MockTransport, TransportFailure, TransportQueue,
};

// =============================================================================
// Test Fixtures
// =============================================================================

const BUNDLE: &str = r#"{
    "fields": {
        "id": { "type": "integer", "key": true },
        "user:id": { "type": "integer", "key": true },
        "user:name": { "type": "string", "label": "Name" }
    },
    "services": {
        "read": { "service": ["users"], "action": "read", "key": "id" },
        "fetch": { "service": ["users"], "action": "read", "key": "user:id" },
        "save": {
            "service": "users",
            "action": "update",
            "key": "user:id",
            "parameters": { "require": true, "allow": "user:*" }
        }
    }
}"#;

struct Host {
    mock: MockTransport,
    queue: TransportQueue,
    resolver: Resolver,
}

impl Host {
    fn new(mock: MockTransport) -> Self {
        let queue = TransportQueue::new(Arc::new(mock.clone()), Duration::from_secs(2));
        let registry = Registry::new();
        registry
            .register(QUEUE_DEPENDENCY, Definition::fixed(queue.clone()))
            .unwrap();
        let metadata: Metadata = parse_metadata(BUNDLE).unwrap();
        let resolver = Resolver::from_registry(Arc::new(metadata), &registry).unwrap();
        Self {
            mock,
            queue,
            resolver,
        }
    }
}

fn fid(id: &str) -> FieldId {
    FieldId::new(id).unwrap()
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn dependent_batch_dispatches_in_order_even_after_failure() {
    let mock = MockTransport::new()
        .reply("users/read/1", MockReply::Fail(TransportFailure::HttpStatus(503)))
        .reply("users/read/2", MockReply::ok(json!({"n": 2})))
        .reply("users/read/3", MockReply::remote_error(9, "gone"));
    let queue = TransportQueue::new(Arc::new(mock.clone()), Duration::from_secs(2));
    let outcomes: Arc<Mutex<Vec<String>>> = Arc::default();

    let batch: Vec<_> = ["1", "2", "3"]
        .into_iter()
        .map(|key| {
            let ok_log = outcomes.clone();
            let err_log = outcomes.clone();
            let url = build_url(&["users"], Some("read"), Some(key));
            build_request(
                url,
                None,
                Some(Box::new(move |_: &TransportQueue, payload: Value| {
                    ok_log.lock().unwrap().push(format!("ok {}", payload))
                })),
                Some(Box::new(move |_: &TransportQueue, error: ErrorEnvelope| {
                    err_log.lock().unwrap().push(format!("err {}", error.code))
                })),
            )
        })
        .collect();

    queue.enqueue(batch).unwrap();
    queue.wait_idle().await;

    assert_eq!(
        mock.dispatched_urls(),
        vec!["users/read/1", "users/read/2", "users/read/3"]
    );
    assert_eq!(
        *outcomes.lock().unwrap(),
        vec!["err 503", "ok {\"n\":2}", "err 9"]
    );
}

#[tokio::test]
async fn executes_share_one_queue() {
    let host = Host::new(MockTransport::new());
    host.resolver.set_value("id", json!(1)).unwrap();
    host.resolver.execute("read").unwrap();
    host.resolver.set_value("id", json!(2)).unwrap();
    host.resolver.execute("read").unwrap();
    host.queue.wait_idle().await;

    assert_eq!(
        host.mock.dispatched_urls(),
        vec!["users/read/1", "users/read/2"]
    );
}

// =============================================================================
// Envelope scenario
// =============================================================================

#[tokio::test]
async fn successful_read_merges_into_originals() {
    let mock = MockTransport::new().reply(
        "users/read/7",
        MockReply::Body(json!({
            "version": {"major": 1, "minor": 0, "build": 0},
            "error": {"code": 0},
            "return": {"id": 7}
        })),
    );
    let host = Host::new(mock);
    host.resolver.set_value("id", json!(7)).unwrap();
    let mut signals = host.resolver.subscribe();

    host.resolver.execute("read").unwrap();
    host.queue.wait_idle().await;

    assert_eq!(
        signals.recv().await.unwrap(),
        Signal::ExecuteOk {
            service: "read".into()
        }
    );
    let store = host.resolver.store();
    assert_eq!(store.original(&fid("id")), Some(&json!(7)));
    assert!(!store.is_modified(&fid("id")));
}

#[tokio::test]
async fn read_keeps_key_the_reply_omits() {
    let mock = MockTransport::new().reply("users/read/7", MockReply::ok(json!({"user:name": "ada"})));
    let host = Host::new(mock);
    host.resolver.set_value("user:id", json!(7)).unwrap();

    host.resolver.execute("fetch").unwrap();
    host.queue.wait_idle().await;

    let store = host.resolver.store();
    assert_eq!(store.get(&fid("user:id")), Some(&json!(7)));
    assert_eq!(store.original(&fid("user:name")), Some(&json!("ada")));
    assert!(host.resolver.can_execute("save"));

    host.resolver.execute("save").unwrap();
    host.queue.wait_idle().await;
    assert_eq!(
        host.mock.dispatched_urls(),
        vec!["users/read/7", "users/update/7"]
    );
}

#[tokio::test]
async fn remote_error_leaves_values_untouched() {
    let mock = MockTransport::new().reply("users/read/7", MockReply::remote_error(5, "denied"));
    let host = Host::new(mock);
    host.resolver.set_value("id", json!(7)).unwrap();
    let before = host.resolver.store();
    let mut signals = host.resolver.subscribe();

    host.resolver.execute("read").unwrap();
    host.queue.wait_idle().await;

    assert_eq!(
        signals.recv().await.unwrap(),
        Signal::ExecuteNok {
            service: "read".into(),
            code: Some(5),
            message: "denied".into(),
        }
    );
    assert_eq!(host.resolver.store(), before);
}

#[tokio::test]
async fn save_sends_only_allowed_parameters() {
    let host = Host::new(MockTransport::new());
    host.resolver.set_value("user:id", json!(3)).unwrap();
    host.resolver.set_value("user:name", json!("ada")).unwrap();
    host.resolver.set_value("id", json!(99)).unwrap();

    host.resolver.execute("save").unwrap();
    host.queue.wait_idle().await;

    let calls = host.mock.dispatched();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, "users/update/3");
    assert_eq!(
        Value::Object(calls[0].parameters.clone().unwrap()),
        json!({"user:id": 3, "user:name": "ada"})
    );
}

// =============================================================================
// Resolver refusals
// =============================================================================

#[tokio::test]
async fn unknown_service_enqueues_nothing() {
    let host = Host::new(MockTransport::new());
    let mut signals = host.resolver.subscribe();

    assert_eq!(
        host.resolver.execute("no-such-service"),
        Err(ResolveError::UnknownService("no-such-service".into()))
    );
    host.queue.wait_idle().await;

    assert!(host.mock.dispatched().is_empty());
    assert_eq!(host.queue.pending(), 0);
    assert!(matches!(
        signals.recv().await.unwrap(),
        Signal::ExecuteNok { code: None, .. }
    ));
}

#[tokio::test]
async fn missing_key_is_routine() {
    let host = Host::new(MockTransport::new());
    assert!(!host.resolver.can_execute("read"));
    assert!(matches!(
        host.resolver.execute("read"),
        Err(ResolveError::KeyUnresolved(_))
    ));
    assert!(host.mock.dispatched().is_empty());
}
