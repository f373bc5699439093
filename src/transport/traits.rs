//! transport::traits
//!
//! Transport trait, failure classification, and the response envelope.
//!
//! # Design
//!
//! A [`Transport`] moves one [`CallEnvelope`] to the far side and returns
//! the raw reply body. It knows nothing about the envelope format; the
//! queue normalizes every outcome into either the envelope's `return`
//! payload or a uniform [`ErrorEnvelope`].
//!
//! # Envelope
//!
//! ```json
//! { "version": { "major": 1, "minor": 0, "build": 0 },
//!   "error":   { "code": 0, "message": "" },
//!   "return":  { "id": 7 } }
//! ```
//!
//! `error.code == 0` is success. Any other code is a remote failure and is
//! passed through unchanged. A reply without the envelope is
//! [`TransportFailure::InvalidResponse`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Classified transport failures.
///
/// These never propagate as errors to the enqueuer; the queue maps them to
/// an [`ErrorEnvelope`] and hands that to the request's error callback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFailure {
    /// The dispatch was torn down before it produced a reply.
    #[error("request aborted")]
    Aborted,

    /// The global timeout elapsed.
    #[error("request timed out")]
    TimedOut,

    /// The far side answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The reply lacked the expected success/error envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportFailure {
    /// Code reported in the error envelope.
    ///
    /// Local failures use negative codes so they never collide with remote
    /// error codes; HTTP failures report the status itself.
    pub fn code(&self) -> i64 {
        match self {
            TransportFailure::Aborted => -1,
            TransportFailure::TimedOut => -2,
            TransportFailure::Network(_) => -3,
            TransportFailure::InvalidResponse(_) => -4,
            TransportFailure::HttpStatus(status) => i64::from(*status),
        }
    }
}

/// Uniform `{code, message}` error shape delivered to error callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error code (remote code, HTTP status, or a negative local code)
    pub code: i64,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl ErrorEnvelope {
    /// Create an error envelope.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The `{error: {code, message}}` value.
    pub fn to_value(&self) -> Value {
        json!({ "error": { "code": self.code, "message": self.message } })
    }
}

impl std::fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error {}: {}", self.code, self.message)
    }
}

impl From<TransportFailure> for ErrorEnvelope {
    fn from(failure: TransportFailure) -> Self {
        ErrorEnvelope::new(failure.code(), failure.to_string())
    }
}

/// Protocol version carried in every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

/// The reply envelope expected from the far side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Protocol version
    pub version: Version,
    /// Status; `code == 0` is success
    pub error: ErrorEnvelope,
    /// Payload on success
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Current protocol version stamped on envelopes built locally.
pub const PROTOCOL_VERSION: Version = Version {
    major: 1,
    minor: 0,
    build: 0,
};

/// Build a success envelope around `payload`.
///
/// # Example
///
/// ```
/// use formweave::transport::{normalize_response, success_envelope};
/// use serde_json::json;
///
/// let body = success_envelope(json!({"id": 7}));
/// assert_eq!(normalize_response(body), Ok(json!({"id": 7})));
/// ```
pub fn success_envelope(payload: Value) -> Value {
    json!({
        "version": PROTOCOL_VERSION,
        "error": { "code": 0, "message": "" },
        "return": payload,
    })
}

/// Build a remote error envelope.
pub fn error_envelope(code: i64, message: &str) -> Value {
    json!({
        "version": PROTOCOL_VERSION,
        "error": { "code": code, "message": message },
    })
}

/// Validate a raw reply body against the envelope shape.
///
/// # Errors
///
/// Returns [`TransportFailure::InvalidResponse`] when the body is not an
/// object carrying `version` and `error`.
pub fn parse_envelope(body: Value) -> Result<ResponseEnvelope, TransportFailure> {
    serde_json::from_value(body).map_err(|e| TransportFailure::InvalidResponse(e.to_string()))
}

/// Normalize a raw reply body into its payload or an error envelope.
///
/// A missing `return` on success yields `null`.
pub fn normalize_response(body: Value) -> Result<Value, ErrorEnvelope> {
    let envelope = parse_envelope(body)?;
    if envelope.error.code == 0 {
        Ok(envelope.payload.unwrap_or(Value::Null))
    } else {
        Err(envelope.error)
    }
}

/// What a transport sends: the joined URL and the parameter map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallEnvelope {
    /// Service URL relative to the transport's base
    pub url: String,
    /// Call parameters, if any
    pub parameters: Option<Map<String, Value>>,
}

/// A single-request transport.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so the queue can hold them behind
/// an `Arc` and dispatch from a spawned task.
///
/// # Error Handling
///
/// Return the raw body on any reply the far side produced. Classify
/// everything else into a [`TransportFailure`]; envelope validation is the
/// queue's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get the transport name (e.g. "http", "mock").
    fn name(&self) -> &'static str;

    /// Send one call and return the raw reply body.
    async fn send(&self, call: &CallEnvelope) -> Result<Value, TransportFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod failure {
        use super::*;

        #[test]
        fn codes() {
            assert_eq!(TransportFailure::Aborted.code(), -1);
            assert_eq!(TransportFailure::TimedOut.code(), -2);
            assert_eq!(TransportFailure::Network("x".into()).code(), -3);
            assert_eq!(TransportFailure::InvalidResponse("x".into()).code(), -4);
            assert_eq!(TransportFailure::HttpStatus(503).code(), 503);
        }

        #[test]
        fn display() {
            assert_eq!(TransportFailure::Aborted.to_string(), "request aborted");
            assert_eq!(TransportFailure::TimedOut.to_string(), "request timed out");
            assert_eq!(TransportFailure::HttpStatus(404).to_string(), "HTTP status 404");
            assert_eq!(
                TransportFailure::Network("connection refused".into()).to_string(),
                "network error: connection refused"
            );
        }

        #[test]
        fn into_envelope() {
            let envelope = ErrorEnvelope::from(TransportFailure::HttpStatus(502));
            assert_eq!(envelope, ErrorEnvelope::new(502, "HTTP status 502"));
            assert_eq!(
                envelope.to_value(),
                json!({"error": {"code": 502, "message": "HTTP status 502"}})
            );
        }
    }

    mod normalize {
        use super::*;

        #[test]
        fn success_with_payload() {
            let body = json!({
                "version": {"major": 1, "minor": 0, "build": 0},
                "error": {"code": 0},
                "return": {"id": 7}
            });
            assert_eq!(normalize_response(body), Ok(json!({"id": 7})));
        }

        #[test]
        fn success_without_payload() {
            let body = json!({
                "version": {"major": 1, "minor": 2, "build": 3},
                "error": {"code": 0, "message": "ok"}
            });
            assert_eq!(normalize_response(body), Ok(Value::Null));
        }

        #[test]
        fn remote_error_passes_through() {
            let body = error_envelope(5, "record locked");
            assert_eq!(
                normalize_response(body),
                Err(ErrorEnvelope::new(5, "record locked"))
            );
        }

        #[test]
        fn missing_envelope_is_invalid() {
            let result = normalize_response(json!({"id": 7}));
            let err = result.unwrap_err();
            assert_eq!(err.code, TransportFailure::InvalidResponse(String::new()).code());
        }

        #[test]
        fn non_object_is_invalid() {
            let err = normalize_response(json!("hello")).unwrap_err();
            assert_eq!(err.code, -4);
        }

        #[test]
        fn parse_keeps_version() {
            let body = json!({
                "version": {"major": 2, "minor": 1, "build": 9},
                "error": {"code": 0, "message": ""}
            });
            let envelope = parse_envelope(body).unwrap();
            assert_eq!(
                envelope.version,
                Version {
                    major: 2,
                    minor: 1,
                    build: 9
                }
            );
            assert!(envelope.payload.is_none());
        }

        #[test]
        fn missing_version_is_invalid() {
            let err = normalize_response(json!({"error": {"code": 0}})).unwrap_err();
            assert_eq!(err.code, -4);
        }
    }
}
