//! transport::http
//!
//! HTTP transport over `reqwest`.
//!
//! Each call is a JSON `POST` of the parameter map (an empty object when the
//! call has none) to `<base_url>/<url>`. The reply body is returned raw;
//! envelope validation happens in the queue.
//!
//! Classification:
//!
//! | Outcome                       | Failure            |
//! |-------------------------------|--------------------|
//! | non-2xx status                | `HttpStatus(s)`    |
//! | client-side timeout           | `TimedOut`         |
//! | connect/IO failure            | `Network`          |
//! | 2xx with a non-JSON body      | `InvalidResponse`  |

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use super::traits::{CallEnvelope, Transport, TransportFailure};

/// Transport posting JSON to a fixed base URL.
pub struct HttpTransport {
    /// HTTP client for making requests
    client: Client,
    /// Base URL that call URLs are joined onto
    base_url: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a transport with a preconfigured client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// The base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full endpoint for a call URL.
    pub fn endpoint(&self, url: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

fn classify(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::TimedOut
    } else if let Some(status) = err.status() {
        TransportFailure::HttpStatus(status.as_u16())
    } else {
        TransportFailure::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, call: &CallEnvelope) -> Result<Value, TransportFailure> {
        let empty = Map::new();
        let body = call.parameters.as_ref().unwrap_or(&empty);

        let response = self
            .client
            .post(self.endpoint(&call.url))
            .json(body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::HttpStatus(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportFailure::InvalidResponse(format!("failed to parse body: {}", e)))
    }
}
