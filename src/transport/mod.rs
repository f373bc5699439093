//! transport
//!
//! Serialized request execution.
//!
//! # Architecture
//!
//! Callers build [`Request`]s (usually through the resolver) and hand them to
//! the [`TransportQueue`]. The queue owns ordering and failure
//! classification; a [`Transport`] only moves bytes.
//!
//! # Modules
//!
//! - `request`: Request and batch types, URL construction
//! - `traits`: Core `Transport` trait, failures, and the response envelope
//! - `queue`: The serialized FIFO
//! - [`http`]: HTTP implementation using `reqwest`
//! - [`mock`]: Mock implementation for deterministic testing

pub mod http;
pub mod mock;
mod queue;
mod request;
mod traits;

pub use http::HttpTransport;
pub use mock::{MockReply, MockTransport};
pub use queue::{QueueError, TransportQueue};
pub use request::{
    build_request, build_url, Batch, BatchId, ErrorCallback, OkCallback, Request,
};
pub use traits::*;
