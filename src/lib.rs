//! Formweave - a declarative composition engine
//!
//! Formweave takes a metadata bundle (fields, services, forms) and turns it
//! into live behavior: service calls keyed off the current record, an
//! ordered transport queue that delivers them, and widget trees arranged by
//! pluggable layout allocators.
//!
//! # Architecture
//!
//! The codebase is layered; lower layers never reach up:
//!
//! - [`core`] - Strong types, the metadata schema, the field value store, configuration
//! - [`registry`] - Dependency Registry: named definitions resolved to instances
//! - [`transport`] - Requests, batches, the `Transport` trait, and the ordered queue
//! - [`resolver`] - Key and parameter resolution, `execute`, outcome signals
//! - [`layout`] - Container model and the stacked, grid, and tabs allocators
//! - [`widget`] - Entities, widgets, and the composition factory
//! - [`ui`] - Text output helpers
//! - [`cli`] - Command-line interface for the `formweave` binary
//!
//! # Invariants
//!
//! 1. The queue dispatches at most one request at a time, in enqueue order
//! 2. A request's callback runs before the next request is dispatched
//! 3. Every failure reaches `on_error` as an `{code, message}` envelope
//! 4. Allocators are deterministic: the same children give the same layout

pub mod cli;
pub mod core;
pub mod layout;
pub mod registry;
pub mod resolver;
pub mod transport;
pub mod ui;
pub mod widget;
