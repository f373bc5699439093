//! core
//!
//! Core domain types, metadata documents, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: FieldId, FieldRef, ServiceId
//! - [`metadata`] - Field/service/form documents and the Field Value Store
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid field ids and references at parse time
//! - Metadata is consumed, never produced, by this crate
//! - Everything here is synchronous and free of I/O except config/metadata loading

pub mod config;
pub mod metadata;
pub mod types;
