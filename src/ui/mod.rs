//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All terminal output of the binary goes through this module so quiet and
//! debug modes behave the same in every command. Library code logs through
//! `tracing` instead.

pub mod output;
