//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the metadata bundle and configuration it needs
//! 2. Drives the library (factory, resolver, queue)
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `call` performs network I/O through the transport queue. It builds a
//! current-thread tokio runtime and blocks on the drain inside it.

mod call;
mod config_cmd;
mod inspect;

pub use call::{call, parse_assignment};
pub use config_cmd::config;
pub use inspect::inspect;

use super::args::Command;
use super::Context;
use anyhow::Result;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Inspect {
            metadata,
            form,
            json,
        } => inspect::inspect(ctx, &metadata, form.as_deref(), json),
        Command::Call {
            metadata,
            service,
            values,
            base_url,
        } => call::call(ctx, &metadata, &service, &values, base_url.as_deref()),
        Command::Config => config_cmd::config(ctx),
    }
}
