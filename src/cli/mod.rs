//! cli
//!
//! Command-line interface layer for Formweave.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers load metadata and configuration, wire
//! the registry, transport queue, and resolver together, and format the
//! results with [`crate::ui::output`].

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "FORMWEAVE_LOG";

/// Execution context shared by command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Project directory for project-scoped config
    pub project: Option<PathBuf>,
    /// Debug output requested
    pub debug: bool,
    /// Quiet output requested
    pub quiet: bool,
}

impl Context {
    /// Output verbosity implied by the flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Load the merged configuration.
    pub fn config(&self) -> Result<Config> {
        Ok(Config::load(self.project.as_deref())
            .context("Failed to load config")?
            .config)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        project: cli.project.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    // Config errors are reported by the command that needs the config.
    let configured_level = ctx
        .config()
        .ok()
        .and_then(|config| config.log_level().map(str::to_string));
    init_tracing(&ctx, configured_level.as_deref());

    commands::dispatch(cli.command, &ctx)
}

/// Filter directive chosen from the flags and configured level.
///
/// `FORMWEAVE_LOG` is consulted separately and wins over this.
pub fn default_directive(ctx: &Context, configured_level: Option<&str>) -> String {
    if ctx.debug {
        "formweave=debug".to_string()
    } else if ctx.quiet {
        "warn".to_string()
    } else {
        configured_level.unwrap_or("info").to_string()
    }
}

fn init_tracing(ctx: &Context, configured_level: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(ctx, configured_level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
