//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--project <dir>`: Also load `<dir>/.formweave/config.toml`

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Formweave - declarative forms, service calls, and layouts from metadata
#[derive(Parser, Debug)]
#[command(name = "formweave")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project directory whose .formweave/config.toml overrides the global config
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose a form from metadata and print its arranged widget tree
    #[command(after_help = "\
EXAMPLES:
    # Print every form in the bundle
    formweave inspect app.json

    # Print a single form as JSON
    formweave inspect app.json --form login --json")]
    Inspect {
        /// Metadata bundle (JSON)
        metadata: PathBuf,

        /// Only this form
        #[arg(long, value_name = "ID")]
        form: Option<String>,

        /// Emit the arranged container as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute a service through the HTTP transport and print the values
    #[command(after_help = "\
EXAMPLES:
    # Read a record by key
    formweave call app.json read --set user:id=7

    # Override the configured endpoint
    formweave call app.json save --set user:id=7 --set user:name=ada \\
        --base-url http://localhost:8080/rpc")]
    Call {
        /// Metadata bundle (JSON)
        metadata: PathBuf,

        /// Service id
        service: String,

        /// Field value as FIELD=VALUE; VALUE is parsed as JSON, else taken as a string
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        values: Vec<String>,

        /// Base URL, overriding [transport] base_url
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Print the effective configuration and where it was loaded from
    Config,
}
