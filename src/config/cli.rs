//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// http-sender: resilient one-shot HTTP client
///
/// Sends one request through the URL safety filter, the retry stage and a
/// pooled transport, then prints the result.
#[derive(Debug, Parser)]
#[command(name = "http-sender")]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally boolean
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Target URL (required unless set in the config file)
    #[arg(long)]
    pub url: Option<String>,

    /// HTTP method
    #[arg(long, short = 'X')]
    pub method: Option<String>,

    /// HTTP headers in 'Key=Value' or 'Key: Value' format (can be specified multiple times)
    #[arg(long = "header", short = 'H', value_name = "K=V")]
    pub headers: Vec<String>,

    /// Request body
    #[arg(long, short)]
    pub body: Option<String>,

    /// Treat the body as JSON (validated, sent with Content-Type: application/json)
    #[arg(long)]
    pub json: bool,

    /// Do not log the request and result
    #[arg(long = "no-log")]
    pub no_log: bool,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum number of retries after the first attempt
    #[arg(long = "retry-max")]
    pub retry_max: Option<u32>,

    /// Initial retry delay in seconds
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<u64>,

    /// Host to refuse locally (can be specified multiple times)
    #[arg(long = "block-host", value_name = "HOST")]
    pub block_hosts: Vec<String>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for http-sender
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "http-sender.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
