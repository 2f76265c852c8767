//! Configuration layer for http-sender.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! Headers are merged: TOML headers are sent unless a CLI `--header` uses the
//! same name, in which case only the CLI value is sent.
//!
//! Blocked hosts use "replace" semantics: any `--block-host` replaces the
//! `filter.blocked_hosts` list from TOML. `filter.blocked_patterns` is
//! TOML-only and always applied.
//!
//! # Boolean Flag Semantics
//!
//! `--json` uses OR semantics with `request.json`. `--no-log` always wins
//! over `request.log`.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Some options are TOML-only (not available via CLI):
//! - `retry.max_delay`, `retry.multiplier`, `retry.status`
//! - `transport.pooled_connection_lifetime`, `transport.max_connections_per_host`,
//!   `transport.idle_timeout`, `transport.keep_alive_interval`
//!
//! For full configurability, use a config file.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod toml_tests;
#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
