//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Request configuration section
    #[serde(default)]
    pub request: RequestSection,

    /// Connection pool configuration
    #[serde(default)]
    pub transport: TransportSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,

    /// URL safety filter configuration
    #[serde(default)]
    pub filter: FilterSection,
}

/// Request configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestSection {
    /// Target URL
    pub url: Option<String>,

    /// HTTP method (default: GET)
    pub method: Option<String>,

    /// HTTP headers as key-value pairs
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body
    pub body: Option<String>,

    /// Treat the body as JSON
    #[serde(default)]
    pub json: bool,

    /// Log the request and result (default: true)
    pub log: Option<bool>,
}

/// Connection pool configuration section. Durations are in seconds.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSection {
    /// Per-attempt timeout
    pub timeout: Option<u64>,

    /// Age after which the connection pool is replaced
    pub pooled_connection_lifetime: Option<u64>,

    /// Concurrent requests allowed per host
    pub max_connections_per_host: Option<usize>,

    /// Idle connection timeout
    pub idle_timeout: Option<u64>,

    /// Keep-alive ping interval
    pub keep_alive_interval: Option<u64>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of retries after the first attempt
    pub max_retries: Option<u32>,

    /// Initial retry delay in seconds
    pub initial_delay: Option<u64>,

    /// Maximum retry delay in seconds
    pub max_delay: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,

    /// Which statuses are retried: "any" (every non-2xx) or "transient"
    pub status: Option<String>,
}

/// URL safety filter configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    /// Hosts refused locally (exact, case-insensitive)
    #[serde(default)]
    pub blocked_hosts: Vec<String>,

    /// Regex patterns for hosts refused locally
    #[serde(default)]
    pub blocked_patterns: Vec<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# http-sender configuration file

[request]
# Target URL (required, can be overridden by --url)
# url = "https://api.example.com/items"

# HTTP method (default: GET)
# method = "GET"

# Request body, sent as-is unless json = true
# body = '{"name": "demo"}'
# json = true

# Log the request and result (default: true)
# log = true

# HTTP headers
# [request.headers]
# X-Custom-Header = "value"

[transport]
# Per-attempt timeout in seconds (default: 2)
# timeout = 2

# Replace the connection pool after this many seconds (default: 120)
# pooled_connection_lifetime = 120

# Concurrent requests per host (default: 400)
# max_connections_per_host = 400

# Close idle connections after this many seconds (default: 60)
# idle_timeout = 60

# Keep-alive ping interval in seconds (default: 30)
# keep_alive_interval = 30

[retry]
# Retries after the first attempt (default: 3)
# max_retries = 3

# Initial retry delay in seconds, doubled on every retry (default: 2)
# initial_delay = 2

# Maximum retry delay in seconds (default: 60)
# max_delay = 60

# Backoff multiplier (default: 2.0)
# multiplier = 2.0

# Which statuses are retried: "any" non-2xx or only "transient" (5xx, 408, 429)
# status = "any"

[filter]
# Hosts refused without contacting the network
# Note: --block-host REPLACES this list entirely (not merged)
# blocked_hosts = ["abc"]

# Regex patterns for refused hosts
# blocked_patterns = ['(^|\.)internal\.example$']
"#
    .to_string()
}
