//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use http::Method;

use crate::dispatch::{HeaderInput, RequestSpec};
use crate::pipeline::{RetryPolicy, StatusRetry, TransportConfig, UrlSafetyFilter};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// The request to send, bound to the default endpoint
    pub request: RequestSpec,

    /// Connection pool and timeout settings
    pub transport: TransportConfig,

    /// Retry policy for failed attempts
    pub retry_policy: RetryPolicy,

    /// Destinations refused locally
    pub filter: UrlSafetyFilter,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = self
            .request
            .url()
            .map_or_else(|| "none".to_string(), ToString::to_string);

        write!(
            f,
            "Config {{ url: {url}, method: {}, headers: {}, timeout: {:?}, \
             retry: {}x/{:?}, blocked_hosts: {}, log: {} }}",
            self.request.method(),
            self.request.headers().len(),
            self.transport.timeout,
            self.retry_policy.max_retries,
            self.retry_policy.initial_delay,
            self.filter.len(),
            self.request.logging_enabled(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The URL is missing or invalid
    /// - Method, headers or JSON body are invalid
    /// - Duration values are zero
    /// - Retry or blocked-host settings are invalid
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let request = Self::build_request(cli, toml)?;
        let transport = Self::build_transport(cli, toml)?;
        let retry_policy = Self::build_retry_policy(cli, toml)?;
        let filter = Self::build_filter(cli, toml)?;

        Ok(Self {
            request,
            transport,
            retry_policy,
            filter,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn build_request(cli: &Cli, toml: Option<&TomlConfig>) -> Result<RequestSpec, ConfigError> {
        let section = toml.map(|t| &t.request);

        // CLI takes precedence
        let url = cli
            .url
            .as_deref()
            .or_else(|| section.and_then(|r| r.url.as_deref()))
            .ok_or_else(|| {
                ConfigError::missing(field::URL, "Use --url or set request.url in config file")
            })?;

        let method = Self::resolve_method(cli, toml)?;

        // Logging is on unless --no-log or the file turns it off
        let logging = !cli.no_log && section.and_then(|r| r.log).unwrap_or(true);

        let mut request = RequestSpec::new()
            .with_logging(logging)
            .use_method(method)
            .with_uri(url)?;

        let headers = Self::resolve_headers(cli, toml)?;
        if !headers.is_empty() {
            request = request.with_headers(HeaderInput::Flat(headers), false)?;
        }

        let body = cli
            .body
            .as_deref()
            .or_else(|| section.and_then(|r| r.body.as_deref()));
        let json = cli.json || section.is_some_and(|r| r.json);

        match body {
            Some(body) if json => {
                let value: serde_json::Value =
                    serde_json::from_str(body).map_err(ConfigError::InvalidJson)?;
                request = request.with_json(&value)?;
            }
            Some(body) => request = request.with_content(body.to_string()),
            None => {}
        }

        Ok(request)
    }

    fn resolve_method(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Method, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let method_str = cli
            .method
            .as_deref()
            .or_else(|| toml.and_then(|t| t.request.method.as_deref()))
            .unwrap_or(defaults::METHOD);

        method_str
            .to_uppercase()
            .parse::<Method>()
            .map_err(|_| ConfigError::InvalidMethod(method_str.to_string()))
    }

    /// TOML headers first; a CLI header replaces every TOML header of the
    /// same name.
    fn resolve_headers(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<Vec<(String, String)>, ConfigError> {
        let cli_headers = HeaderInput::parse(&cli.headers.join("\n"))?.into_pairs(false)?;

        let mut headers: Vec<(String, String)> = toml
            .map(|t| {
                t.request
                    .headers
                    .iter()
                    .filter(|(name, _)| {
                        !cli_headers
                            .iter()
                            .any(|(cli_name, _)| cli_name.eq_ignore_ascii_case(name))
                    })
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        headers.extend(cli_headers);
        Ok(headers)
    }

    fn build_transport(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<TransportConfig, ConfigError> {
        let transport = toml.map(|t| &t.transport);

        let timeout = cli
            .timeout
            .or_else(|| transport.and_then(|t| t.timeout))
            .unwrap_or(defaults::TIMEOUT_SECS);
        let lifetime = transport
            .and_then(|t| t.pooled_connection_lifetime)
            .unwrap_or(defaults::POOLED_CONNECTION_LIFETIME_SECS);
        let idle_timeout = transport
            .and_then(|t| t.idle_timeout)
            .unwrap_or(defaults::IDLE_TIMEOUT_SECS);
        let keep_alive = transport
            .and_then(|t| t.keep_alive_interval)
            .unwrap_or(defaults::KEEP_ALIVE_INTERVAL_SECS);
        let max_connections = transport
            .and_then(|t| t.max_connections_per_host)
            .unwrap_or(defaults::MAX_CONNECTIONS_PER_HOST);

        if max_connections == 0 {
            return Err(ConfigError::InvalidTransport(
                "max_connections_per_host must be greater than 0".to_string(),
            ));
        }

        Ok(TransportConfig::new()
            .with_timeout(positive_secs("timeout", timeout)?)
            .with_pooled_connection_lifetime(positive_secs(
                "pooled_connection_lifetime",
                lifetime,
            )?)
            .with_idle_timeout(positive_secs("idle_timeout", idle_timeout)?)
            .with_keep_alive_interval(positive_secs("keep_alive_interval", keep_alive)?)
            .with_max_connections_per_host(max_connections))
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default
        let max_retries = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_retries))
            .unwrap_or(defaults::RETRY_MAX_RETRIES);

        let initial_delay_secs = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_SECS);

        let max_delay_secs = retry
            .and_then(|r| r.max_delay)
            .unwrap_or(defaults::RETRY_MAX_DELAY_SECS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        let status = match retry.and_then(|r| r.status.as_deref()) {
            None | Some("any") => StatusRetry::AnyFailure,
            Some("transient") => StatusRetry::TransientOnly,
            Some(other) => {
                return Err(ConfigError::InvalidRetry(format!(
                    "status must be \"any\" or \"transient\", got \"{other}\""
                )));
            }
        };

        if initial_delay_secs == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay must be greater than 0".to_string(),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if max_delay_secs < initial_delay_secs {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay ({max_delay_secs}s) must be >= initial_delay ({initial_delay_secs}s)"
            )));
        }

        Ok(RetryPolicy::new()
            .with_max_retries(max_retries)
            .with_initial_delay(Duration::from_secs(initial_delay_secs))
            .with_max_delay(Duration::from_secs(max_delay_secs))
            .with_multiplier(multiplier)
            .with_status_retry(status))
    }

    fn build_filter(cli: &Cli, toml: Option<&TomlConfig>) -> Result<UrlSafetyFilter, ConfigError> {
        let mut filter = UrlSafetyFilter::new();

        // CLI hosts replace TOML hosts entirely
        let hosts = if cli.block_hosts.is_empty() {
            toml.map(|t| t.filter.blocked_hosts.as_slice()).unwrap_or_default()
        } else {
            cli.block_hosts.as_slice()
        };
        for host in hosts {
            filter = filter.with_blocked_host(host);
        }

        if let Some(toml) = toml {
            for pattern in &toml.filter.blocked_patterns {
                filter = filter.with_blocked_pattern(pattern).map_err(|e| {
                    ConfigError::InvalidRegex {
                        pattern: pattern.clone(),
                        source: e,
                    }
                })?;
            }
        }

        Ok(filter)
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn positive_secs(field: &'static str, seconds: u64) -> Result<Duration, ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::InvalidDuration {
            field,
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(Duration::from_secs(seconds))
}
