//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use crate::pipeline::{RetryPolicy, TransportConfig};

/// Default HTTP method.
pub const METHOD: &str = "GET";

/// Default per-attempt timeout in seconds.
pub const TIMEOUT_SECS: u64 = TransportConfig::DEFAULT_TIMEOUT.as_secs();

/// Default pool lifetime in seconds.
pub const POOLED_CONNECTION_LIFETIME_SECS: u64 =
    TransportConfig::DEFAULT_POOLED_CONNECTION_LIFETIME.as_secs();

/// Default connection cap per host.
pub const MAX_CONNECTIONS_PER_HOST: usize = TransportConfig::DEFAULT_MAX_CONNECTIONS_PER_HOST;

/// Default idle timeout in seconds.
pub const IDLE_TIMEOUT_SECS: u64 = TransportConfig::DEFAULT_IDLE_TIMEOUT.as_secs();

/// Default keep-alive ping interval in seconds.
pub const KEEP_ALIVE_INTERVAL_SECS: u64 = TransportConfig::DEFAULT_KEEP_ALIVE_INTERVAL.as_secs();

/// Default number of retries after the first attempt.
pub const RETRY_MAX_RETRIES: u32 = RetryPolicy::DEFAULT_MAX_RETRIES;

/// Default initial retry delay in seconds.
pub const RETRY_INITIAL_DELAY_SECS: u64 = RetryPolicy::DEFAULT_INITIAL_DELAY.as_secs();

/// Default maximum retry delay in seconds.
pub const RETRY_MAX_DELAY_SECS: u64 = RetryPolicy::DEFAULT_MAX_DELAY.as_secs();

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = RetryPolicy::DEFAULT_MULTIPLIER;
