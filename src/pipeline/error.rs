//! Error types for pipeline operations.

use thiserror::Error;

/// Error type for HTTP operations inside the pipeline.
///
/// Describes what went wrong without dictating recovery strategy.
/// The retry stage decides which variants are worth another attempt.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// resets, and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the configured timeout period.
    #[error("Request timed out")]
    Timeout,

    /// The provided URL is invalid or missing.
    ///
    /// This typically indicates a configuration error rather than
    /// a transient failure.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Reading the response body failed.
    #[error("Failed to read response body: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The underlying client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl HttpError {
    /// Wraps any error as a connection failure.
    pub fn connection(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection(Box::new(error))
    }

    /// Wraps any error as a body read failure.
    pub fn body(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Body(Box::new(error))
    }
}
