//! Error types for building and dispatching requests.

use thiserror::Error;

use crate::pipeline::HttpError;

/// Errors raised while configuring a [`RequestSpec`](super::RequestSpec).
///
/// These are programming errors on the caller's side: they are reported
/// immediately by the configuration call and never reach the network.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No headers were supplied to `with_headers`.
    #[error("Headers argument is missing")]
    MissingHeaders,

    /// Structured headers did not serialize to a name/value object.
    #[error("Headers must be an object of name/value pairs, got {kind}")]
    UnsupportedHeaders {
        /// JSON kind the value serialized to.
        kind: &'static str,
    },

    /// A header line was neither `Key=Value` nor `Key: Value`.
    #[error("Invalid header line '{line}': expected 'Key=Value' or 'Key: Value'")]
    InvalidHeaderLine {
        /// The offending line.
        line: String,
    },

    /// Header name is not a valid HTTP token.
    #[error("Invalid header name '{name}': {reason}")]
    InvalidHeaderName {
        /// The header name that failed to parse.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// Header value contains characters HTTP does not allow.
    #[error("Invalid value for header '{name}': {reason}")]
    InvalidHeaderValue {
        /// The header whose value failed to parse.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// The target URI could not be parsed.
    #[error("Invalid URI '{uri}': {source}")]
    InvalidUri {
        /// The URI as given.
        uri: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// A value could not be serialized to JSON.
    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        /// What was being serialized (headers or body).
        what: &'static str,
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// Why a dispatched request produced no response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The pipeline failed (network, timeout, invalid request).
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The caller's cancellation signal fired first.
    #[error("Request was cancelled")]
    Cancelled,
}
