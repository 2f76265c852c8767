//! Request pipeline: stages, retry policy and the pooled transport.
//!
//! This module provides types and traits for:
//! - Describing HTTP requests and responses ([`HttpRequest`], [`HttpResponse`], [`ResponseBody`])
//! - Abstracting the network client ([`HttpClient`])
//! - Composing stages in front of a client ([`Stage`], [`Next`], [`Pipeline`])
//! - Refusing unsafe destinations ([`UrlSafetyFilter`])
//! - Retrying transient failures ([`RetryStage`], [`RetryPolicy`])
//! - Production transport with connection pooling ([`ReqwestTransport`], [`TransportConfig`])

mod body;
mod client;
mod error;
mod http;
mod retry;
mod stage;
mod url_filter;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use body::{BodyStream, ResponseBody};
pub use client::{ReqwestTransport, TransportConfig};
pub use error::HttpError;
pub use self::http::{
    BLOCKED_HOST_MESSAGE, HttpClient, HttpRequest, HttpResponse, INSECURE_URL_MESSAGE, Rejection,
};
pub use retry::{IsRetryable, RetryPolicy, RetryStage, StatusRetry};
pub use stage::{Next, Pipeline, PipelineBuilder, Stage, StageFuture};
pub use url_filter::UrlSafetyFilter;
