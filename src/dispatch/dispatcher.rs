//! Sends request specifications through a pipeline.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::{DispatchError, DispatchResult, Outcome, RequestSpec};
use crate::pipeline::Pipeline;

/// Turns a [`RequestSpec`] into a [`DispatchResult`].
///
/// Holds the default endpoint used by specifications that did not pick one
/// with [`RequestSpec::use_client`]. Cloning is cheap; clones share the
/// endpoint and its connection pool.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use http_sender::dispatch::{Dispatcher, RequestSpec};
/// use http_sender::pipeline::{Pipeline, RetryPolicy, TransportConfig, UrlSafetyFilter};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Pipeline::standard(
///     UrlSafetyFilter::new(),
///     RetryPolicy::default(),
///     TransportConfig::default(),
/// )?;
/// let dispatcher = Dispatcher::new(Arc::new(pipeline));
///
/// let result = dispatcher
///     .send(RequestSpec::new().with_uri("https://example.com/")?)
///     .await;
/// println!("{:?} in {:?}", result.status(), result.duration());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    default_endpoint: Arc<Pipeline>,
}

impl Dispatcher {
    /// Creates a dispatcher whose specifications default to `endpoint`.
    #[must_use]
    pub const fn new(default_endpoint: Arc<Pipeline>) -> Self {
        Self { default_endpoint }
    }

    /// Pipeline used by specifications without their own endpoint.
    #[must_use]
    pub const fn default_endpoint(&self) -> &Arc<Pipeline> {
        &self.default_endpoint
    }

    /// Sends `spec` and waits for the outcome.
    ///
    /// Never fails: errors are reported inside the returned result.
    pub async fn send(&self, spec: RequestSpec) -> DispatchResult {
        self.send_with_cancel(spec, pending::<()>()).await
    }

    /// Sends `spec`, giving up as soon as `cancel` completes.
    ///
    /// Cancellation drops the in-flight attempt or pending backoff and yields
    /// a failed result with [`DispatchError::Cancelled`].
    pub async fn send_with_cancel<F>(&self, spec: RequestSpec, cancel: F) -> DispatchResult
    where
        F: Future<Output = ()>,
    {
        let (endpoint, logging, snapshot) = spec.into_parts();
        let endpoint = endpoint.unwrap_or_else(|| Arc::clone(&self.default_endpoint));

        let request = match snapshot.to_request() {
            Ok(request) => request,
            Err(error) => {
                if logging {
                    tracing::warn!("Request not sent: {error}");
                }
                return DispatchResult::failed(Duration::ZERO, error.into(), snapshot);
            }
        };

        if logging {
            tracing::info!("Sending request\n{request}");
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            biased;
            () = cancel => Err(DispatchError::Cancelled),
            result = endpoint.execute(request) => result.map_err(DispatchError::from),
        };
        let duration = start.elapsed();

        let result = match outcome {
            Ok(response) => DispatchResult::completed(duration, response),
            Err(error) => DispatchResult::failed(duration, error, snapshot),
        };

        if logging {
            match result.outcome() {
                Outcome::Completed(_) => tracing::info!("{result}"),
                Outcome::Failed(_) => tracing::warn!("{result}"),
            }
        }

        result
    }
}
