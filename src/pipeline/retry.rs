//! Retry policy and the retry stage.

use std::time::Duration;

use crate::time::{Sleeper, TokioSleeper};

use super::{HttpError, HttpRequest, HttpResponse, Next, Stage, StageFuture};

/// Which completed responses count as failures worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusRetry {
    /// Retry every status outside the 2xx range.
    #[default]
    AnyFailure,
    /// Retry only statuses that usually clear up on their own:
    /// 5xx, `408 Request Timeout` and `429 Too Many Requests`.
    TransientOnly,
}

impl StatusRetry {
    /// Returns true if a response with this status should be retried.
    #[must_use]
    pub fn should_retry(self, status: http::StatusCode) -> bool {
        match self {
            Self::AnyFailure => !status.is_success(),
            Self::TransientOnly => {
                status.is_server_error()
                    || status == http::StatusCode::TOO_MANY_REQUESTS
                    || status == http::StatusCode::REQUEST_TIMEOUT
            }
        }
    }
}

/// Configuration for exponential backoff retry behavior.
///
/// Controls how many times to retry a failed call and how long to wait
/// between attempts. The delay before retry `n` (1-based) is
/// `initial_delay * multiplier^(n - 1)`, capped at `max_delay`.
///
/// # Defaults
///
/// - `max_retries`: 3 (so at most 4 attempts in total)
/// - `initial_delay`: 2 seconds
/// - `max_delay`: 60 seconds
/// - `multiplier`: 2.0
/// - `status`: [`StatusRetry::AnyFailure`]
///
/// With the defaults the waits are 2s, 4s and 8s.
///
/// # Example
///
/// ```
/// use http_sender::pipeline::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_retries(5)
///     .with_initial_delay(Duration::from_millis(500))
///     .with_multiplier(1.5);
///
/// assert_eq!(policy.delay_for_retry(0), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    ///
    /// A value of 0 disables retrying.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,

    /// Which statuses are retried.
    pub status: StatusRetry,
}

impl RetryPolicy {
    /// Default maximum retries.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Default initial delay (2 seconds).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(2);

    /// Default maximum delay (60 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Creates a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
            status: StatusRetry::AnyFailure,
        }
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first retry.
    ///
    /// Zero delay is supported (useful for testing) but creates a tight
    /// retry loop in production.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is not positive (must be > 0.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "multiplier must be positive");
        self.multiplier = multiplier;
        self
    }

    /// Sets which statuses are retried.
    #[must_use]
    pub const fn with_status_retry(mut self, status: StatusRetry) -> Self {
        self.status = status;
        self
    }

    /// Computes the delay for a given retry number (0-indexed).
    ///
    /// `retry` 0 is the wait before the first retry, 1 before the second, etc.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        // retry values are tiny compared to i32::MAX
        #[allow(clippy::cast_possible_wrap)]
        let multiplier = self.multiplier.powi(retry as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        // Rounding near Duration::MAX can overflow the conversion
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Returns true if another retry is allowed after `retries_done` retries.
    #[must_use]
    pub const fn should_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }

    /// Total number of attempts this policy allows.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension trait for checking if an error is retryable.
///
/// Determines whether an error represents a transient failure that
/// warrants another attempt.
pub trait IsRetryable {
    /// Returns true if the error is potentially transient and should be retried.
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for HttpError {
    fn is_retryable(&self) -> bool {
        match self {
            // Network errors are typically transient
            Self::Connection(_) | Self::Timeout => true,
            // Configuration problems and half-read bodies are not
            Self::InvalidUrl(_) | Self::Body(_) | Self::ClientBuild(_) => false,
        }
    }
}

/// Stage that re-invokes the rest of the pipeline on transient failures.
///
/// Attempts are strictly sequential. After the policy is exhausted the last
/// outcome, error or failing response, is returned unchanged.
///
/// # Type Parameters
///
/// - `S`: The sleeper used for backoff delays (defaults to [`TokioSleeper`])
#[derive(Debug, Clone)]
pub struct RetryStage<S = TokioSleeper> {
    policy: RetryPolicy,
    sleeper: S,
}

impl RetryStage<TokioSleeper> {
    /// Creates a retry stage that waits on the tokio timer.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: TokioSleeper,
        }
    }
}

impl<S> RetryStage<S> {
    /// Replaces the sleeper used for backoff delays.
    ///
    /// This is primarily useful for testing to avoid actual delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> RetryStage<S2> {
        RetryStage {
            policy: self.policy,
            sleeper,
        }
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<S: Sleeper> RetryStage<S> {
    fn is_retryable(&self, outcome: &Result<HttpResponse, HttpError>) -> bool {
        match outcome {
            Ok(response) => self.policy.status.should_retry(response.status),
            Err(error) => error.is_retryable(),
        }
    }

    async fn run(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, HttpError> {
        let mut retries = 0;

        loop {
            let outcome = next.run(request.clone()).await;

            if !self.is_retryable(&outcome) || !self.policy.should_retry(retries) {
                return outcome;
            }

            let delay = self.policy.delay_for_retry(retries);
            retries += 1;

            match &outcome {
                Ok(response) => tracing::warn!(
                    "{} {} returned {}, retry {retries}/{} in {delay:?}",
                    request.method,
                    request.url,
                    response.status,
                    self.policy.max_retries,
                ),
                Err(error) => tracing::warn!(
                    "{} {} failed ({error}), retry {retries}/{} in {delay:?}",
                    request.method,
                    request.url,
                    self.policy.max_retries,
                ),
            }

            // Release the failed response (and its connection) before waiting
            drop(outcome);
            self.sleeper.sleep(delay).await;
        }
    }
}

impl<S: Sleeper + 'static> Stage for RetryStage<S> {
    fn name(&self) -> &'static str {
        "retry"
    }

    fn handle<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> StageFuture<'a> {
        Box::pin(self.run(request, next))
    }
}
