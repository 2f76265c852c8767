//! Uniform result of one dispatched request.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use super::{DispatchError, RequestSnapshot};
use crate::pipeline::{BodyStream, HttpError, HttpResponse, Rejection};

/// What came back from one send, plus how long it took.
///
/// `duration` covers the pipeline call only (filter, every retry attempt and
/// backoff delay, up to response headers). Reading the body afterwards is
/// not included.
#[derive(Debug)]
pub struct DispatchResult {
    duration: Duration,
    outcome: Outcome,
}

/// Either a response or a failure, never both.
#[derive(Debug)]
pub enum Outcome {
    /// A response was obtained, from the server or from a local rejection.
    Completed(HttpResponse),
    /// No response could be obtained.
    Failed(Failure),
}

/// Error plus the request that caused it.
#[derive(Debug)]
pub struct Failure {
    /// What went wrong.
    pub error: DispatchError,
    /// The request as it was handed to the dispatcher.
    pub request: RequestSnapshot,
}

/// Classification of a [`DispatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// 2xx response.
    Success,
    /// Refused locally by the URL safety filter.
    Rejected(Rejection),
    /// Non-2xx response from the server, after any retries.
    NonSuccessStatus(StatusCode),
    /// Connection-level failure after any retries.
    TransientNetwork,
    /// The per-call timeout elapsed after any retries.
    Timeout,
    /// The caller's cancellation signal fired.
    Cancelled,
    /// The request could not be sent at all (bad URL, client setup).
    InvalidRequest,
}

impl DispatchResult {
    /// Wraps a response.
    #[must_use]
    pub const fn completed(duration: Duration, response: HttpResponse) -> Self {
        Self {
            duration,
            outcome: Outcome::Completed(response),
        }
    }

    /// Wraps a failure.
    #[must_use]
    pub const fn failed(duration: Duration, error: DispatchError, request: RequestSnapshot) -> Self {
        Self {
            duration,
            outcome: Outcome::Failed(Failure { error, request }),
        }
    }

    /// Time spent in the pipeline.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// The completed response or the failure.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Consumes the result, returning its outcome.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }

    /// Classifies the result.
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match &self.outcome {
            Outcome::Completed(response) => match response.rejection() {
                Some(rejection) => OutcomeKind::Rejected(rejection),
                None if response.is_success() => OutcomeKind::Success,
                None => OutcomeKind::NonSuccessStatus(response.status),
            },
            Outcome::Failed(failure) => match &failure.error {
                DispatchError::Cancelled => OutcomeKind::Cancelled,
                DispatchError::Http(HttpError::Timeout) => OutcomeKind::Timeout,
                DispatchError::Http(HttpError::Connection(_) | HttpError::Body(_)) => {
                    OutcomeKind::TransientNetwork
                }
                DispatchError::Http(HttpError::InvalidUrl(_) | HttpError::ClientBuild(_)) => {
                    OutcomeKind::InvalidRequest
                }
            },
        }
    }

    /// True only for a completed 2xx response.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind() == OutcomeKind::Success
    }

    /// Response status, if a response was obtained.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(|response| response.status)
    }

    /// Response headers, if a response was obtained.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.response().map(|response| &response.headers)
    }

    /// The response, if one was obtained.
    #[must_use]
    pub const fn response(&self) -> Option<&HttpResponse> {
        match &self.outcome {
            Outcome::Completed(response) => Some(response),
            Outcome::Failed(_) => None,
        }
    }

    /// Consumes the result, returning the response if one was obtained.
    #[must_use]
    pub fn into_response(self) -> Option<HttpResponse> {
        match self.outcome {
            Outcome::Completed(response) => Some(response),
            Outcome::Failed(_) => None,
        }
    }

    /// The failure, if no response was obtained.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Outcome::Completed(_) => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }

    /// Reads the whole body as bytes.
    ///
    /// # Errors
    ///
    /// Returns the failure's error for a failed result, or a body error if
    /// reading fails.
    pub async fn bytes(self) -> Result<Bytes, DispatchError> {
        Ok(self.into_completed()?.bytes().await?)
    }

    /// Reads the whole body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the failure's error for a failed result, or a body error if
    /// reading or decoding fails.
    pub async fn text(self) -> Result<String, DispatchError> {
        Ok(self.into_completed()?.text().await?)
    }

    /// Returns the body as a chunk stream.
    ///
    /// # Errors
    ///
    /// Returns the failure's error for a failed result.
    pub fn into_stream(self) -> Result<BodyStream, DispatchError> {
        Ok(self.into_completed()?.into_body().into_stream())
    }

    fn into_completed(self) -> Result<HttpResponse, DispatchError> {
        match self.outcome {
            Outcome::Completed(response) => Ok(response),
            Outcome::Failed(failure) => Err(failure.error),
        }
    }
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Completed(response) => {
                write!(f, "Completed in {:?}: {response}", self.duration)
            }
            Outcome::Failed(failure) => write!(
                f,
                "Failed after {:?}: {}\n{}",
                self.duration, failure.error, failure.request
            ),
        }
    }
}
