//! Shared test doubles for pipeline and dispatch tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

type Responder = Box<dyn Fn() -> Result<HttpResponse, HttpError> + Send + Sync>;

/// Mock HTTP client that replays scripted outcomes, then falls back to a
/// fixed responder.
pub struct MockClient {
    scripted: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    fallback: Responder,
    requests: Mutex<Vec<HttpRequest>>,
    call_count: AtomicUsize,
    latency: Duration,
}

impl MockClient {
    /// Replays `outcomes` in order, then answers `200 OK`.
    pub fn new(outcomes: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            scripted: Mutex::new(outcomes.into()),
            fallback: Box::new(|| Ok(HttpResponse::with_status(http::StatusCode::OK))),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Always answers with the given status and body.
    pub fn always_status(status: http::StatusCode, body: &'static str) -> Self {
        Self::always(move || Ok(HttpResponse::new(status, http::HeaderMap::new(), body)))
    }

    /// Always answers `200 OK` with the given body.
    pub fn success(body: &'static str) -> Self {
        Self::always_status(http::StatusCode::OK, body)
    }

    /// Always fails with a connection error.
    pub fn always_failing() -> Self {
        Self::always(|| Err(HttpError::connection(std::io::Error::other("connection reset"))))
    }

    /// Always produces the outcome built by `responder`.
    pub fn always(
        responder: impl Fn() -> Result<HttpResponse, HttpError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            fallback: Box::new(responder),
            ..Self::new(Vec::new())
        }
    }

    /// Waits `latency` on the tokio clock before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let scripted = self.scripted.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| (self.fallback)())
    }
}

impl HttpClient for Arc<MockClient> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).request(req).await
    }
}

pub fn test_url() -> url::Url {
    url::Url::parse("https://example.com/api").unwrap()
}

pub fn status(code: u16) -> HttpResponse {
    HttpResponse::with_status(http::StatusCode::from_u16(code).unwrap())
}
