//! HTTP request/response types and client trait.

use std::fmt;

use bytes::Bytes;

use super::{HttpError, ResponseBody};

/// Body text of a response rejected for using an insecure scheme.
pub const INSECURE_URL_MESSAGE: &str = "URL is not secure!";

/// Body text of a response rejected for targeting a blocked host.
pub const BLOCKED_HOST_MESSAGE: &str = "Host is not allowed";

/// An HTTP request flowing through the pipeline.
///
/// This is a value type that can be constructed and passed to any
/// [`HttpClient`] implementation. The body is reference-counted so the
/// retry stage can replay it without copying.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: http::Method,
    /// Target URL
    pub url: url::Url,
    /// HTTP headers to send
    pub headers: http::HeaderMap,
    /// Optional request body
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Creates a new HTTP request with the given method and URL.
    ///
    /// Headers are initialized to an empty map and body is `None`.
    #[must_use]
    pub fn new(method: http::Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: http::HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a GET request to the given URL.
    #[must_use]
    pub fn get(url: url::Url) -> Self {
        Self::new(http::Method::GET, url)
    }

    /// Creates a POST request to the given URL.
    #[must_use]
    pub fn post(url: url::Url) -> Self {
        Self::new(http::Method::POST, url)
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a header to the request.
    ///
    /// If the header name already exists, the value is appended
    /// (HTTP headers can have multiple values).
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)?;
        for (name, value) in &self.headers {
            write!(f, "\n  {name}: {}", value.to_str().unwrap_or("<binary>"))?;
        }
        if let Some(body) = &self.body {
            write!(f, "\n  <{} byte body>", body.len())?;
        }
        Ok(())
    }
}

/// Reason a request was answered locally instead of being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The URL does not use the secure scheme.
    InsecureScheme,
    /// The URL targets a host on the block list.
    BlockedHost,
}

impl Rejection {
    /// Human-readable body text for the local rejection response.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InsecureScheme => INSECURE_URL_MESSAGE,
            Self::BlockedHost => BLOCKED_HOST_MESSAGE,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// An HTTP response received from a server or produced by a stage.
///
/// Status and headers are always available; the body is read on demand.
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    body: ResponseBody,
    rejection: Option<Rejection>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub fn new(
        status: http::StatusCode,
        headers: http::HeaderMap,
        body: impl Into<ResponseBody>,
    ) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            rejection: None,
        }
    }

    /// Creates a response with the given status, no headers and an empty body.
    #[must_use]
    pub fn with_status(status: http::StatusCode) -> Self {
        Self::new(status, http::HeaderMap::new(), ResponseBody::empty())
    }

    /// Creates a local rejection response.
    ///
    /// The status is `403 Forbidden` and the body is the rejection message.
    #[must_use]
    pub fn rejected(rejection: Rejection) -> Self {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self {
            status: http::StatusCode::FORBIDDEN,
            headers,
            body: rejection.message().into(),
            rejection: Some(rejection),
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns why the request was answered locally, if it was.
    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        self.rejection
    }

    /// Returns the body handle.
    #[must_use]
    pub const fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Returns the body as a UTF-8 string, if it is buffered and valid.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_buffered()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Takes the body handle, dropping status and headers.
    #[must_use]
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Reads the whole body into memory.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Body`] if the body cannot be read.
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        self.body.bytes().await
    }

    /// Reads the whole body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Body`] if the body cannot be read or decoded.
    pub async fn text(self) -> Result<String, HttpError> {
        self.body.text().await
    }
}

impl fmt::Display for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(rejection) = self.rejection {
            write!(f, " (rejected locally: {rejection})")?;
        }
        for (name, value) in &self.headers {
            write!(f, "\n  {name}: {}", value.to_str().unwrap_or("<binary>"))?;
        }
        match self.body.as_buffered() {
            Some(bytes) => write!(f, "\n  <{} byte body>", bytes.len()),
            None => write!(f, "\n  <streaming body>"),
        }
    }
}

/// Trait for making HTTP requests.
///
/// This is the terminal capability of a [`Pipeline`](super::Pipeline): the
/// thing that actually talks to the network. Abstracting it enables:
/// - Dependency injection for testing with mock clients
/// - Swapping HTTP libraries without changing calling code
///
/// # Example
///
/// ```ignore
/// use http_sender::pipeline::{HttpClient, HttpRequest, HttpResponse, HttpError};
///
/// struct MockClient;
///
/// impl HttpClient for MockClient {
///     async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(HttpResponse::with_status(http::StatusCode::OK))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Sends an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] when:
    /// - Network connection fails ([`HttpError::Connection`])
    /// - Request times out ([`HttpError::Timeout`])
    /// - URL is invalid ([`HttpError::InvalidUrl`])
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, HttpError>> + Send;
}
