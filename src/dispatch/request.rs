//! Fluent request specification.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, header};
use serde::Serialize;
use url::Url;

use super::headers::to_header_entries;
use super::{HeaderInput, RequestError};
use crate::pipeline::{HttpError, HttpRequest, Pipeline};

/// Everything needed to send one request.
///
/// Built by chaining calls that take the specification by value, then handed
/// to [`Dispatcher::send`](super::Dispatcher::send), which consumes it. The
/// next request always starts from a fresh specification.
///
/// # Example
///
/// ```
/// use http_sender::dispatch::{HeaderInput, RequestSpec};
///
/// # fn example() -> Result<(), http_sender::dispatch::RequestError> {
/// let spec = RequestSpec::new()
///     .use_method(http::Method::POST)
///     .with_uri("https://api.example.com/items")?
///     .with_headers(HeaderInput::flat([("X-Trace", "1")]), true)?
///     .with_json(&serde_json::json!({ "name": "demo" }))?;
/// # let _ = spec;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestSpec {
    endpoint: Option<Arc<Pipeline>>,
    logging: bool,
    method: Method,
    url: Option<Url>,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestSpec {
    /// Creates a blank `GET` specification using the dispatcher's default
    /// endpoint with logging enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: None,
            logging: true,
            method: Method::GET,
            url: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Starts over with a blank specification bound to `endpoint`.
    ///
    /// Anything configured so far is discarded.
    #[must_use]
    pub fn use_client(self, endpoint: Arc<Pipeline>, enable_logging: bool) -> Self {
        Self {
            endpoint: Some(endpoint),
            logging: enable_logging,
            ..Self::new()
        }
    }

    /// Turns request/result logging on or off without changing the endpoint.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn use_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Parses and sets the target URI.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidUri`] if `uri` is not an absolute URL.
    pub fn with_uri(self, uri: &str) -> Result<Self, RequestError> {
        let url = Url::parse(uri).map_err(|source| RequestError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;
        Ok(self.with_url(url))
    }

    /// Sets an already parsed target URL.
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_content(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body and sets
    /// `Content-Type: application/json`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Serialize`] if serialization fails.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, RequestError> {
        let body = serde_json::to_vec(value).map_err(|source| RequestError::Serialize {
            what: "body",
            source,
        })?;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self.with_content(body))
    }

    /// Appends headers. Existing values for the same name are kept.
    ///
    /// `replace_underscore_with_hyphen` rewrites `_` to `-` in names taken
    /// from [`HeaderInput::Structured`] input; flat input is never rewritten.
    ///
    /// # Errors
    ///
    /// - [`RequestError::MissingHeaders`] if `headers` is `None` or
    ///   serialized to `null`.
    /// - Name, value or shape errors from the header conversion.
    pub fn with_headers(
        mut self,
        headers: impl Into<Option<HeaderInput>>,
        replace_underscore_with_hyphen: bool,
    ) -> Result<Self, RequestError> {
        let input = headers.into().ok_or(RequestError::MissingHeaders)?;
        let pairs = input.into_pairs(replace_underscore_with_hyphen)?;

        for (name, value) in to_header_entries(pairs)? {
            self.headers.append(name, value);
        }
        Ok(self)
    }

    /// The HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The target URL, if one was set.
    #[must_use]
    pub const fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Headers configured so far.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Whether the request and its result will be logged.
    #[must_use]
    pub const fn logging_enabled(&self) -> bool {
        self.logging
    }

    /// The endpoint chosen with [`use_client`](Self::use_client), if any.
    #[must_use]
    pub const fn endpoint(&self) -> Option<&Arc<Pipeline>> {
        self.endpoint.as_ref()
    }

    /// Splits into endpoint, logging flag and request data.
    pub(crate) fn into_parts(self) -> (Option<Arc<Pipeline>>, bool, RequestSnapshot) {
        (
            self.endpoint,
            self.logging,
            RequestSnapshot {
                method: self.method,
                url: self.url,
                headers: self.headers,
                body: self.body,
            },
        )
    }
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// The request as it was handed to the dispatcher.
///
/// Kept on failed results so callers can see what was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSnapshot {
    /// HTTP method.
    pub method: Method,
    /// Target URL; `None` if the specification never received one.
    pub url: Option<Url>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
}

impl RequestSnapshot {
    /// Builds the pipeline request.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] if no URL was set.
    pub(crate) fn to_request(&self) -> Result<HttpRequest, HttpError> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| HttpError::InvalidUrl("no URI was set".to_string()))?;

        Ok(HttpRequest {
            method: self.method.clone(),
            url,
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }
}

impl fmt::Display for RequestSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{} {url}", self.method)?,
            None => write!(f, "{} <no URI>", self.method)?,
        }
        for (name, value) in &self.headers {
            write!(f, "\n  {name}: {}", value.to_str().unwrap_or("<binary>"))?;
        }
        if let Some(body) = &self.body {
            write!(f, "\n  <{} byte body>", body.len())?;
        }
        Ok(())
    }
}
