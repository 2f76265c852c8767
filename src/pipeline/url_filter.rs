//! Destination safety checks.

use regex::Regex;

use super::{HttpRequest, HttpResponse, Next, Rejection, Stage, StageFuture};

/// Stage that refuses insecure or blocked destinations before any network
/// activity.
///
/// Rejections are ordinary `403` responses built by [`HttpResponse::rejected`],
/// never errors, so callers see them as completed (non-success) results.
///
/// # Example
///
/// ```
/// use http_sender::pipeline::UrlSafetyFilter;
///
/// let filter = UrlSafetyFilter::new()
///     .with_blocked_host("internal.example.com")
///     .with_blocked_pattern(r"\.local$")
///     .unwrap();
///
/// let url = url::Url::parse("http://example.com").unwrap();
/// assert!(filter.check(&url).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct UrlSafetyFilter {
    secure_scheme: String,
    blocked_hosts: Vec<String>,
    blocked_patterns: Vec<Regex>,
}

impl UrlSafetyFilter {
    /// The only scheme allowed through by default.
    pub const SECURE_SCHEME: &'static str = "https";

    /// Creates a filter that only requires the secure scheme.
    #[must_use]
    pub fn new() -> Self {
        Self {
            secure_scheme: Self::SECURE_SCHEME.to_string(),
            blocked_hosts: Vec::new(),
            blocked_patterns: Vec::new(),
        }
    }

    /// Adds an exact host name to the block list (case-insensitive).
    #[must_use]
    pub fn with_blocked_host(mut self, host: impl AsRef<str>) -> Self {
        let host = host.as_ref();
        let host = host.strip_suffix('.').unwrap_or(host);
        self.blocked_hosts.push(host.to_ascii_lowercase());
        self
    }

    /// Adds a host regex to the block list.
    ///
    /// Patterns are matched against the lower-cased host.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn with_blocked_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.blocked_patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Number of block list entries (hosts plus patterns).
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocked_hosts.len() + self.blocked_patterns.len()
    }

    /// Returns true if no hosts are blocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decides whether the URL must be rejected.
    ///
    /// The scheme is checked before the host, so an insecure URL to a
    /// blocked host reports [`Rejection::InsecureScheme`].
    #[must_use]
    pub fn check(&self, url: &url::Url) -> Option<Rejection> {
        if !url.scheme().eq_ignore_ascii_case(&self.secure_scheme) {
            return Some(Rejection::InsecureScheme);
        }

        let Some(host) = url.host_str() else {
            return Some(Rejection::BlockedHost);
        };
        let host = host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase();

        let blocked = self.blocked_hosts.iter().any(|blocked| *blocked == host)
            || self.blocked_patterns.iter().any(|re| re.is_match(&host));

        blocked.then_some(Rejection::BlockedHost)
    }
}

impl Default for UrlSafetyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for UrlSafetyFilter {
    fn name(&self) -> &'static str {
        "url-safety"
    }

    fn handle<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> StageFuture<'a> {
        match self.check(&request.url) {
            Some(rejection) => {
                tracing::warn!("Rejected {} {}: {rejection}", request.method, request.url);
                Box::pin(std::future::ready(Ok(HttpResponse::rejected(rejection))))
            }
            None => next.run(request),
        }
    }
}
