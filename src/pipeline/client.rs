//! Production transport implementation using reqwest.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_stream::StreamExt;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse, ResponseBody};

/// Connection pool and timeout settings for [`ReqwestTransport`].
///
/// # Defaults
///
/// - `timeout`: 2 seconds
/// - `pooled_connection_lifetime`: 2 minutes
/// - `max_connections_per_host`: 400
/// - `idle_timeout`: 1 minute
/// - `keep_alive_interval`: 30 seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// How long to wait for response headers (including waiting for a free
    /// connection) before failing with [`HttpError::Timeout`].
    pub timeout: Duration,

    /// Age after which the whole pool is replaced, so DNS changes are
    /// picked up without a restart.
    pub pooled_connection_lifetime: Duration,

    /// Concurrent requests allowed per `host:port`; extra requests queue.
    pub max_connections_per_host: usize,

    /// Idle connections are closed after this long without traffic.
    pub idle_timeout: Duration,

    /// Interval of keep-alive pings while requests are outstanding.
    pub keep_alive_interval: Duration,
}

impl TransportConfig {
    /// Default per-call timeout (2 seconds).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Default pool lifetime (2 minutes).
    pub const DEFAULT_POOLED_CONNECTION_LIFETIME: Duration = Duration::from_secs(120);

    /// Default connection cap per host.
    pub const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 400;

    /// Default idle timeout (1 minute).
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Default keep-alive ping interval (30 seconds).
    pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

    /// Creates a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            pooled_connection_lifetime: Self::DEFAULT_POOLED_CONNECTION_LIFETIME,
            max_connections_per_host: Self::DEFAULT_MAX_CONNECTIONS_PER_HOST,
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
            keep_alive_interval: Self::DEFAULT_KEEP_ALIVE_INTERVAL,
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the pool lifetime.
    #[must_use]
    pub const fn with_pooled_connection_lifetime(mut self, lifetime: Duration) -> Self {
        self.pooled_connection_lifetime = lifetime;
        self
    }

    /// Sets the per-host connection cap.
    ///
    /// # Panics
    ///
    /// Panics if `max` is 0.
    #[must_use]
    pub const fn with_max_connections_per_host(mut self, max: usize) -> Self {
        assert!(max > 0, "max_connections_per_host must be at least 1");
        self.max_connections_per_host = max;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the keep-alive ping interval.
    #[must_use]
    pub const fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One generation of the connection pool.
#[derive(Debug)]
struct PoolGeneration {
    client: reqwest::Client,
    created: Instant,
    number: u64,
}

/// Production transport using a pooled `reqwest::Client`.
///
/// Meant to be created once per process and shared through a
/// [`Pipeline`](super::Pipeline). Responses are returned as soon as headers
/// arrive; the body stays on the connection until it is read or dropped.
///
/// # Example
///
/// ```no_run
/// use http_sender::pipeline::{HttpClient, HttpRequest, ReqwestTransport, TransportConfig};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = ReqwestTransport::new(TransportConfig::default())?;
/// let url = Url::parse("https://api.example.com/items")?;
/// let response = transport.request(HttpRequest::get(url)).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ReqwestTransport {
    config: TransportConfig,
    pool: RwLock<PoolGeneration>,
    limits: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ReqwestTransport {
    /// Creates a transport with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::ClientBuild`] if the TLS backend or client
    /// cannot be initialized.
    pub fn new(config: TransportConfig) -> Result<Self, HttpError> {
        let client = build_client(&config)?;
        Ok(Self {
            config,
            pool: RwLock::new(PoolGeneration {
                client,
                created: Instant::now(),
                number: 0,
            }),
            limits: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the transport settings.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Number of times the pool has been replaced since construction.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.pool.read().unwrap_or_else(PoisonError::into_inner).number
    }

    /// Returns the current client, replacing the pool first if it has
    /// outlived `pooled_connection_lifetime`.
    ///
    /// Requests still running on the old pool keep their connections; the
    /// old pool closes once they finish.
    pub(crate) fn pooled_client(&self) -> Result<reqwest::Client, HttpError> {
        {
            let current = self.pool.read().unwrap_or_else(PoisonError::into_inner);
            if current.created.elapsed() < self.config.pooled_connection_lifetime {
                return Ok(current.client.clone());
            }
        }

        let mut current = self.pool.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have rotated while we waited for the lock
        if current.created.elapsed() >= self.config.pooled_connection_lifetime {
            *current = PoolGeneration {
                client: build_client(&self.config)?,
                created: Instant::now(),
                number: current.number + 1,
            };
            tracing::debug!("Connection pool rotated (generation {})", current.number);
        }
        Ok(current.client.clone())
    }

    /// Returns the connection limiter for the URL's `host:port`.
    pub(crate) fn host_limit(&self, url: &url::Url) -> Arc<Semaphore> {
        let key = format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default()
        );
        let mut limits = self.limits.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            limits
                .entry(key)
                .or_insert_with(|| Arc::new(Semaphore::new(self.config.max_connections_per_host))),
        )
    }
}

impl HttpClient for ReqwestTransport {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let client = self.pooled_client()?;
        let limit = self.host_limit(&req.url);

        let exchange = async move {
            let permit = limit.acquire_owned().await.map_err(HttpError::connection)?;

            let mut builder = client.request(req.method, req.url).headers(req.headers);
            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(map_reqwest_error)?;
            Ok::<_, HttpError>((response, permit))
        };

        let (response, permit) = tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| HttpError::Timeout)??;

        let status = response.status();
        let headers = response.headers().clone();

        // The permit travels with the body so the connection slot is only
        // released once the caller is done reading.
        let stream = response.bytes_stream().map(move |chunk| {
            let _slot = &permit;
            chunk.map_err(HttpError::body)
        });

        Ok(HttpResponse::new(
            status,
            headers,
            ResponseBody::streaming(stream),
        ))
    }
}

fn build_client(config: &TransportConfig) -> Result<reqwest::Client, HttpError> {
    reqwest::Client::builder()
        .connect_timeout(config.timeout)
        .pool_idle_timeout(config.idle_timeout)
        .pool_max_idle_per_host(config.max_connections_per_host)
        .tcp_keepalive(config.keep_alive_interval)
        .http2_keep_alive_interval(config.keep_alive_interval)
        .http2_keep_alive_timeout(config.idle_timeout)
        .http2_keep_alive_while_idle(false)
        .build()
        .map_err(|e| HttpError::ClientBuild(Box::new(e)))
}

fn map_reqwest_error(error: reqwest::Error) -> HttpError {
    if error.is_timeout() {
        HttpError::Timeout
    } else if error.is_builder() {
        HttpError::InvalidUrl(error.to_string())
    } else {
        HttpError::connection(error)
    }
}
