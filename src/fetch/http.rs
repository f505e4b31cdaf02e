//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests to fetch page content
//! - Retry logic with exponential backoff for transient failures
//! - Error classification into retryable and permanent failures

use crate::config::FetchConfig;
use crate::fetch::Fetcher;
use crate::TransportError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The transport configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use scp_harvest::config::FetchConfig;
/// use scp_harvest::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`] with retry and backoff
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return body |
/// | HTTP 404 | Immediate failure, not retryable |
/// | HTTP 429, 500, 502, 503, 504 | Retry with backoff |
/// | Other HTTP status | Immediate failure, not retryable |
/// | Timeout / connection error | Retry with backoff |
/// | Other client error | Immediate failure, not retryable |
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the transport configuration
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, max_retries: u32, backoff: Duration) -> Self {
        Self {
            client,
            max_retries,
            backoff,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                url,
                format!("HTTP {}", status),
                is_retryable_status(status),
            )
            .with_status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::new(url, format!("failed to read body: {}", e), true))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    tracing::debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) if e.retryable && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        "Retrying {} in {:?} (attempt {}/{}): {}",
                        url,
                        delay,
                        attempt + 1,
                        self.max_retries,
                        e.message
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::debug!("Giving up on {}: {}", url, e.message);
                    return Err(e);
                }
            }
        }
    }
}

/// Status codes worth repeating the request for
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Classifies a request-level error
fn classify_request_error(url: &str, error: &reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::new(url, "Request timeout", true)
    } else if error.is_connect() {
        TransportError::new(url, "Connection failed", true)
    } else {
        TransportError::new(url, error.to_string(), false)
    }
}
