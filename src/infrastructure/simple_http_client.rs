//! HTTP client for page fetching with rate limiting and retry handling
//!
//! `HttpClient` is bound to one site's base URL so callers can ask for
//! relative listing paths and absolute product URLs alike. Failures never
//! surface as errors to the pipeline: once retries are exhausted the page is
//! simply `None`.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, StatusCode};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::config::ScraperConfig;
use super::page_fetcher::PageFetcher;
use crate::utils::normalize_url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error {status} for {url}")]
    Status {
        status: StatusCode,
        url: String,
        retry_after: Option<u64>,
    },

    #[error("Empty response from {url}")]
    EmptyBody { url: String },

    #[error("Giving up on {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },
}

impl FetchError {
    /// Transport errors, timeouts, throttling and server errors are worth
    /// another attempt; other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status { status, .. } => {
                *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error()
            }
            Self::EmptyBody { .. } | Self::Exhausted { .. } => false,
        }
    }
}

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub max_requests_per_second: u32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_delay_ms: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    pub fn from_scraper_config(config: &ScraperConfig, user_agent: &str) -> Self {
        Self {
            max_requests_per_second: config.max_requests_per_second,
            timeout_seconds: config.timeout_seconds,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
            request_delay_ms: config.request_delay_ms,
            user_agent: user_agent.to_string(),
            accept_language: config.accept_language.clone(),
            follow_redirects: config.follow_redirects,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_scraper_config(&ScraperConfig::default(), super::config::defaults::USER_AGENT)
    }
}

/// Exponential backoff: `base * 2^attempt` (attempt counted from 0) plus up
/// to a quarter of `base` of jitter.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let exponential = base_ms.saturating_mul(1_u64 << attempt.min(16));
    let jitter = if base_ms >= 4 {
        fastrand::u64(0..=base_ms / 4)
    } else {
        0
    };
    Duration::from_millis(exponential.saturating_add(jitter))
}

/// HTTP client with built-in rate limiting and retries
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    base_url: String,
    limiter: Arc<DefaultDirectRateLimiter>,
    requests_sent: Arc<AtomicU64>,
}

impl HttpClient {
    pub fn with_config(base_url: &str, config: HttpClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
            headers.insert(header::ACCEPT_LANGUAGE, value);
        }
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()?;

        let rate = NonZeroU32::new(config.max_requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rate)));

        Ok(Self {
            client,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter,
            requests_sent: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the site, or the URL itself.
    pub fn resolve(&self, path_or_url: &str) -> String {
        normalize_url(&self.base_url, path_or_url)
    }

    /// Fetch with retries. Non-retryable failures end the loop immediately.
    pub async fn fetch_html_string(&self, url: &str) -> Result<String, FetchError> {
        let attempts = self.config.max_retries.max(1);

        for attempt in 0..attempts {
            match self.fetch_html_string_once(url).await {
                Ok(body) => {
                    debug!("Fetched {} on attempt {}", url, attempt + 1);
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let mut delay = backoff_delay(attempt, self.config.retry_delay_ms);
                    if let FetchError::Status {
                        retry_after: Some(secs),
                        ..
                    } = &e
                    {
                        delay = delay.max(Duration::from_secs(*secs));
                    }
                    warn!(
                        "Attempt {}/{} failed for {}: {} (retrying in {:?})",
                        attempt + 1,
                        attempts,
                        url,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    warn!("Attempt {}/{} failed for {}: {}", attempt + 1, attempts, url, e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
        })
    }

    async fn fetch_html_string_once(&self, url: &str) -> Result<String, FetchError> {
        self.limiter.until_ready().await;

        if self.requests_sent.fetch_add(1, Ordering::Relaxed) > 0 && self.config.request_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }

        info!("HTTP GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
                retry_after,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn get_page(&self, path_or_url: &str) -> Option<String> {
        let url = self.resolve(path_or_url);
        match self.fetch_html_string(&url).await {
            Ok(body) => Some(body),
            Err(e @ FetchError::Exhausted { .. }) => {
                error!("{}", e);
                None
            }
            Err(e) => {
                warn!("Page unavailable: {}", e);
                None
            }
        }
    }
}
