//! HTTP client with rate limiting awareness.
//!
//! Thin wrapper around reqwest used for every CMS call:
//! - Rate limit tracking from response headers
//! - Automatic throttling when approaching limits
//! - Configurable timeout and user agent

use crate::config::{AppConfig, NetworkConfig};
use crate::{JfeedError, Result};
use reqwest::{header, Client, Response, StatusCode};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Rate limit state extracted from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    /// Remaining requests allowed.
    pub remaining: Option<u64>,
    /// Total request limit.
    pub limit: Option<u64>,
    /// Unix timestamp when the rate limit resets.
    pub reset: Option<u64>,
}

impl RateLimitState {
    /// Check if we should throttle requests.
    pub fn should_throttle(&self) -> bool {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => {
                // Throttle when below 10% of limit
                let threshold = (limit as f64 * 0.1) as u64;
                remaining < threshold.max(1)
            }
            _ => false,
        }
    }

    /// How long to pause before the next request, if at all: until the
    /// window resets when the CMS told us, else `fallback`, never over `cap`.
    pub fn throttle_wait(&self, fallback: Duration, cap: Duration) -> Option<Duration> {
        self.should_throttle()
            .then(|| self.time_until_reset().unwrap_or(fallback).min(cap))
    }

    /// Get time until rate limit resets.
    pub fn time_until_reset(&self) -> Option<Duration> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.reset
            .filter(|reset| *reset > now)
            .map(|reset| Duration::from_secs(reset - now))
    }
}

/// HTTP client with rate limiting awareness.
pub struct HttpClient {
    client: Client,
    rate_limit_remaining: AtomicI64,
    rate_limit_limit: AtomicU64,
    rate_limit_reset: AtomicU64,
    timeout: Duration,
    throttle_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| JfeedError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            rate_limit_remaining: AtomicI64::new(-1),
            rate_limit_limit: AtomicU64::new(0),
            rate_limit_reset: AtomicU64::new(0),
            timeout,
            throttle_delay: Duration::from_millis(250),
        })
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the current rate limit state.
    pub fn rate_limit_state(&self) -> RateLimitState {
        let remaining = self.rate_limit_remaining.load(Ordering::SeqCst);
        let limit = self.rate_limit_limit.load(Ordering::SeqCst);
        let reset = self.rate_limit_reset.load(Ordering::SeqCst);
        RateLimitState {
            remaining: (remaining >= 0).then_some(remaining as u64),
            limit: (limit > 0).then_some(limit),
            reset: (reset > 0).then_some(reset),
        }
    }

    /// Make a GET request asking for JSON.
    ///
    /// Non-success statuses other than 429 are returned to the caller, which
    /// decides whether e.g. a 404 means "missing" or "broken".
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.maybe_throttle().await;

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    JfeedError::Timeout(self.timeout)
                } else {
                    JfeedError::Network {
                        message: format!("GET {} failed: {}", url, e),
                        cause: std::error::Error::source(&e).map(|s| s.to_string()),
                    }
                }
            })?;

        self.update_rate_limits(&response);
        self.check_response_status(response, url)
    }

    async fn maybe_throttle(&self) {
        let state = self.rate_limit_state();
        let wait = state.throttle_wait(self.throttle_delay, NetworkConfig::RETRY_MAX_DELAY);
        if let Some(wait) = wait {
            warn!(
                "CMS rate limit approaching (remaining: {:?}/{:?}), throttling for {:?}",
                state.remaining, state.limit, wait
            );
            tokio::time::sleep(wait).await;
        }
    }

    fn update_rate_limits(&self, response: &Response) {
        let headers = response.headers();
        let parse = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<i64>().ok())
        };

        if let Some(remaining) = parse("X-RateLimit-Remaining") {
            self.rate_limit_remaining.store(remaining, Ordering::SeqCst);
        }
        if let Some(limit) = parse("X-RateLimit-Limit").filter(|v| *v >= 0) {
            self.rate_limit_limit.store(limit as u64, Ordering::SeqCst);
        }
        if let Some(reset) = parse("X-RateLimit-Reset").filter(|v| *v >= 0) {
            self.rate_limit_reset.store(reset as u64, Ordering::SeqCst);
        }

        let remaining = self.rate_limit_remaining.load(Ordering::SeqCst);
        let limit = self.rate_limit_limit.load(Ordering::SeqCst);
        if remaining >= 0 && limit > 0 {
            debug!("CMS rate limit: {}/{}", remaining, limit);
        }
    }

    fn check_response_status(&self, response: Response, url: &str) -> Result<Response> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());

            return Err(JfeedError::RateLimited {
                service: extract_domain(url),
                retry_after_secs: retry_after,
            });
        }

        Ok(response)
    }
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
