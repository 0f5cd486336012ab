//! Error types for the jfeed gateway.
//!
//! Upstream CMS failures, cache and routing problems all funnel into
//! [`JfeedError`], which the gateway maps onto HTTP status codes.

use thiserror::Error;

/// Main error type for the jfeed core library.
#[derive(Debug, Error)]
pub enum JfeedError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Circuit breaker open for {domain}")]
    CircuitBreakerOpen { domain: String },

    // Upstream CMS errors
    #[error("CMS returned {status} for {url}")]
    Upstream { url: String, status: u16 },

    #[error("{kind} not found: {key}")]
    NotFound { kind: String, key: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Request validation errors
    #[error("Invalid path {path}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for jfeed operations.
pub type Result<T> = std::result::Result<T, JfeedError>;

impl From<serde_json::Error> for JfeedError {
    fn from(err: serde_json::Error) -> Self {
        JfeedError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for JfeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JfeedError::Timeout(std::time::Duration::from_secs(0))
        } else if err.is_decode() {
            JfeedError::Json {
                message: err.to_string(),
                source: None,
            }
        } else {
            JfeedError::Network {
                message: err.to_string(),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }
}

impl JfeedError {
    /// HTTP status the gateway answers with when this error escapes a handler.
    pub fn to_status_code(&self) -> u16 {
        match self {
            JfeedError::NotFound { .. } => 404,
            JfeedError::InvalidPath { .. } => 400,
            JfeedError::Timeout(_) => 504,
            JfeedError::RateLimited { .. } => 503,
            JfeedError::CircuitBreakerOpen { .. } => 503,
            JfeedError::Network { .. } | JfeedError::Upstream { .. } | JfeedError::Json { .. } => {
                502
            }
            JfeedError::Config { .. } | JfeedError::Other(_) => 500,
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            JfeedError::Network { .. }
            | JfeedError::Timeout(_)
            | JfeedError::RateLimited { .. } => true,
            JfeedError::Upstream { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether this error reflects a failing upstream rather than a bad request.
    ///
    /// Only these count against the circuit breaker.
    pub fn is_upstream_failure(&self) -> bool {
        match self {
            JfeedError::Network { .. } | JfeedError::Timeout(_) => true,
            JfeedError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
