//! Network utilities for talking to the CMS.
//!
//! - HTTP client with rate limiting awareness
//! - Retry logic with exponential backoff and jitter
//! - Circuit breaker for upstream resilience

mod circuit_breaker;
mod client;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use client::{extract_domain, HttpClient, RateLimitState};
pub use retry::{retry_async, RetryConfig, RetryHint, RetryStats};
