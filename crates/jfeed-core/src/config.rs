//! Centralized configuration for the jfeed gateway.
//!
//! Compile-time defaults live as associated constants on unit structs; the
//! values an operator may override are gathered in [`GatewayConfig`].

use crate::error::{JfeedError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "jfeed-gateway";
    pub const USER_AGENT: &'static str = "jfeed-gateway/0.3";
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8080;
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const CMS_BASE_URL: &'static str = "https://a.jfeed.com/v1";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
    pub const MAX_RETRIES: u32 = 2;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);
    /// Longest upstream `Retry-After` worth waiting for inside a request.
    pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(5);
    pub const CIRCUIT_BREAKER_FAILURE_THRESHOLD: u32 = 5;
    pub const CIRCUIT_BREAKER_RECOVERY_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Defaults for the existence lookup cache.
pub struct CacheSettings;

impl CacheSettings {
    pub const POSITIVE_TTL: Duration = Duration::from_secs(300);
    pub const NEGATIVE_TTL: Duration = Duration::from_secs(60);
    pub const MAX_ENTRIES: usize = 1000;
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
    /// Share of `MAX_ENTRIES` dropped (oldest first) when the cache is full.
    pub const EVICT_FRACTION: f64 = 0.2;
}

/// Home feed assembly.
pub struct HomeConfig;

impl HomeConfig {
    pub const FEED_TTL: Duration = Duration::from_secs(60);
    pub const PER_PAGE: u32 = 12;
    pub const MAX_PAGES: u32 = 3;
}

/// Runtime configuration for the gateway, assembled by the binary from CLI
/// flags and environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub cms_base_url: String,
    pub request_timeout: Duration,
    pub positive_ttl: Duration,
    pub negative_ttl: Duration,
    pub cache_max_entries: usize,
    pub feed_ttl: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: AppConfig::DEFAULT_HOST.to_string(),
            port: AppConfig::DEFAULT_PORT,
            cms_base_url: NetworkConfig::CMS_BASE_URL.to_string(),
            request_timeout: NetworkConfig::REQUEST_TIMEOUT,
            positive_ttl: CacheSettings::POSITIVE_TTL,
            negative_ttl: CacheSettings::NEGATIVE_TTL,
            cache_max_entries: CacheSettings::MAX_ENTRIES,
            feed_ttl: HomeConfig::FEED_TTL,
        }
    }
}

impl GatewayConfig {
    /// Reject configurations the gateway cannot run with.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.cms_base_url).map_err(|e| JfeedError::Config {
            message: format!("Invalid CMS base URL {}: {}", self.cms_base_url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(JfeedError::Config {
                message: format!("CMS base URL must be http(s): {}", self.cms_base_url),
            });
        }
        if self.cache_max_entries == 0 {
            return Err(JfeedError::Config {
                message: "cache_max_entries must be greater than zero".to_string(),
            });
        }
        if self.positive_ttl.is_zero() || self.negative_ttl.is_zero() {
            return Err(JfeedError::Config {
                message: "cache TTLs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// CMS base URL without a trailing slash.
    pub fn cms_base(&self) -> &str {
        self.cms_base_url.trim_end_matches('/')
    }
}
