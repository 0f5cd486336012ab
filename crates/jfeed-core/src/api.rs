//! Entry point wiring the CMS source, lookup cache, resolver and home aggregator.

use crate::cache::{CacheStats, LookupCache};
use crate::cms::{CmsClient, DynCmsSource};
use crate::config::GatewayConfig;
use crate::error::Result;
use crate::home::{HomeAggregator, HomeFeed, HomeLayout};
use crate::network::{CircuitBreakerConfig, CircuitBreakerStats, RetryConfig};
use crate::routing::{Resolver, RouteDecision};
use std::sync::Arc;
use tracing::info;

/// Main API struct for gateway operations.
///
/// Cheap to share behind an `Arc`; every component is internally synchronized.
pub struct JfeedApi {
    config: GatewayConfig,
    /// Present when the HTTP client is in use, for breaker stats.
    cms: Option<Arc<CmsClient>>,
    lookup_cache: Arc<LookupCache>,
    resolver: Resolver,
    home: HomeAggregator,
    layout: HomeLayout,
}

impl JfeedApi {
    /// Build with the HTTP CMS client and the default home layout.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: GatewayConfig) -> JfeedApiBuilder {
        JfeedApiBuilder::new(config)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn layout(&self) -> &HomeLayout {
        &self.layout
    }

    pub async fn resolve(&self, path: &str, query: Option<&str>) -> RouteDecision {
        self.resolver.resolve(path, query).await
    }

    pub async fn home_feed(&self) -> Arc<HomeFeed> {
        self.home.feed(&self.layout).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.lookup_cache.stats()
    }

    /// Circuit breaker state of the CMS client; `None` with a custom source.
    pub fn breaker_stats(&self) -> Option<CircuitBreakerStats> {
        self.cms.as_ref().map(|cms| cms.breaker_stats())
    }

    /// Drop memoized lookups and assembled feeds.
    pub fn clear_caches(&self) {
        self.lookup_cache.clear();
        self.home.invalidate();
        info!("Lookup and home feed caches cleared");
    }

    /// Sweep expired lookups; returns how many were removed.
    pub fn sweep_caches(&self) -> usize {
        self.lookup_cache.cleanup_expired()
    }
}

/// Builder for [`JfeedApi`].
///
/// ```rust,ignore
/// let api = JfeedApi::builder(config)
///     .with_source(Arc::new(my_fake_cms))
///     .with_layout(layout)
///     .build()?;
/// ```
pub struct JfeedApiBuilder {
    config: GatewayConfig,
    source: Option<DynCmsSource>,
    layout: HomeLayout,
    retry: RetryConfig,
    breaker: CircuitBreakerConfig,
}

impl JfeedApiBuilder {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            source: None,
            layout: HomeLayout::default(),
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }

    /// Use a custom CMS source instead of the HTTP client.
    pub fn with_source(mut self, source: DynCmsSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_layout(mut self, layout: HomeLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Retry policy for the HTTP client. Ignored with a custom source.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Circuit breaker settings for the HTTP client. Ignored with a custom source.
    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn build(self) -> Result<JfeedApi> {
        self.config.validate()?;

        let (source, cms) = match self.source {
            Some(source) => (source, None),
            None => {
                let client = Arc::new(
                    CmsClient::new(&self.config)?
                        .with_retry(self.retry)
                        .with_breaker(self.breaker),
                );
                let source: DynCmsSource = client.clone();
                (source, Some(client))
            }
        };

        let lookup_cache = Arc::new(LookupCache::new(
            self.config.cache_max_entries,
            self.config.positive_ttl,
            self.config.negative_ttl,
        ));

        Ok(JfeedApi {
            resolver: Resolver::new(source.clone(), lookup_cache.clone()),
            home: HomeAggregator::with_ttl(source, self.config.feed_ttl),
            lookup_cache,
            cms,
            layout: self.layout,
            config: self.config,
        })
    }
}
