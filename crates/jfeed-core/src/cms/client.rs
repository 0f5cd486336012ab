//! HTTP implementation of [`CmsSource`] against the jfeed REST API.
//!
//! Endpoints:
//! - `GET {base}/articles/{id}`
//! - `GET {base}/authors/{slug}`, `/tags/{slug}`, `/categories/{slug}`
//! - `GET {base}/articles?page=&per_page=&category=&tag=&author=&featured=`
//!
//! A 404 on a single-entity endpoint means "does not exist" and is not an error.

use super::source::CmsSource;
use super::types::{Article, ArticlePage, ArticleQuery, Author, Category, EntityKind, Tag};
use crate::config::{GatewayConfig, HomeConfig};
use crate::network::{
    extract_domain, retry_async, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats,
    HttpClient, RetryConfig,
};
use crate::{JfeedError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

pub struct CmsClient {
    base_url: String,
    http: HttpClient,
    breaker: CircuitBreaker,
    retry: RetryConfig,
}

impl CmsClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base_url = config.cms_base().to_string();
        Ok(Self {
            http: HttpClient::with_timeout(config.request_timeout)?,
            breaker: CircuitBreaker::new(extract_domain(&base_url)),
            retry: RetryConfig::default(),
            base_url,
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker = CircuitBreaker::with_config(extract_domain(&self.base_url), config);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn breaker_stats(&self) -> CircuitBreakerStats {
        self.breaker.stats()
    }

    fn entity_url(&self, kind: EntityKind, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            kind.collection(),
            urlencoding::encode(key)
        )
    }

    fn listing_url(&self, query: &ArticleQuery, page: u32) -> Result<String> {
        let mut url = url::Url::parse(&format!("{}/articles", self.base_url)).map_err(|e| {
            JfeedError::Config {
                message: format!("Invalid CMS base URL {}: {}", self.base_url, e),
            }
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.max(1).to_string());
            pairs.append_pair(
                "per_page",
                &query.per_page.unwrap_or(HomeConfig::PER_PAGE).to_string(),
            );
            if let Some(category) = &query.category {
                pairs.append_pair("category", category);
            }
            if let Some(tag) = &query.tag {
                pairs.append_pair("tag", tag);
            }
            if let Some(author) = &query.author {
                pairs.append_pair("author", author);
            }
            if let Some(featured) = query.featured {
                pairs.append_pair("featured", if featured { "true" } else { "false" });
            }
        }
        Ok(url.into())
    }

    /// GET a JSON document through the circuit breaker and retry policy.
    async fn fetch_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        if !self.breaker.allow_request() {
            return Err(JfeedError::CircuitBreakerOpen {
                domain: self.breaker.domain().to_string(),
            });
        }

        let (result, stats) = retry_async(
            &self.retry,
            move || self.fetch_once::<T>(url),
            |e: &JfeedError| e.is_retryable(),
        )
        .await;

        if stats.attempts > 1 {
            debug!("CMS request {} took {} attempts", url, stats.attempts);
        }

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(e) if e.is_upstream_failure() => self.breaker.record_failure(),
            Err(_) => self.breaker.record_neutral(),
        }
        result
    }

    async fn fetch_once<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.http.get(url).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(JfeedError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.json::<T>().await.map_err(|e| JfeedError::Json {
            message: format!("Failed to decode {}: {}", url, e),
            source: None,
        })?;
        Ok(Some(body))
    }
}

#[async_trait]
impl CmsSource for CmsClient {
    async fn find_article(&self, id: u64) -> Result<Option<Article>> {
        self.fetch_optional(&self.entity_url(EntityKind::Article, &id.to_string()))
            .await
    }

    async fn find_author(&self, slug: &str) -> Result<Option<Author>> {
        self.fetch_optional(&self.entity_url(EntityKind::Author, slug))
            .await
    }

    async fn find_tag(&self, slug: &str) -> Result<Option<Tag>> {
        self.fetch_optional(&self.entity_url(EntityKind::Tag, slug))
            .await
    }

    async fn find_category(&self, slug: &str) -> Result<Option<Category>> {
        self.fetch_optional(&self.entity_url(EntityKind::Category, slug))
            .await
    }

    async fn list_articles(&self, query: &ArticleQuery, page: u32) -> Result<ArticlePage> {
        let url = self.listing_url(query, page)?;
        let page_result: Option<ArticlePage> = self.fetch_optional(&url).await?;
        Ok(page_result.unwrap_or_else(|| ArticlePage::empty(page)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CmsClient {
        let config = GatewayConfig {
            cms_base_url: "https://a.jfeed.com/v1/".to_string(),
            ..Default::default()
        };
        CmsClient::new(&config).unwrap()
    }

    #[test]
    fn test_entity_url_encodes_slug() {
        let client = client();
        assert_eq!(
            client.entity_url(EntityKind::Tag, "חדשות"),
            "https://a.jfeed.com/v1/tags/%D7%97%D7%93%D7%A9%D7%95%D7%AA"
        );
        assert_eq!(
            client.entity_url(EntityKind::Article, "42"),
            "https://a.jfeed.com/v1/articles/42"
        );
    }

    #[test]
    fn test_listing_url_includes_filters() {
        let client = client();
        let query = ArticleQuery {
            category: Some("world".into()),
            featured: Some(true),
            per_page: Some(5),
            ..Default::default()
        };
        let url = client.listing_url(&query, 2).unwrap();
        assert_eq!(
            url,
            "https://a.jfeed.com/v1/articles?page=2&per_page=5&category=world&featured=true"
        );
    }

    #[test]
    fn test_listing_url_clamps_page() {
        let url = client().listing_url(&ArticleQuery::latest(), 0).unwrap();
        assert!(url.contains("page=1"));
    }

    #[test]
    fn test_breaker_tracks_cms_host() {
        assert_eq!(client().breaker_stats().domain, "a.jfeed.com");
    }
}
