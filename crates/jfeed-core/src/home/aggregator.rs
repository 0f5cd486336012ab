//! Home feed assembly from overlapping CMS listings.
//!
//! Featured, latest and per-category listings share articles. Sections are
//! filled in layout order and a single seen-IDs set keeps every article in the
//! first section that claims it. Short sections are backfilled from later
//! pages of their own listing.

use super::layout::{HomeLayout, SectionSpec};
use crate::cms::{Article, ArticlePage, DynCmsSource};
use crate::config::HomeConfig;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use mini_moka::sync::Cache;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSection {
    pub key: String,
    pub title: String,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeFeed {
    pub sections: Vec<HomeSection>,
    pub generated_at: DateTime<Utc>,
}

impl HomeFeed {
    pub fn section(&self, key: &str) -> Option<&HomeSection> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub fn article_count(&self) -> usize {
        self.sections.iter().map(|s| s.articles.len()).sum()
    }
}

pub struct HomeAggregator {
    source: DynCmsSource,
    /// Assembled feeds by layout name.
    feeds: Cache<String, Arc<HomeFeed>>,
    /// Held while building on a miss so concurrent misses share one build.
    build_lock: Mutex<()>,
}

impl HomeAggregator {
    pub fn new(source: DynCmsSource) -> Self {
        Self::with_ttl(source, HomeConfig::FEED_TTL)
    }

    pub fn with_ttl(source: DynCmsSource, ttl: Duration) -> Self {
        Self {
            source,
            feeds: Cache::builder().time_to_live(ttl).max_capacity(16).build(),
            build_lock: Mutex::new(()),
        }
    }

    /// Cached feed for `layout`, building it on a miss.
    pub async fn feed(&self, layout: &HomeLayout) -> Arc<HomeFeed> {
        if let Some(feed) = self.feeds.get(&layout.name) {
            debug!("Home feed cache hit for {}", layout.name);
            return feed;
        }

        let _building = self.build_lock.lock().await;
        if let Some(feed) = self.feeds.get(&layout.name) {
            debug!("Home feed for {} built by a concurrent request", layout.name);
            return feed;
        }

        let feed = Arc::new(self.build(layout).await);
        self.feeds.insert(layout.name.clone(), feed.clone());
        feed
    }

    pub fn invalidate(&self) {
        self.feeds.invalidate_all();
    }

    /// Assemble a fresh feed, bypassing the cache.
    pub async fn build(&self, layout: &HomeLayout) -> HomeFeed {
        let first_pages = join_all(
            layout
                .sections
                .iter()
                .map(|spec| self.fetch_page(spec, 1)),
        )
        .await;

        let mut seen: HashSet<u64> = HashSet::new();
        let mut sections = Vec::with_capacity(layout.sections.len());

        for (spec, first_page) in layout.sections.iter().zip(first_pages) {
            let articles = self.fill_section(spec, first_page, &mut seen).await;
            if articles.len() < spec.min_count {
                debug!(
                    "Section {} has {}/{} articles after backfill",
                    spec.key,
                    articles.len(),
                    spec.min_count
                );
            }
            sections.push(HomeSection {
                key: spec.key.clone(),
                title: spec.title.clone(),
                articles,
            });
        }

        let feed = HomeFeed {
            sections,
            generated_at: Utc::now(),
        };
        info!(
            "Built home feed {} with {} articles in {} sections",
            layout.name,
            feed.article_count(),
            feed.sections.len()
        );
        feed
    }

    async fn fill_section(
        &self,
        spec: &SectionSpec,
        first_page: Option<ArticlePage>,
        seen: &mut HashSet<u64>,
    ) -> Vec<Article> {
        let mut articles = Vec::with_capacity(spec.min_count);
        let mut page_number = 1;
        let mut page = first_page;

        while let Some(current) = page.take() {
            let has_more = current.has_more();
            for article in current.items {
                if articles.len() >= spec.min_count {
                    break;
                }
                if seen.insert(article.id) {
                    articles.push(article);
                }
            }

            if articles.len() >= spec.min_count || !has_more || page_number >= spec.max_pages {
                break;
            }
            page_number += 1;
            page = self.fetch_page(spec, page_number).await;
        }

        articles
    }

    async fn fetch_page(&self, spec: &SectionSpec, page: u32) -> Option<ArticlePage> {
        if spec.min_count == 0 {
            return None;
        }
        match self.source.list_articles(&spec.query, page).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(
                    "Fetching page {} for section {} failed: {}",
                    page, spec.key, e
                );
                None
            }
        }
    }
}
