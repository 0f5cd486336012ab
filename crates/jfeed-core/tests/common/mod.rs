//! In-memory CMS used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use jfeed_core::{
    Article, ArticlePage, ArticleQuery, Author, Category, CmsSource, JfeedError, Result, Tag,
    TermRef,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const PER_PAGE: u32 = 4;

#[derive(Default)]
pub struct FakeCms {
    articles: Vec<Article>,
    authors: HashMap<String, Author>,
    tags: HashMap<String, Tag>,
    categories: HashMap<String, Category>,
    failing: AtomicBool,
    failing_queries: Mutex<Vec<ArticleQuery>>,
    lookups: AtomicUsize,
    listings: Mutex<Vec<(ArticleQuery, u32)>>,
    latency: Option<Duration>,
}

impl FakeCms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_article(mut self, article: Article) -> Self {
        self.articles.push(article);
        self
    }

    pub fn with_articles(mut self, articles: impl IntoIterator<Item = Article>) -> Self {
        self.articles.extend(articles);
        self
    }

    pub fn with_author(mut self, slug: &str, name: &str) -> Self {
        let id = self.authors.len() as u64 + 1;
        self.authors.insert(
            slug.to_string(),
            Author {
                id,
                slug: slug.to_string(),
                name: name.to_string(),
                bio: None,
            },
        );
        self
    }

    pub fn with_tag(mut self, slug: &str) -> Self {
        let id = self.tags.len() as u64 + 1;
        self.tags.insert(
            slug.to_string(),
            Tag {
                id,
                slug: slug.to_string(),
                name: slug.to_uppercase(),
            },
        );
        self
    }

    pub fn with_category(mut self, slug: &str) -> Self {
        let id = self.categories.len() as u64 + 1;
        self.categories.insert(
            slug.to_string(),
            Category {
                id,
                slug: slug.to_string(),
                name: slug.to_uppercase(),
                parent: None,
            },
        );
        self
    }

    /// Delay every listing by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every call fail with a network error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make listings matching `query` fail.
    pub fn fail_listing(&self, query: ArticleQuery) {
        self.failing_queries.lock().unwrap().push(query);
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn listing_calls(&self) -> Vec<(ArticleQuery, u32)> {
        self.listings.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(JfeedError::Network {
                message: "connection refused".into(),
                cause: None,
            });
        }
        Ok(())
    }

    fn matches(article: &Article, query: &ArticleQuery) -> bool {
        if query.featured == Some(true) && !article.featured {
            return false;
        }
        if let Some(category) = &query.category {
            if article.category.as_ref().map(|c| &c.slug) != Some(category) {
                return false;
            }
        }
        if let Some(tag) = &query.tag {
            if !article.tags.iter().any(|t| &t.slug == tag) {
                return false;
            }
        }
        if let Some(author) = &query.author {
            if article.author.as_ref().map(|a| &a.slug) != Some(author) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl CmsSource for FakeCms {
    async fn find_article(&self, id: u64) -> Result<Option<Article>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn find_author(&self, slug: &str) -> Result<Option<Author>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.authors.get(slug).cloned())
    }

    async fn find_tag(&self, slug: &str) -> Result<Option<Tag>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.tags.get(slug).cloned())
    }

    async fn find_category(&self, slug: &str) -> Result<Option<Category>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.categories.get(slug).cloned())
    }

    async fn list_articles(&self, query: &ArticleQuery, page: u32) -> Result<ArticlePage> {
        self.listings.lock().unwrap().push((query.clone(), page));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check()?;
        if self.failing_queries.lock().unwrap().contains(query) {
            return Err(JfeedError::Upstream {
                url: "fake://articles".into(),
                status: 500,
            });
        }

        let per_page = query.per_page.unwrap_or(PER_PAGE) as usize;
        let matching: Vec<&Article> = self
            .articles
            .iter()
            .filter(|a| Self::matches(a, query))
            .collect();
        let total_pages = matching.len().div_ceil(per_page).max(1) as u32;
        let start = (page.max(1) as usize - 1) * per_page;
        let items = matching
            .into_iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();

        Ok(ArticlePage {
            items,
            page,
            total_pages,
        })
    }
}

/// Article `id` with slug `story-{id}`.
pub fn article(id: u64) -> Article {
    Article {
        id,
        slug: format!("story-{id}"),
        title: format!("Story {id}"),
        excerpt: None,
        category: None,
        tags: Vec::new(),
        author: None,
        published_at: None,
        featured: false,
        image_url: None,
    }
}

pub fn featured(id: u64) -> Article {
    Article {
        featured: true,
        ..article(id)
    }
}

pub fn in_category(mut article: Article, slug: &str) -> Article {
    article.category = Some(TermRef {
        slug: slug.to_string(),
        name: slug.to_uppercase(),
    });
    article
}
