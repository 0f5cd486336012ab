//! Trait seam between the gateway logic and the upstream CMS.
//!
//! The resolver and the home aggregator only see [`CmsSource`], so tests can
//! plug in an in-memory catalogue instead of the HTTP client.

use super::types::{
    Article, ArticlePage, ArticleQuery, Author, Category, EntityKind, EntitySummary, Tag,
};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait CmsSource: Send + Sync {
    /// Fetch an article by numeric id. `Ok(None)` when the CMS has no such article.
    async fn find_article(&self, id: u64) -> Result<Option<Article>>;

    async fn find_author(&self, slug: &str) -> Result<Option<Author>>;

    async fn find_tag(&self, slug: &str) -> Result<Option<Tag>>;

    async fn find_category(&self, slug: &str) -> Result<Option<Category>>;

    /// Fetch one page (1-based) of an article listing.
    async fn list_articles(&self, query: &ArticleQuery, page: u32) -> Result<ArticlePage>;

    /// Existence check by kind; article keys are decimal ids.
    async fn lookup(&self, kind: EntityKind, key: &str) -> Result<Option<EntitySummary>> {
        let summary = match kind {
            EntityKind::Article => match key.parse::<u64>() {
                Ok(id) => self.find_article(id).await?.as_ref().map(EntitySummary::from),
                Err(_) => None,
            },
            EntityKind::Author => self.find_author(key).await?.as_ref().map(EntitySummary::from),
            EntityKind::Tag => self.find_tag(key).await?.as_ref().map(EntitySummary::from),
            EntityKind::Category => self
                .find_category(key)
                .await?
                .as_ref()
                .map(EntitySummary::from),
        };
        Ok(summary)
    }
}

pub type DynCmsSource = Arc<dyn CmsSource>;
