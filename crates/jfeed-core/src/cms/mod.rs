//! Upstream CMS access: payload types, the [`CmsSource`] seam and its HTTP client.

mod client;
mod source;
mod types;

pub use client::CmsClient;
pub use source::{CmsSource, DynCmsSource};
pub use types::{
    Article, ArticlePage, ArticleQuery, Author, Category, EntityKind, EntitySummary, Tag, TermRef,
};
