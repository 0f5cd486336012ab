//! CMS payload types.
//!
//! Only the fields the gateway routes or aggregates on are modelled; unknown
//! fields in upstream JSON are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kinds of content the redirect middleware checks for existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Article,
    Author,
    Tag,
    Category,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Article => "article",
            EntityKind::Author => "author",
            EntityKind::Tag => "tag",
            EntityKind::Category => "category",
        }
    }

    /// Upstream collection name (`/v1/{collection}/{key}`).
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Article => "articles",
            EntityKind::Author => "authors",
            EntityKind::Tag => "tags",
            EntityKind::Category => "categories",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a taxonomy term embedded in an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<TermRef>,
    #[serde(default)]
    pub tags: Vec<TermRef>,
    #[serde(default)]
    pub author: Option<TermRef>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Article {
    /// `/article/{id}/{slug}` with the slug ASCII-lowercased, or `/article/{id}`
    /// when the CMS has no slug. Matches what path normalization produces.
    pub fn canonical_path(&self) -> String {
        if self.slug.is_empty() {
            format!("/article/{}", self.id)
        } else {
            format!("/article/{}/{}", self.id, self.slug.to_ascii_lowercase())
        }
    }
}

fn term_path(section: &str, slug: &str) -> String {
    format!("/{}/{}", section, slug.to_ascii_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

/// One page of an article listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticlePage {
    #[serde(default)]
    pub items: Vec<Article>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl ArticlePage {
    pub fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            total_pages: page.saturating_sub(1),
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Filters for the upstream article listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl ArticleQuery {
    pub fn latest() -> Self {
        Self::default()
    }

    pub fn featured() -> Self {
        Self {
            featured: Some(true),
            ..Default::default()
        }
    }

    pub fn category(slug: impl Into<String>) -> Self {
        Self {
            category: Some(slug.into()),
            ..Default::default()
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

/// What the redirect middleware remembers about an entity that exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub kind: EntityKind,
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub canonical_path: String,
}

impl From<&Article> for EntitySummary {
    fn from(article: &Article) -> Self {
        Self {
            kind: EntityKind::Article,
            id: article.id,
            slug: article.slug.clone(),
            name: article.title.clone(),
            canonical_path: article.canonical_path(),
        }
    }
}

impl From<&Author> for EntitySummary {
    fn from(author: &Author) -> Self {
        Self {
            kind: EntityKind::Author,
            id: author.id,
            slug: author.slug.clone(),
            name: author.name.clone(),
            canonical_path: term_path("author", &author.slug),
        }
    }
}

impl From<&Tag> for EntitySummary {
    fn from(tag: &Tag) -> Self {
        Self {
            kind: EntityKind::Tag,
            id: tag.id,
            slug: tag.slug.clone(),
            name: tag.name.clone(),
            canonical_path: term_path("tag", &tag.slug),
        }
    }
}

impl From<&Category> for EntitySummary {
    fn from(category: &Category) -> Self {
        Self {
            kind: EntityKind::Category,
            id: category.id,
            slug: category.slug.clone(),
            name: category.name.clone(),
            canonical_path: term_path("category", &category.slug),
        }
    }
}
