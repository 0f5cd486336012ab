//! Home page section layout.

use crate::cms::ArticleQuery;
use crate::config::HomeConfig;
use serde::{Deserialize, Serialize};

/// One block of the home page and the listing that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub key: String,
    pub title: String,
    pub query: ArticleQuery,
    /// Articles wanted in this section; also the upper bound.
    pub min_count: usize,
    /// Pages fetched at most while backfilling.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_pages() -> u32 {
    HomeConfig::MAX_PAGES
}

impl SectionSpec {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        query: ArticleQuery,
        min_count: usize,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            query,
            min_count,
            max_pages: HomeConfig::MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }
}

/// Ordered sections; earlier sections claim shared articles first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeLayout {
    pub name: String,
    pub sections: Vec<SectionSpec>,
}

impl HomeLayout {
    pub fn new(name: impl Into<String>, sections: Vec<SectionSpec>) -> Self {
        Self {
            name: name.into(),
            sections,
        }
    }
}

impl Default for HomeLayout {
    fn default() -> Self {
        let mut sections = vec![
            SectionSpec::new("hero", "Main story", ArticleQuery::featured(), 1),
            SectionSpec::new("top", "Top stories", ArticleQuery::featured(), 4),
            SectionSpec::new("latest", "Latest", ArticleQuery::latest(), 6),
        ];
        for (slug, title) in [
            ("news", "News"),
            ("israel", "Israel"),
            ("world", "World"),
            ("opinion", "Opinion"),
        ] {
            sections.push(SectionSpec::new(slug, title, ArticleQuery::category(slug), 4));
        }
        Self::new("home", sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_keys_unique() {
        let layout = HomeLayout::default();
        let mut keys: Vec<_> = layout.sections.iter().map(|s| s.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), layout.sections.len());
        assert_eq!(layout.sections[0].key, "hero");
    }

    #[test]
    fn test_section_spec_deserializes_with_default_pages() {
        let spec: SectionSpec = serde_json::from_str(
            r#"{"key": "sport", "title": "Sport", "query": {"category": "sport"}, "min_count": 3}"#,
        )
        .unwrap();
        assert_eq!(spec.max_pages, HomeConfig::MAX_PAGES);
        assert_eq!(spec.query.category.as_deref(), Some("sport"));
    }

    #[test]
    fn test_max_pages_at_least_one() {
        let spec = SectionSpec::new("x", "X", ArticleQuery::latest(), 1).with_max_pages(0);
        assert_eq!(spec.max_pages, 1);
    }
}
