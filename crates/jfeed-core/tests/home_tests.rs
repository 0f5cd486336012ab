//! Home feed assembly against an in-memory CMS.

mod common;

use common::{article, featured, in_category, FakeCms};
use jfeed_core::{
    ArticleQuery, GatewayConfig, HomeAggregator, HomeFeed, HomeLayout, JfeedApi, SectionSpec,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn ids(feed: &HomeFeed, key: &str) -> Vec<u64> {
    feed.section(key)
        .unwrap()
        .articles
        .iter()
        .map(|a| a.id)
        .collect()
}

/// Articles 1..=10, the first three featured.
fn newsroom() -> FakeCms {
    FakeCms::new().with_articles(
        (1..=10).map(|id| if id <= 3 { featured(id) } else { article(id) }),
    )
}

#[tokio::test]
async fn test_sections_never_repeat_articles() {
    let cms = Arc::new(newsroom());
    let aggregator = HomeAggregator::new(cms.clone());
    let layout = HomeLayout::new(
        "test",
        vec![
            SectionSpec::new("hero", "Hero", ArticleQuery::featured(), 1),
            SectionSpec::new("top", "Top", ArticleQuery::featured(), 2),
            SectionSpec::new("latest", "Latest", ArticleQuery::latest(), 4),
        ],
    );

    let feed = aggregator.build(&layout).await;

    assert_eq!(ids(&feed, "hero"), vec![1]);
    assert_eq!(ids(&feed, "top"), vec![2, 3]);
    assert_eq!(ids(&feed, "latest"), vec![4, 5, 6, 7]);

    let mut seen = HashSet::new();
    for section in &feed.sections {
        for article in &section.articles {
            assert!(seen.insert(article.id), "article {} repeated", article.id);
        }
    }
}

#[tokio::test]
async fn test_sections_keep_layout_order() {
    let cms = Arc::new(newsroom());
    let aggregator = HomeAggregator::new(cms);
    let layout = HomeLayout::new(
        "test",
        vec![
            SectionSpec::new("latest", "Latest", ArticleQuery::latest(), 2),
            SectionSpec::new("top", "Top", ArticleQuery::featured(), 2),
        ],
    );

    let feed = aggregator.build(&layout).await;
    let keys: Vec<_> = feed.sections.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["latest", "top"]);
    // Latest claimed 1 and 2 first.
    assert_eq!(ids(&feed, "latest"), vec![1, 2]);
    assert_eq!(ids(&feed, "top"), vec![3]);
}

#[tokio::test]
async fn test_backfill_stops_at_max_pages() {
    let cms = Arc::new(newsroom());
    let aggregator = HomeAggregator::new(cms.clone());
    let layout = HomeLayout::new(
        "test",
        vec![
            SectionSpec::new("a", "A", ArticleQuery::latest(), 4),
            SectionSpec::new("b", "B", ArticleQuery::latest(), 4).with_max_pages(1),
        ],
    );

    let feed = aggregator.build(&layout).await;
    assert_eq!(ids(&feed, "a"), vec![1, 2, 3, 4]);
    assert!(ids(&feed, "b").is_empty());
    assert!(cms.listing_calls().iter().all(|(_, page)| *page == 1));
}

#[tokio::test]
async fn test_backfill_follows_later_pages() {
    let cms = Arc::new(newsroom());
    let aggregator = HomeAggregator::new(cms.clone());
    let layout = HomeLayout::new(
        "test",
        vec![
            SectionSpec::new("a", "A", ArticleQuery::latest(), 4),
            SectionSpec::new("b", "B", ArticleQuery::latest(), 4).with_max_pages(2),
        ],
    );

    let feed = aggregator.build(&layout).await;
    assert_eq!(ids(&feed, "b"), vec![5, 6, 7, 8]);
    assert!(cms.listing_calls().contains(&(ArticleQuery::latest(), 2)));
}

#[tokio::test]
async fn test_backfill_stops_at_last_page() {
    let cms = Arc::new(FakeCms::new().with_articles((1..=3).map(article)));
    let aggregator = HomeAggregator::new(cms.clone());
    let layout = HomeLayout::new(
        "test",
        vec![SectionSpec::new("latest", "Latest", ArticleQuery::latest(), 10)],
    );

    let feed = aggregator.build(&layout).await;
    assert_eq!(ids(&feed, "latest"), vec![1, 2, 3]);
    assert_eq!(cms.listing_calls().len(), 1);
}

#[tokio::test]
async fn test_failed_section_is_left_empty() {
    let cms = Arc::new(
        FakeCms::new()
            .with_articles((1..=4).map(|id| in_category(article(id), "news")))
            .with_article(in_category(article(5), "world")),
    );
    cms.fail_listing(ArticleQuery::category("world"));

    let aggregator = HomeAggregator::new(cms.clone());
    let layout = HomeLayout::new(
        "test",
        vec![
            SectionSpec::new("world", "World", ArticleQuery::category("world"), 2),
            SectionSpec::new("news", "News", ArticleQuery::category("news"), 2),
        ],
    );

    let feed = aggregator.build(&layout).await;
    assert_eq!(feed.sections.len(), 2);
    assert!(ids(&feed, "world").is_empty());
    assert_eq!(ids(&feed, "news"), vec![1, 2]);
}

#[tokio::test]
async fn test_unavailable_cms_yields_empty_feed() {
    let cms = Arc::new(newsroom());
    cms.set_failing(true);

    let feed = HomeAggregator::new(cms).build(&HomeLayout::default()).await;
    assert_eq!(feed.sections.len(), HomeLayout::default().sections.len());
    assert_eq!(feed.article_count(), 0);
}

#[tokio::test]
async fn test_zero_count_section_skips_fetch() {
    let cms = Arc::new(newsroom());
    let aggregator = HomeAggregator::new(cms.clone());
    let layout = HomeLayout::new(
        "test",
        vec![SectionSpec::new("empty", "Empty", ArticleQuery::latest(), 0)],
    );

    let feed = aggregator.build(&layout).await;
    assert!(ids(&feed, "empty").is_empty());
    assert!(cms.listing_calls().is_empty());
}

#[tokio::test]
async fn test_feed_is_cached_until_invalidated() {
    let cms = Arc::new(newsroom());
    let layout = HomeLayout::new(
        "test",
        vec![SectionSpec::new("latest", "Latest", ArticleQuery::latest(), 2)],
    );
    let api = JfeedApi::builder(GatewayConfig::default())
        .with_source(cms.clone())
        .with_layout(layout)
        .build()
        .unwrap();

    let first = api.home_feed().await;
    let second = api.home_feed().await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cms.listing_calls().len(), 1);

    api.clear_caches();
    api.home_feed().await;
    assert_eq!(cms.listing_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_share_one_build() {
    let cms = Arc::new(newsroom().with_latency(Duration::from_millis(200)));
    let layout = HomeLayout::new(
        "test",
        vec![SectionSpec::new("latest", "Latest", ArticleQuery::latest(), 2)],
    );
    let api = JfeedApi::builder(GatewayConfig::default())
        .with_source(cms.clone())
        .with_layout(layout)
        .build()
        .unwrap();

    let feeds = futures::future::join_all((0..8).map(|_| api.home_feed())).await;

    assert_eq!(cms.listing_calls().len(), 1);
    assert!(feeds.iter().all(|feed| Arc::ptr_eq(feed, &feeds[0])));
    assert_eq!(ids(&feeds[0], "latest"), vec![1, 2]);
}
