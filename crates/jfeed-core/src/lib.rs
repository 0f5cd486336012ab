//! jfeed core - routing, caching and aggregation logic for the jfeed news gateway.
//!
//! The site itself is rendered elsewhere; this crate answers the questions a
//! rendering front end asks before it renders:
//! - should this path be redirected or 404'd (authors, tags, categories,
//!   articles and archive dates are checked against the CMS, with a TTL cache
//!   in front)?
//! - what goes on the home page (several overlapping CMS listings merged
//!   without duplicates)?
//!
//! # Example
//!
//! ```rust,ignore
//! use jfeed_core::{GatewayConfig, JfeedApi};
//!
//! #[tokio::main]
//! async fn main() -> jfeed_core::Result<()> {
//!     let api = JfeedApi::new(GatewayConfig::default())?;
//!
//!     let decision = api.resolve("/tag/elections", None).await;
//!     println!("{decision:?}");
//!
//!     let feed = api.home_feed().await;
//!     println!("{} articles on the home page", feed.article_count());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cms;
pub mod config;
pub mod error;
pub mod home;
pub mod network;
pub mod routing;

mod api;

pub use api::{JfeedApi, JfeedApiBuilder};
pub use cache::{CacheStats, Lookup, LookupCache, TtlCache, TtlCacheConfig};
pub use cms::{
    Article, ArticlePage, ArticleQuery, Author, Category, CmsClient, CmsSource, DynCmsSource,
    EntityKind, EntitySummary, Tag, TermRef,
};
pub use config::GatewayConfig;
pub use error::{JfeedError, Result};
pub use home::{HomeAggregator, HomeFeed, HomeLayout, HomeSection, SectionSpec};
pub use network::{CircuitBreakerConfig, CircuitBreakerStats, CircuitState, RetryConfig};
pub use routing::{classify, RouteDecision, RoutePath, Resolver};
