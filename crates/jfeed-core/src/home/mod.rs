//! Home page aggregation.

mod aggregator;
mod layout;

pub use aggregator::{HomeAggregator, HomeFeed, HomeSection};
pub use layout::{HomeLayout, SectionSpec};
