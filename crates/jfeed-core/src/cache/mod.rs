//! In-memory caches used by the gateway.
//!
//! - [`TtlCache`]: generic TTL map with sweep cleanup and oldest-first eviction
//! - [`LookupCache`]: existence lookups for authors, tags, categories and articles

mod lookup;
mod ttl;

pub use lookup::{Lookup, LookupCache, LookupKey};
pub use ttl::{CacheStats, TtlCache, TtlCacheConfig};
