//! Existence lookups memoized for the redirect middleware.

use super::ttl::{CacheStats, TtlCache, TtlCacheConfig};
use crate::cms::{EntityKind, EntitySummary};
use crate::config::CacheSettings;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub kind: EntityKind,
    pub key: String,
}

impl LookupKey {
    pub fn new(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

/// Cached answer to "does this entity exist?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(EntitySummary),
    Missing,
}

impl Lookup {
    pub fn summary(&self) -> Option<&EntitySummary> {
        match self {
            Lookup::Found(summary) => Some(summary),
            Lookup::Missing => None,
        }
    }
}

impl From<Option<EntitySummary>> for Lookup {
    fn from(value: Option<EntitySummary>) -> Self {
        value.map_or(Lookup::Missing, Lookup::Found)
    }
}

/// TTL cache of existence lookups with separate TTLs for hits and misses.
pub struct LookupCache {
    inner: TtlCache<LookupKey, Lookup>,
    positive_ttl: Duration,
    negative_ttl: Duration,
}

impl LookupCache {
    pub fn new(max_entries: usize, positive_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            inner: TtlCache::new(TtlCacheConfig {
                default_ttl: positive_ttl,
                max_entries,
                ..Default::default()
            }),
            positive_ttl,
            negative_ttl,
        }
    }

    pub fn get(&self, kind: EntityKind, key: &str) -> Option<Lookup> {
        self.inner.get(&LookupKey::new(kind, key))
    }

    pub fn store(&self, kind: EntityKind, key: &str, lookup: Lookup) {
        let ttl = match lookup {
            Lookup::Found(_) => self.positive_ttl,
            Lookup::Missing => self.negative_ttl,
        };
        self.inner.insert_with_ttl(LookupKey::new(kind, key), lookup, ttl);
    }

    pub fn invalidate(&self, kind: EntityKind, key: &str) -> bool {
        self.inner.remove(&LookupKey::new(kind, key)).is_some()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn cleanup_expired(&self) -> usize {
        self.inner.cleanup_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(
            CacheSettings::MAX_ENTRIES,
            CacheSettings::POSITIVE_TTL,
            CacheSettings::NEGATIVE_TTL,
        )
    }
}
