//! In-memory TTL cache with sweep-based cleanup.
//!
//! Expired entries are dropped lazily on read and by a linear sweep that runs
//! at most once per `sweep_interval`, piggybacking on inserts. When the cache
//! is full, the oldest `evict_fraction` of capacity is discarded (by insertion
//! time, not access time).

use crate::config::CacheSettings;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TtlCacheConfig {
    /// TTL used by [`TtlCache::insert`].
    pub default_ttl: Duration,
    /// Hard cap on stored entries.
    pub max_entries: usize,
    /// Minimum time between two opportunistic sweeps.
    pub sweep_interval: Duration,
    /// Share of `max_entries` evicted when the cache is full.
    pub evict_fraction: f64,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: CacheSettings::POSITIVE_TTL,
            max_entries: CacheSettings::MAX_ENTRIES,
            sweep_interval: CacheSettings::SWEEP_INTERVAL,
            evict_fraction: CacheSettings::EVICT_FRACTION,
        }
    }
}

impl TtlCacheConfig {
    /// Number of entries dropped per eviction round (at least one).
    pub fn evict_count(&self) -> usize {
        let fraction = self.evict_fraction.clamp(0.0, 1.0);
        ((self.max_entries as f64 * fraction).ceil() as usize).max(1)
    }
}

/// Counters describing cache behaviour since creation (or the last `clear`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub evicted: u64,
    pub sweeps: u64,
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Store<K, V> {
    entries: HashMap<K, Entry<V>>,
    last_sweep: Instant,
    stats: CacheStats,
}

impl<K: Eq + Hash + Clone, V> Store<K, V> {
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        self.last_sweep = now;
        self.stats.sweeps += 1;
        self.stats.expired += removed as u64;
        removed
    }

    fn evict_oldest(&mut self, count: usize) -> usize {
        let mut by_age: Vec<(Instant, K)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.inserted_at, key.clone()))
            .collect();
        by_age.sort_by_key(|(inserted_at, _)| *inserted_at);

        let mut evicted = 0;
        for (_, key) in by_age.into_iter().take(count) {
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }
        self.stats.evicted += evicted as u64;
        evicted
    }
}

/// Thread-safe TTL cache.
pub struct TtlCache<K, V> {
    config: TtlCacheConfig,
    store: Mutex<Store<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(config: TtlCacheConfig) -> Self {
        Self {
            store: Mutex::new(Store {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
                stats: CacheStats::default(),
            }),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(TtlCacheConfig::default())
    }

    pub fn config(&self) -> &TtlCacheConfig {
        &self.config
    }

    /// Return a live value, dropping it if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut store = self.lock();

        let expired = match store.entries.get(key) {
            None => {
                store.stats.misses += 1;
                return None;
            }
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                store.stats.hits += 1;
                return Some(value);
            }
            Some(_) => true,
        };

        if expired {
            store.entries.remove(key);
            store.stats.expired += 1;
            store.stats.misses += 1;
        }
        None
    }

    /// Whether a live entry exists. Does not touch hit/miss counters.
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.config.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut store = self.lock();

        if !store.entries.contains_key(&key) {
            if now.duration_since(store.last_sweep) >= self.config.sweep_interval {
                let removed = store.sweep(now);
                if removed > 0 {
                    debug!("TTL sweep removed {} expired entries", removed);
                }
            }

            if store.entries.len() >= self.config.max_entries {
                store.sweep(now);
            }
            if store.entries.len() >= self.config.max_entries {
                let evicted = store.evict_oldest(self.config.evict_count());
                debug!(
                    "Cache full ({} entries), evicted {} oldest",
                    self.config.max_entries, evicted
                );
            }
        }

        store.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                expires_at: now + ttl,
            },
        );
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().entries.remove(key).map(|entry| entry.value)
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut store = self.lock();
        store.entries.clear();
        store.stats = CacheStats::default();
        store.last_sweep = Instant::now();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry now, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        self.lock().sweep(Instant::now())
    }

    pub fn stats(&self) -> CacheStats {
        let store = self.lock();
        CacheStats {
            entries: store.entries.len(),
            ..store.stats.clone()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store<K, V>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
