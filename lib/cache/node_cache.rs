//! [`TtlLruCache`]: a map bounded both by entry count and by entry age.
//!
//! Recency is tracked by a [`LinkedHashMap`]: the front is the least recently
//! used entry, and a hit moves the entry to the back. Expiry is checked
//! lazily on read; there is no background sweeper.

use std::hash::Hash;
use std::time::Duration;

use hashlink::LinkedHashMap;
use tokio::time::Instant;
use tracing::trace;

use crate::sync::{self, Mutex};

/// Default maximum number of cached entries.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default lifetime of a cached entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

/// Sizing for a [`TtlLruCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries. Zero disables caching.
    pub capacity: usize,
    /// How long an entry stays valid after insertion. Zero disables caching.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// A configuration that caches nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            capacity: 0,
            ttl: Duration::ZERO,
        }
    }

    /// Whether a cache built from this configuration would ever hold anything.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.capacity > 0 && !self.ttl.is_zero()
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    /// `None` when the TTL reaches past the range of the clock.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A thread-safe LRU map whose entries also expire a fixed time after insertion.
///
/// Entry lifetime is measured with [`tokio::time::Instant`], so tests can
/// drive expiry with a paused clock.
#[derive(Debug)]
pub struct TtlLruCache<K, V> {
    capacity: usize,
    ttl: Duration,
    entries: Mutex<LinkedHashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlLruCache<K, V> {
    /// Build a cache. Returns `None` when `config` disables caching.
    #[must_use]
    pub fn new(config: CacheConfig) -> Option<Self> {
        config.is_enabled().then(|| Self {
            capacity: config.capacity,
            ttl: config.ttl,
            entries: Mutex::new(LinkedHashMap::new()),
        })
    }

    /// Look up `key`. A hit marks the entry most recently used; an expired
    /// entry is dropped and reported as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = sync::lock(&self.entries);
        let entry = entries.remove(key)?;
        if entry.is_expired(Instant::now()) {
            trace!("cache entry expired");
            return None;
        }
        let value = entry.value.clone();
        entries.insert(key.clone(), entry);
        Some(value)
    }

    /// Insert or replace `key`, resetting its lifetime and marking it most
    /// recently used. Evicts least recently used entries beyond capacity.
    pub fn insert(&self, key: K, value: V) {
        let entry = Entry {
            value,
            expires_at: Instant::now().checked_add(self.ttl),
        };
        let mut entries = sync::lock(&self.entries);
        entries.remove(&key);
        entries.insert(key, entry);
        while entries.len() > self.capacity {
            if entries.pop_front().is_none() {
                break;
            }
            trace!("evicted least recently used cache entry");
        }
    }

    /// Number of stored entries, including expired ones not yet observed.
    #[must_use]
    pub fn len(&self) -> usize {
        sync::lock(&self.entries).len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
