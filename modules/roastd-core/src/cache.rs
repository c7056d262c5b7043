//! In-memory response cache with TTL expiry and LRU-ish eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{CACHE_CLEANUP_INTERVAL_SECONDS, CACHE_TTL_SECONDS, MAX_CACHE_SIZE};
use crate::types::ReviewContext;

struct Entry<V> {
    value: V,
    inserted: Instant,
    access_count: u64,
}

struct CacheInner<V> {
    entries: HashMap<String, Entry<V>>,
    last_cleanup: Instant,
    hits: u64,
    misses: u64,
}

/// Async-safe cache keyed by string, bounded in both age and size.
///
/// Expired entries are dropped on read and during a periodic sweep piggybacked
/// on writes. When the cache is full, the least-used (ties broken by oldest)
/// entry makes room.
pub struct TtlCache<V> {
    inner: Mutex<CacheInner<V>>,
    ttl: Duration,
    max_size: usize,
    cleanup_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_limits(
            Duration::from_secs(CACHE_TTL_SECONDS),
            MAX_CACHE_SIZE,
            Duration::from_secs(CACHE_CLEANUP_INTERVAL_SECONDS),
        )
    }

    pub fn with_limits(ttl: Duration, max_size: usize, cleanup_interval: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                last_cleanup: Instant::now(),
                hits: 0,
                misses: 0,
            }),
            ttl,
            max_size,
            cleanup_interval,
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().await;
        let expired = match inner.entries.get_mut(key) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => {
                entry.access_count += 1;
                let value = entry.value.clone();
                inner.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(key);
        }
        inner.misses += 1;
        None
    }

    pub async fn set(&self, key: String, value: V) {
        let mut inner = self.inner.lock().await;

        if inner.last_cleanup.elapsed() >= self.cleanup_interval {
            let ttl = self.ttl;
            inner.entries.retain(|_, e| e.inserted.elapsed() < ttl);
            inner.last_cleanup = Instant::now();
        }

        if inner.entries.len() >= self.max_size && !inner.entries.contains_key(&key) {
            let evict = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.access_count, e.inserted))
                .map(|(k, _)| k.clone());
            if let Some(evict) = evict {
                debug!(key = %evict, "evicting cache entry");
                inner.entries.remove(&evict);
            }
        }

        inner.entries.insert(
            key,
            Entry {
                value,
                inserted: Instant::now(),
                access_count: 0,
            },
        );
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable cache key for a roast response: the normalized anime name plus the
/// serialized review context, hashed so key length stays constant.
pub fn response_cache_key(anime_name: &str, context: Option<&ReviewContext>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(anime_name.to_lowercase().as_bytes());
    if let Some(ctx) = context {
        if let Ok(json) = serde_json::to_string(ctx) {
            hasher.update(json.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}
