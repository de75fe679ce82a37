//! Bounded in-memory cache with per-entry time-to-live.
//!
//! Every entry carries the instant it was inserted or last read. An entry
//! older than the cache's time-to-live is treated as absent: it is dropped
//! lazily when looked up, or in bulk by [`ExpiringCache::sweep`]. When the
//! cache grows past its capacity the least recently touched entry is evicted.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use slp_graph_search::cache::ExpiringCache;
//!
//! let cache: ExpiringCache<String, u32> =
//!     ExpiringCache::new("example", 2, Duration::from_secs(60));
//! cache.put("a".to_string(), 1);
//! assert_eq!(cache.get("a"), Some(1));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::metrics::CacheMetrics;

/// Time source for entry expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

struct Entry<V> {
    value: V,
    touched: Instant,
}

/// Bounded key-value store whose entries expire a fixed time after their
/// last insert or read.
pub struct ExpiringCache<K: Hash + Eq, V> {
    name: String,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    /// Recency order doubles as age order: every touch promotes the entry.
    entries: Mutex<LruCache<K, Entry<V>>>,
    metrics: CacheMetrics,
}

impl<K: Hash + Eq, V> fmt::Debug for ExpiringCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.entries.lock().len())
            .finish()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> ExpiringCache<K, V> {
    pub fn new(name: impl Into<String>, capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(name, capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        name: impl Into<String>,
        capacity: usize,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let capacity = capacity.max(1);
        // `LruCache::new` preallocates the full capacity; grow on demand instead.
        let mut entries = LruCache::unbounded();
        entries.resize(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN));
        Self {
            name: name.into(),
            capacity,
            ttl,
            clock,
            entries: Mutex::new(entries),
            metrics: CacheMetrics::default(),
        }
    }

    /// Look up a live entry and refresh its time-to-live.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let expired = match entries.peek(key) {
            Some(entry) => self.is_expired(entry.touched, now),
            None => {
                self.metrics.record_miss();
                return None;
            }
        };
        if expired {
            entries.pop(key);
            self.metrics.record_expired(1);
            self.metrics.record_miss();
            return None;
        }

        let entry = entries.get_mut(key)?;
        entry.touched = now;
        self.metrics.record_hit();
        Some(entry.value.clone())
    }

    /// Whether a live entry exists. Does not refresh it.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.entries
            .lock()
            .peek(key)
            .is_some_and(|entry| !self.is_expired(entry.touched, now))
    }

    /// Insert or replace an entry, evicting the least recently touched
    /// entry when full.
    pub fn put(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let replacing = entries.contains(&key);
        let displaced = entries.push(
            key,
            Entry {
                value,
                touched: now,
            },
        );
        self.metrics.record_insert();
        if displaced.is_some() && !replacing {
            self.metrics.record_evicted();
        }
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.lock().pop(key).map(|entry| entry.value)
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        // Least recently touched first, so stop at the first live entry.
        let expired: Vec<K> = entries
            .iter()
            .rev()
            .take_while(|(_, entry)| self.is_expired(entry.touched, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }

        self.metrics.record_expired(expired.len() as u64);
        expired.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn is_expired(&self, touched: Instant, now: Instant) -> bool {
        now.saturating_duration_since(touched) >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(1800);

    fn cache_with_clock(capacity: usize) -> (ExpiringCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ExpiringCache::with_clock("test", capacity, TTL, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock(10);
        cache.put("a".to_string(), 1);

        clock.advance(Duration::from_secs(1799));
        assert!(cache.contains_key("a"));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());

        let snap = cache.metrics().snapshot();
        assert_eq!(snap.expired, 1);
        assert_eq!(snap.misses, 1);
    }

    #[test]
    fn test_read_refreshes_ttl() {
        let (cache, clock) = cache_with_clock(10);
        cache.put("a".to_string(), 1);

        clock.advance(Duration::from_secs(1000));
        assert_eq!(cache.get("a"), Some(1));

        clock.advance(Duration::from_secs(1000));
        assert_eq!(cache.get("a"), Some(1));

        clock.advance(TTL);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_capacity_evicts_least_recently_touched() {
        let (cache, _clock) = cache_with_clock(2);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        assert_eq!(cache.get("a"), Some(1));

        cache.put("c".to_string(), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.metrics().snapshot().evicted, 1);
    }

    #[test]
    fn test_put_replaces_without_growing() {
        let (cache, _clock) = cache_with_clock(2);
        cache.put("a".to_string(), 1);
        cache.put("a".to_string(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_sweep_drops_only_expired() {
        let (cache, clock) = cache_with_clock(10);
        cache.put("old".to_string(), 1);
        clock.advance(Duration::from_secs(1000));
        cache.put("new".to_string(), 2);
        clock.advance(Duration::from_secs(900));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new"), Some(2));
        assert_eq!(cache.remove("new"), Some(2));
        assert_eq!(cache.sweep(), 0);
    }

    #[test]
    fn test_sweep_respects_read_refresh() {
        let (cache, clock) = cache_with_clock(10);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        clock.advance(Duration::from_secs(1000));
        assert_eq!(cache.get("a"), Some(1));
        clock.advance(Duration::from_secs(900));

        assert_eq!(cache.sweep(), 1);
        assert!(cache.contains_key("a"));
        assert!(!cache.contains_key("b"));
        assert_eq!(cache.metrics().snapshot().expired, 1);
    }
}
