//! In-memory TTL cache (thread-safe).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Expiry is checked lazily on read; nothing sweeps the map in the background.
//!
//! The clock is `tokio::time::Instant`, so a paused test runtime controls it.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with the instant it was stored.
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        CacheEntry {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, duration: Duration) -> bool {
        self.stored_at.elapsed() < duration
    }
}

/// Key→value store with a fixed per-instance time-to-live.
///
/// An entry is valid iff `now - stored_at < duration`. Stale entries are
/// removed the next time they are read.
///
/// Cloning is cheap and clones share the same store.
///
/// # Example
///
/// ```
/// use exam_dashboard_kit::cache::TtlCache;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = TtlCache::new(Duration::from_secs(300));
///
/// cache.set("stats-org1", 42u32);
/// assert_eq!(cache.get("stats-org1"), Some(42));
///
/// cache.set("exams-org1-page1", 7u32);
/// assert_eq!(cache.invalidate("exams"), 1);
/// assert_eq!(cache.get("exams-org1-page1"), None);
/// # }
/// ```
#[derive(Clone)]
pub struct TtlCache<V> {
    store: Arc<DashMap<String, CacheEntry<V>>>,
    duration: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache whose entries live for `duration`.
    pub fn new(duration: Duration) -> Self {
        TtlCache {
            store: Arc::new(DashMap::new()),
            duration,
        }
    }

    /// Time-to-live applied to every entry.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Return the stored value if present and still fresh.
    ///
    /// A stale entry is deleted and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.store.get(key) {
            if entry.is_fresh(self.duration) {
                debug!("✓ TtlCache GET {} -> HIT", key);
                return Some(entry.value.clone());
            }
            drop(entry);
            // A writer may have replaced the entry since the check.
            self.store
                .remove_if(key, |_, entry| !entry.is_fresh(self.duration));
            debug!("✓ TtlCache GET {} -> EXPIRED", key);
            return None;
        }

        debug!("✓ TtlCache GET {} -> MISS", key);
        None
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: &str, value: V) {
        self.store.insert(key.to_string(), CacheEntry::new(value));
        debug!("✓ TtlCache SET {} (TTL: {:?})", key, self.duration);
    }

    /// Remove a single key.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.store.remove(key).is_some();
        debug!("✓ TtlCache DELETE {}", key);
        removed
    }

    /// Remove every entry whose key contains `pattern`.
    ///
    /// Matching is a plain substring test, not anchored, so a broad pattern
    /// removes more than strictly necessary. Related keys are never missed.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let before = self.store.len();
        self.store.retain(|key, _| !key.contains(pattern));
        let removed = before.saturating_sub(self.store.len());
        debug!("✓ TtlCache INVALIDATE '{}' -> {} removed", pattern, removed);
        removed
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.store.clear();
        warn!("⚠ TtlCache CLEAR executed - all cache cleared!");
    }

    /// Whether an entry exists for `key`, fresh or not.
    ///
    /// Unlike [`get`](Self::get) this never removes anything.
    pub fn contains_key(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    /// Snapshot of the stored keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.store.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of stored entries, including stale ones not yet read.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Entry statistics.
    pub fn stats(&self) -> CacheStats {
        let expired_entries = self
            .store
            .iter()
            .filter(|entry| !entry.is_fresh(self.duration))
            .count();

        CacheStats {
            total_entries: self.store.len(),
            expired_entries,
        }
    }

    /// Print cache statistics to debug log.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Cache Stats: {} entries ({} expired)",
            stats.total_entries, stats.expired_entries
        );
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
}
