//! Read-through expander - the cache lookup and fallback logic shared by
//! every read of the data-access layer.

use crate::cache::TtlCache;
use crate::error::Result;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::strategy::CacheStrategy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};

/// Core cache expander - handles cache lookup and fallback logic.
///
/// Payloads are stored as `serde_json::Value`, the same shape the remote API
/// returns them in, and decoded into the caller's type on every hit.
///
/// # Example
///
/// ```
/// use exam_dashboard_kit::{CacheExpander, CacheStrategy};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> exam_dashboard_kit::Result<()> {
/// let expander = CacheExpander::new(Duration::from_secs(300));
///
/// let total: u64 = expander
///     .fetch("stats-org1", CacheStrategy::Refresh, || async { Ok(12) })
///     .await?;
/// assert_eq!(total, 12);
///
/// // Served from cache: the loader is not called again.
/// let total: u64 = expander
///     .fetch("stats-org1", CacheStrategy::Refresh, || async { Ok(99) })
///     .await?;
/// assert_eq!(total, 12);
/// # Ok(())
/// # }
/// ```
pub struct CacheExpander {
    cache: TtlCache<Value>,
    metrics: Box<dyn CacheMetrics>,
}

impl CacheExpander {
    /// Create a new expander whose entries live for `duration`.
    pub fn new(duration: Duration) -> Self {
        CacheExpander {
            cache: TtlCache::new(duration),
            metrics: Box::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Load `key` according to `strategy`, calling `loader` on a miss.
    ///
    /// # Errors
    ///
    /// Returns whatever `loader` returns, unchanged. Nothing is stored when
    /// the loader fails. A cached value that no longer decodes into `T` is
    /// evicted and reloaded instead of being reported.
    pub async fn fetch<T, F, Fut>(&self, key: &str, strategy: CacheStrategy, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timer = Instant::now();

        debug!("» Cache operation for key: {} (strategy: {})", key, strategy);

        match strategy {
            CacheStrategy::Refresh => self.strategy_refresh(key, loader, timer).await,
            CacheStrategy::Bypass => self.strategy_bypass(key, loader, timer).await,
        }
    }

    /// Refresh strategy: Try cache, fallback to the API on miss.
    async fn strategy_refresh<T, F, Fut>(&self, key: &str, loader: F, timer: Instant) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.cache.get(key) {
            match serde_json::from_value::<T>(value) {
                Ok(entity) => {
                    self.metrics.record_hit(key, timer.elapsed());
                    return Ok(entity);
                }
                Err(e) => {
                    warn!("Evicting undecodable cache entry {}: {}", key, e);
                    self.cache.delete(key);
                }
            }
        }

        debug!("Cache miss, falling back to remote API");

        match loader().await {
            Ok(entity) => {
                // A payload that cannot be re-encoded is still returned, just not cached.
                match serde_json::to_value(&entity) {
                    Ok(value) => self.cache.set(key, value),
                    Err(e) => warn!("Not caching {}: {}", key, e),
                }
                self.metrics.record_miss(key, timer.elapsed());
                Ok(entity)
            }
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                Err(e)
            }
        }
    }

    /// Bypass strategy: Skip cache, always hit the API, store nothing.
    async fn strategy_bypass<T, F, Fut>(&self, key: &str, loader: F, timer: Instant) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!("Bypassing cache entirely for {}", key);

        match loader().await {
            Ok(entity) => {
                self.metrics.record_bypass(key, timer.elapsed());
                Ok(entity)
            }
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                Err(e)
            }
        }
    }

    /// Remove every entry whose key contains `pattern`.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let removed = self.cache.invalidate(pattern);
        self.metrics.record_invalidate(pattern, removed);
        removed
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get cache reference (for inspection).
    pub fn cache(&self) -> &TtlCache<Value> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct TestEntity {
        id: String,
        value: String,
    }

    fn entity(value: &str) -> TestEntity {
        TestEntity {
            id: "1".to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_refresh_miss_then_hit() {
        let expander = CacheExpander::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let fetched: TestEntity = expander
                .fetch("test-1", CacheStrategy::Refresh, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(entity("remote"))
                })
                .await
                .expect("Failed to fetch");
            assert_eq!(fetched.value, "remote");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(expander.cache().contains_key("test-1"));
    }

    #[tokio::test]
    async fn test_refresh_error_is_not_cached() {
        let expander = CacheExpander::new(Duration::from_secs(60));

        let result: Result<TestEntity> = expander
            .fetch("test-1", CacheStrategy::Refresh, || async {
                Err(Error::Http {
                    status: 503,
                    body: "down".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(Error::Http { status: 503, .. })));
        assert!(expander.cache().is_empty());
    }

    #[tokio::test]
    async fn test_bypass_never_touches_cache() {
        let expander = CacheExpander::new(Duration::from_secs(60));
        expander
            .cache()
            .set("test-1", serde_json::to_value(entity("cached")).expect("encode"));

        let fetched: TestEntity = expander
            .fetch("test-1", CacheStrategy::Bypass, || async { Ok(entity("remote")) })
            .await
            .expect("Failed to fetch");
        assert_eq!(fetched.value, "remote");

        let fetched: TestEntity = expander
            .fetch("test-2", CacheStrategy::Bypass, || async { Ok(entity("remote")) })
            .await
            .expect("Failed to fetch");
        assert_eq!(fetched.value, "remote");

        // Existing entry untouched, nothing new stored.
        assert_eq!(expander.cache().keys(), vec!["test-1".to_string()]);
        let cached: TestEntity =
            serde_json::from_value(expander.cache().get("test-1").expect("cached")).expect("decode");
        assert_eq!(cached.value, "cached");
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_reloaded() {
        let expander = CacheExpander::new(Duration::from_secs(60));
        expander.cache().set("test-1", serde_json::json!("not an entity"));

        let fetched: TestEntity = expander
            .fetch("test-1", CacheStrategy::Refresh, || async { Ok(entity("remote")) })
            .await
            .expect("Failed to fetch");

        assert_eq!(fetched.value, "remote");
        let cached: TestEntity =
            serde_json::from_value(expander.cache().get("test-1").expect("cached")).expect("decode");
        assert_eq!(cached, entity("remote"));
    }

    #[tokio::test]
    async fn test_invalidate_removes_matching_keys() {
        let expander = CacheExpander::new(Duration::from_secs(60));
        expander.cache().set("exam-e1", serde_json::json!(1));
        expander.cache().set("exams-org1-page1", serde_json::json!(2));
        expander.cache().set("stats-org1", serde_json::json!(3));

        assert_eq!(expander.invalidate("exam"), 2);
        assert_eq!(expander.cache().keys(), vec!["stats-org1".to_string()]);

        expander.clear();
        assert!(expander.cache().is_empty());
    }

    #[tokio::test]
    async fn test_expander_with_custom_metrics() {
        #[derive(Clone, Default)]
        struct TestMetrics {
            hits: Arc<Mutex<usize>>,
            misses: Arc<Mutex<usize>>,
            errors: Arc<Mutex<Vec<String>>>,
        }

        impl CacheMetrics for TestMetrics {
            fn record_hit(&self, _key: &str, _duration: Duration) {
                *self.hits.lock().expect("Failed to lock hits") += 1;
            }

            fn record_miss(&self, _key: &str, _duration: Duration) {
                *self.misses.lock().expect("Failed to lock misses") += 1;
            }

            fn record_error(&self, key: &str, _error: &str) {
                self.errors
                    .lock()
                    .expect("Failed to lock errors")
                    .push(key.to_string());
            }
        }

        let metrics = TestMetrics::default();
        let expander =
            CacheExpander::new(Duration::from_secs(60)).with_metrics(Box::new(metrics.clone()));

        for _ in 0..2 {
            let _: TestEntity = expander
                .fetch("test-1", CacheStrategy::Refresh, || async { Ok(entity("remote")) })
                .await
                .expect("Failed to fetch");
        }
        let _ = expander
            .fetch::<TestEntity, _, _>("test-2", CacheStrategy::Refresh, || async {
                Err(Error::Transport("connection refused".to_string()))
            })
            .await;

        assert_eq!(*metrics.misses.lock().expect("Failed to lock misses"), 1);
        assert_eq!(*metrics.hits.lock().expect("Failed to lock hits"), 1);
        assert_eq!(
            *metrics.errors.lock().expect("Failed to lock errors"),
            vec!["test-2".to_string()]
        );
    }
}
