//! Metrics hooks for cache operations.
//!
//! Implement [`CacheMetrics`] to forward hits, misses and invalidations to
//! your monitoring system:
//!
//! ```ignore
//! use exam_dashboard_kit::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("dashboard_cache_hits").inc();
//!     }
//! }
//!
//! // let service = DashboardService::with_metrics(api, &config, Box::new(PrometheusMetrics));
//! ```
//!
//! The default methods log through the `log` crate. [`NoOpMetrics`] (used
//! when nothing is configured) discards everything.

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a miss that was served by the remote API.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a request that skipped the cache on purpose.
    fn record_bypass(&self, key: &str, duration: Duration) {
        debug!("Cache BYPASS: {} took {:?}", key, duration);
    }

    /// Record an invalidation and how many entries it removed.
    fn record_invalidate(&self, pattern: &str, removed: usize) {
        debug!("Cache INVALIDATE: '{}' removed {}", pattern, removed);
    }

    /// Record a failed load.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_bypass(&self, _key: &str, _duration: Duration) {}
    fn record_invalidate(&self, _pattern: &str, _removed: usize) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics that only log, using the trait's default methods.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("key", Duration::from_secs(1));
        metrics.record_miss("key", Duration::from_secs(2));
        metrics.record_invalidate("exams", 3);
    }

    #[test]
    fn test_log_metrics_defaults() {
        let _ = env_logger::builder().is_test(true).try_init();

        let metrics = LogMetrics;
        metrics.record_hit("stats-org1", Duration::from_millis(1));
        metrics.record_bypass("export-e1", Duration::from_millis(5));
        metrics.record_error("exam-e1", "HTTP error: status 500");
    }
}
