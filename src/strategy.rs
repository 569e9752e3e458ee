//! Cache strategies for read operations.
//!
//! ```
//! use exam_dashboard_kit::strategy::CacheStrategy;
//!
//! // Cache-first, fall back to the API and store the result (default)
//! let _s = CacheStrategy::Refresh;
//!
//! // Go straight to the API; neither read nor write the cache
//! let _s = CacheStrategy::Bypass;
//! ```
//!
//! | Strategy | Cache Hit | Cache Miss | Stores result |
//! |----------|-----------|------------|---------------|
//! | **Refresh** | Return | API | yes |
//! | **Bypass** | Ignored | API | no |

/// Strategy enum controlling how a read consults the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// **Refresh**: read-through.
    ///
    /// Flow:
    /// 1. Check cache
    /// 2. If hit: return cached value
    /// 3. If miss: call the API
    /// 4. Store in cache
    /// 5. Return value
    #[default]
    Refresh,

    /// **Bypass**: ignore the cache entirely.
    ///
    /// Used for payloads that must never be cached, such as exported
    /// result files.
    Bypass,
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::Refresh => write!(f, "Refresh"),
            CacheStrategy::Bypass => write!(f, "Bypass"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_display() {
        assert_eq!(CacheStrategy::Refresh.to_string(), "Refresh");
        assert_eq!(CacheStrategy::Bypass.to_string(), "Bypass");
    }

    #[test]
    fn test_strategy_default() {
        assert_eq!(CacheStrategy::default(), CacheStrategy::Refresh);
    }
}
