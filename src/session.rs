//! Session-scoped key/value storage.
//!
//! Holds the bearer credential the [`ApiClient`](crate::api::ApiClient)
//! reads on every request. The client never copies the token: logging in or
//! out through the same `SessionStorage` takes effect on the next request.

use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe string store, shared between clones.
///
/// # Example
///
/// ```
/// use exam_dashboard_kit::SessionStorage;
///
/// let session = SessionStorage::new();
/// session.set_item("token", "abc123");
/// assert_eq!(session.get_item("token").as_deref(), Some("abc123"));
///
/// session.remove_item("token");
/// assert!(session.get_item("token").is_none());
/// ```
#[derive(Clone, Default)]
pub struct SessionStorage {
    items: Arc<DashMap<String, String>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a single item.
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let session = Self::new();
        session.items.insert(key.into(), value.into());
        session
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|value| value.clone())
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }

    pub fn remove_item(&self, key: &str) -> Option<String> {
        self.items.remove(key).map(|(_, value)| value)
    }

    pub fn clear(&self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// Item values are credentials; only the count is printed.
impl std::fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStorage")
            .field("items", &self.len())
            .finish()
    }
}
