//! Cache key derivation.
//!
//! A key is the operation name followed by its selector parameters, joined
//! with `-`. Filter sets are rendered from a `BTreeMap`, so two logically
//! identical filter sets always yield the same key regardless of the order
//! their fields were inserted in.
//!
//! Free-form parts of composite keys (organization ids, filter names and
//! values) are percent-encoded, so `-`, `=` and `&` only ever appear as
//! separators and distinct parameters never collapse onto one key.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Everything but `[A-Za-z0-9_.~]` is encoded, separators included.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'.').remove(b'~');

/// Operation names used as key prefixes.
pub mod ops {
    pub const STATS: &str = "stats";
    pub const EXAMS: &str = "exams";
    pub const EXAM: &str = "exam";
    pub const ACTIVITY: &str = "activity";
    pub const ANALYTICS: &str = "analytics";
}

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build a key from an operation and a single selector.
    ///
    /// `build("exam", &"e1")` → `"exam-e1"`
    pub fn build(operation: &str, id: &dyn Display) -> String {
        format!("{}-{}", operation, id)
    }

    /// Build a composite key from multiple parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Percent-encode one free-form key part.
    ///
    /// `escape("a-b&c")` → `"a%2Db%26c"`
    pub fn escape(part: &str) -> Cow<'_, str> {
        utf8_percent_encode(part, COMPONENT).into()
    }

    /// Stable rendering of a filter set: `k1=v1&k2=v2`, keys sorted.
    ///
    /// Empty values are skipped, so `{status: ""}` and `{}` share a key.
    pub fn filters(filters: &BTreeMap<String, String>) -> String {
        filters
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{}={}", Self::escape(key), Self::escape(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Key for the dashboard stats of an organization.
    pub fn stats(organization_id: &str) -> String {
        Self::build(ops::STATS, &organization_id)
    }

    /// Key for one page of the exam list.
    pub fn exams(organization_id: &str, page: u32, filters: &BTreeMap<String, String>) -> String {
        let page = format!("page{}", page);
        let filters = Self::filters(filters);
        let organization_id = Self::escape(organization_id);
        Self::build_composite(&[ops::EXAMS, &organization_id, &page, &filters])
    }

    /// Key for a single exam.
    pub fn exam(exam_id: &str) -> String {
        Self::build(ops::EXAM, &exam_id)
    }

    /// Key for the activity log of an organization.
    pub fn activity(organization_id: &str, limit: u32) -> String {
        let limit = format!("limit{}", limit);
        let organization_id = Self::escape(organization_id);
        Self::build_composite(&[ops::ACTIVITY, &organization_id, &limit])
    }

    /// Key for the analytics of a single exam.
    pub fn analytics(exam_id: &str) -> String {
        Self::build(ops::ANALYTICS, &exam_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        assert_eq!(CacheKeyBuilder::build("exam", &"e1"), "exam-e1");
        assert_eq!(CacheKeyBuilder::build("page", &3), "page-3");
    }

    #[test]
    fn test_composite_key_builder() {
        let key = CacheKeyBuilder::build_composite(&["exams", "org1", "page1"]);
        assert_eq!(key, "exams-org1-page1");

        let key = CacheKeyBuilder::build_composite(&["exams", "org1", "page1", ""]);
        assert_eq!(key, "exams-org1-page1");
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(CacheKeyBuilder::stats("org1"), "stats-org1");
        assert_eq!(CacheKeyBuilder::exam("e1"), "exam-e1");
        assert_eq!(CacheKeyBuilder::analytics("e1"), "analytics-e1");
        assert_eq!(CacheKeyBuilder::activity("org1", 20), "activity-org1-limit20");
        assert_eq!(
            CacheKeyBuilder::exams("org1", 2, &BTreeMap::new()),
            "exams-org1-page2"
        );
    }

    #[test]
    fn test_filter_order_does_not_change_key() {
        let mut a = BTreeMap::new();
        a.insert("status".to_string(), "draft".to_string());
        a.insert("search".to_string(), "algebra".to_string());

        let mut b = BTreeMap::new();
        b.insert("search".to_string(), "algebra".to_string());
        b.insert("status".to_string(), "draft".to_string());

        let key_a = CacheKeyBuilder::exams("org1", 1, &a);
        let key_b = CacheKeyBuilder::exams("org1", 1, &b);

        assert_eq!(key_a, key_b);
        assert_eq!(key_a, "exams-org1-page1-search=algebra&status=draft");
    }

    #[test]
    fn test_empty_filter_values_are_skipped() {
        let mut filters = BTreeMap::new();
        filters.insert("status".to_string(), String::new());

        assert_eq!(
            CacheKeyBuilder::exams("org1", 1, &filters),
            CacheKeyBuilder::exams("org1", 1, &BTreeMap::new())
        );
    }

    #[test]
    fn test_distinct_parameters_give_distinct_keys() {
        let none = BTreeMap::new();
        assert_ne!(
            CacheKeyBuilder::exams("org1", 1, &none),
            CacheKeyBuilder::exams("org1", 2, &none)
        );
        assert_ne!(
            CacheKeyBuilder::exams("org1", 1, &none),
            CacheKeyBuilder::exams("org2", 1, &none)
        );
    }

    #[test]
    fn test_separators_inside_filters_are_escaped() {
        let mut packed = BTreeMap::new();
        packed.insert("search".to_string(), "x&status=draft".to_string());

        let mut split = BTreeMap::new();
        split.insert("search".to_string(), "x".to_string());
        split.insert("status".to_string(), "draft".to_string());

        let packed_key = CacheKeyBuilder::exams("org1", 1, &packed);
        let split_key = CacheKeyBuilder::exams("org1", 1, &split);

        assert_ne!(packed_key, split_key);
        assert_eq!(packed_key, "exams-org1-page1-search=x%26status%3Ddraft");
        assert_eq!(split_key, "exams-org1-page1-search=x&status=draft");
    }

    #[test]
    fn test_separators_inside_organization_are_escaped() {
        let none = BTreeMap::new();
        assert_eq!(CacheKeyBuilder::exams("a-page2", 1, &none), "exams-a%2Dpage2-page1");
        assert_ne!(
            CacheKeyBuilder::exams("a-page2", 1, &none),
            CacheKeyBuilder::exams("a", 2, &none)
        );
        assert_ne!(
            CacheKeyBuilder::activity("a-limit5", 20),
            CacheKeyBuilder::activity("a", 5)
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(CacheKeyBuilder::escape("org1"), "org1");
        assert_eq!(CacheKeyBuilder::escape("a-b&c"), "a%2Db%26c");
        assert_eq!(CacheKeyBuilder::escape("intro algebra"), "intro%20algebra");
        assert_eq!(CacheKeyBuilder::escape("50%"), "50%25");
    }
}
