//! Payload types exchanged with the exam service.
//!
//! These are read-only projections of the API's JSON. Fields the crate does
//! not name are kept in `extra` so nothing the server sends is lost when a
//! payload passes through the cache.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Headline numbers for an organization's dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_exams: u64,
    pub active_exams: u64,
    pub total_candidates: u64,
    pub completed_attempts: u64,
    pub average_score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lifecycle status of an exam.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamStatus::Draft => write!(f, "draft"),
            ExamStatus::Published => write!(f, "published"),
            ExamStatus::Archived => write!(f, "archived"),
        }
    }
}

/// Row of the exam list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: ExamStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the exam list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamPage {
    pub exams: Vec<ExamSummary>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

/// Full exam record, as returned by detail, create, update and publish.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ExamStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /exams`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExam {
    pub title: String,
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub questions: Vec<Value>,
}

/// Body of `PATCH /exams/:id`. Only the fields that are set are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExamStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Value>>,
}

/// One line of the organization's activity log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Aggregated results of a single exam.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamAnalytics {
    pub exam_id: String,
    pub attempts: u64,
    pub average_score: f64,
    pub pass_rate: f64,
    pub score_distribution: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Format of an exported result file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary payload of an export, ready to be written to disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Selector for one page of the exam list.
///
/// Filters live in a `BTreeMap`, so the order they are added in never
/// affects the cache key.
///
/// ```
/// use exam_dashboard_kit::ExamQuery;
///
/// let query = ExamQuery::new("org1")
///     .page(2)
///     .filter("status", "draft")
///     .filter("search", "algebra");
///
/// assert_eq!(query.cache_key(), "exams-org1-page2-search=algebra&status=draft");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamQuery {
    pub organization_id: String,
    pub page: u32,
    pub filters: BTreeMap<String, String>,
}

impl ExamQuery {
    /// First page of `organization_id`'s exams, unfiltered.
    pub fn new(organization_id: impl Into<String>) -> Self {
        ExamQuery {
            organization_id: organization_id.into(),
            page: 1,
            filters: BTreeMap::new(),
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn cache_key(&self) -> String {
        crate::key::CacheKeyBuilder::exams(&self.organization_id, self.page, &self.filters)
    }

    /// Query string parameters, filters in key order.
    pub fn query_params(&self) -> Vec<(&str, String)> {
        let mut params = vec![
            ("organizationId", self.organization_id.clone()),
            ("page", self.page.to_string()),
        ];
        params.extend(
            self.filters
                .iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| (key.as_str(), value.clone())),
        );
        params
    }
}
