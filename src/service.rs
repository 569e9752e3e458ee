//! Dashboard data-access layer.
//!
//! Every read goes through the shared [`CacheExpander`]; every mutation goes
//! straight to the API and, once it succeeds, invalidates the entries that
//! could now be stale.

use crate::api::{self, ApiClient, Method, RemoteApi};
use crate::cache::TtlCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::expander::CacheExpander;
use crate::key::{ops, CacheKeyBuilder};
use crate::models::{
    ActivityLogEntry, DashboardStats, Exam, ExamAnalytics, ExamPage, ExamPatch, ExamQuery,
    ExportFormat, ExportedFile, NewExam,
};
use crate::observability::CacheMetrics;
use crate::session::SessionStorage;
use crate::strategy::CacheStrategy;
use serde_json::Value;
use std::sync::Arc;

/// High-level service behind the exam dashboard.
///
/// Cheap to clone: clones share the API handle and the cache, so a write
/// through one clone invalidates what the others read.
///
/// # Example
///
/// ```no_run
/// use exam_dashboard_kit::{ClientConfig, DashboardService, ExamQuery, SessionStorage};
///
/// # async fn run() -> exam_dashboard_kit::Result<()> {
/// let session = SessionStorage::with_item("token", "abc123");
/// let service = DashboardService::connect(&ClientConfig::default(), session)?;
///
/// let stats = service.get_stats("org1").await?;
/// let page = service
///     .get_exams(&ExamQuery::new("org1").filter("status", "published"))
///     .await?;
/// println!("{} exams, {} on this page", stats.total_exams, page.exams.len());
/// # Ok(())
/// # }
/// ```
pub struct DashboardService<A: RemoteApi> {
    api: Arc<A>,
    expander: Arc<CacheExpander>,
}

impl<A: RemoteApi> Clone for DashboardService<A> {
    fn clone(&self) -> Self {
        DashboardService {
            api: Arc::clone(&self.api),
            expander: Arc::clone(&self.expander),
        }
    }
}

impl DashboardService<ApiClient> {
    /// Service talking HTTP to `config.base_url`, authenticated from `session`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if `config` does not validate.
    pub fn connect(config: &ClientConfig, session: SessionStorage) -> Result<Self> {
        let client = ApiClient::new(config, session)?;
        Ok(DashboardService::new(client, config))
    }
}

impl<A: RemoteApi> DashboardService<A> {
    /// Create a service over `api` with the cache duration from `config`.
    pub fn new(api: A, config: &ClientConfig) -> Self {
        DashboardService {
            api: Arc::new(api),
            expander: Arc::new(CacheExpander::new(config.cache_duration)),
        }
    }

    /// Create a new service with custom metrics.
    pub fn with_metrics(api: A, config: &ClientConfig, metrics: Box<dyn CacheMetrics>) -> Self {
        DashboardService {
            api: Arc::new(api),
            expander: Arc::new(CacheExpander::new(config.cache_duration).with_metrics(metrics)),
        }
    }

    /// Headline numbers for an organization. Cached under `stats-{org}`.
    pub async fn get_stats(&self, organization_id: &str) -> Result<DashboardStats> {
        let key = CacheKeyBuilder::stats(organization_id);
        let params = [("organizationId", organization_id.to_string())];

        self.expander
            .fetch(&key, CacheStrategy::Refresh, || {
                self.api.get_json("exams/stats", &params)
            })
            .await
    }

    /// One page of the exam list. Cached per organization, page and filter set.
    pub async fn get_exams(&self, query: &ExamQuery) -> Result<ExamPage> {
        let key = query.cache_key();
        let params = query.query_params();

        self.expander
            .fetch(&key, CacheStrategy::Refresh, || {
                self.api.get_json("exams", &params)
            })
            .await
    }

    /// Full exam record. Cached under `exam-{id}`.
    pub async fn get_exam_details(&self, exam_id: &str) -> Result<Exam> {
        let key = CacheKeyBuilder::exam(exam_id);
        let path = api::path(&["exams", exam_id])?;

        self.expander
            .fetch(&key, CacheStrategy::Refresh, || self.api.get_json(&path, &[]))
            .await
    }

    /// Most recent activity of an organization.
    ///
    /// Never fails: a request error is logged and reported as an empty log,
    /// and nothing is cached for it.
    pub async fn get_activity_logs(
        &self,
        organization_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityLogEntry>> {
        let key = CacheKeyBuilder::activity(organization_id, limit);
        let params = [
            ("organizationId", organization_id.to_string()),
            ("limit", limit.to_string()),
        ];

        let result: Result<Vec<ActivityLogEntry>> = self
            .expander
            .fetch(&key, CacheStrategy::Refresh, || {
                self.api.get_json("exams/activity-logs", &params)
            })
            .await;

        match result {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("Activity log for {} unavailable, showing none: {}", organization_id, e);
                Ok(Vec::new())
            }
        }
    }

    /// Aggregated results of one exam. Cached under `analytics-{id}`.
    pub async fn get_exam_analytics(&self, exam_id: &str) -> Result<ExamAnalytics> {
        let key = CacheKeyBuilder::analytics(exam_id);
        let path = api::path(&["exams", exam_id, "analytics"])?;

        self.expander
            .fetch(&key, CacheStrategy::Refresh, || self.api.get_json(&path, &[]))
            .await
    }

    /// `POST /exams`. Invalidates every list page on success.
    pub async fn create_exam(&self, exam: &NewExam) -> Result<Exam> {
        let created: Exam = self.api.send_json(Method::POST, "exams", exam).await?;
        info!("Created exam {} for {}", created.id, exam.organization_id);

        self.expander.invalidate(ops::EXAMS);
        Ok(created)
    }

    /// `PATCH /exams/:id`. Invalidates the exam and every list page on success.
    pub async fn update_exam(&self, exam_id: &str, patch: &ExamPatch) -> Result<Exam> {
        let path = api::path(&["exams", exam_id])?;
        let updated: Exam = self.api.send_json(Method::PATCH, &path, patch).await?;
        info!("Updated exam {}", exam_id);

        self.invalidate_exam(exam_id);
        Ok(updated)
    }

    /// `DELETE /exams/:id`. Invalidates the exam and every list page on success.
    pub async fn delete_exam(&self, exam_id: &str) -> Result<()> {
        let path = api::path(&["exams", exam_id])?;
        self.api.delete(&path).await?;
        info!("Deleted exam {}", exam_id);

        self.invalidate_exam(exam_id);
        Ok(())
    }

    /// `PATCH /exams/:id/publish`. Invalidates the exam and every list page on success.
    pub async fn publish_exam(&self, exam_id: &str) -> Result<Exam> {
        let path = api::path(&["exams", exam_id, "publish"])?;
        let published: Exam = self
            .api
            .send_json(Method::PATCH, &path, &Value::Object(Default::default()))
            .await?;
        info!("Published exam {}", exam_id);

        self.invalidate_exam(exam_id);
        Ok(published)
    }

    /// Download the results of an exam. Never read from or written to the cache.
    pub async fn export_exam_results(
        &self,
        exam_id: &str,
        format: ExportFormat,
    ) -> Result<ExportedFile> {
        let key = CacheKeyBuilder::build_composite(&["export", exam_id, format.as_str()]);
        let path = api::path(&["exams", exam_id, "export"])?;
        let params = [("format", format.as_str().to_string())];

        self.expander
            .fetch(&key, CacheStrategy::Bypass, || self.api.download(&path, &params))
            .await
    }

    fn invalidate_exam(&self, exam_id: &str) {
        let removed = self.expander.invalidate(exam_id) + self.expander.invalidate(ops::EXAMS);
        debug!("Invalidated {} entries after writing exam {}", removed, exam_id);
    }

    /// Remove every entry whose key contains `pattern`.
    pub fn invalidate(&self, pattern: &str) -> usize {
        self.expander.invalidate(pattern)
    }

    /// Drop the whole cache; the next read of every key goes to the network.
    pub fn clear_cache(&self) {
        self.expander.clear();
    }

    /// Get cache reference (for inspection).
    pub fn cache(&self) -> &TtlCache<Value> {
        self.expander.cache()
    }

    /// The underlying API handle.
    pub fn api(&self) -> &A {
        &self.api
    }
}
