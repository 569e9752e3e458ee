//! Scripted in-memory [`RemoteApi`] for tests.
//!
//! Register a response per method and path, run the code under test, then
//! ask how many times each route was hit:
//!
//! ```
//! use exam_dashboard_kit::api::{InMemoryApi, Method, RemoteApi};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> exam_dashboard_kit::Result<()> {
//! let api = InMemoryApi::new();
//! api.respond(Method::GET, "/exams/stats", json!({"totalExams": 3}));
//!
//! let body = api.get("/exams/stats", &[]).await?;
//! assert_eq!(body["totalExams"], 3);
//! assert_eq!(api.calls(Method::GET, "/exams/stats"), 1);
//! # Ok(())
//! # }
//! ```

use super::{Method, Query, RemoteApi};
use crate::error::{Error, Result};
use crate::models::ExportedFile;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Canned outcome of a route.
#[derive(Clone, Debug)]
enum Route {
    Json(Value),
    File(ExportedFile),
    Fail(Error),
}

/// A request as the double received it.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Scripted remote API.
///
/// Unknown routes answer `404`. Clones share routes and the request log.
#[derive(Clone, Default)]
pub struct InMemoryApi {
    routes: Arc<DashMap<(Method, String), Route>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with a JSON body.
    pub fn respond(&self, method: Method, path: &str, body: Value) -> &Self {
        self.routes
            .insert((method, normalize(path)), Route::Json(body));
        self
    }

    /// Answer `GET path` downloads with a file.
    pub fn respond_file(&self, path: &str, file: ExportedFile) -> &Self {
        self.routes
            .insert((Method::GET, normalize(path)), Route::File(file));
        self
    }

    /// Answer `method path` with a non-2xx status.
    pub fn fail(&self, method: Method, path: &str, status: u16) -> &Self {
        let error = Error::Http {
            status,
            body: format!("scripted failure for {}", path),
        };
        self.routes.insert((method, normalize(path)), Route::Fail(error));
        self
    }

    /// Answer `method path` as if the network were down.
    pub fn fail_transport(&self, method: Method, path: &str) -> &Self {
        let error = Error::Transport("connection refused".to_string());
        self.routes.insert((method, normalize(path)), Route::Fail(error));
        self
    }

    /// Number of requests received for `method path`.
    pub fn calls(&self, method: Method, path: &str) -> usize {
        let path = normalize(path);
        self.lock()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    /// Number of requests received on any route.
    pub fn total_calls(&self) -> usize {
        self.lock().len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().clone()
    }

    /// Most recent request, if any.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RecordedRequest>> {
        // A panicking test thread must not hide the log from the others.
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, method: Method, path: &str, query: &Query<'_>, body: Option<Value>) -> Route {
        let path = normalize(path);
        self.lock().push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query: query
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
            body,
        });

        let route = self.routes.get(&(method.clone(), path.clone())).map(|r| r.clone());
        route.unwrap_or_else(|| {
            Route::Fail(Error::Http {
                status: 404,
                body: format!("no route for {} /{}", method, path),
            })
        })
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

impl RemoteApi for InMemoryApi {
    async fn get(&self, path: &str, query: &Query<'_>) -> Result<Value> {
        match self.record(Method::GET, path, query, None) {
            Route::Json(value) => Ok(value),
            Route::File(_) => Err(Error::DeserializationError(format!(
                "{} is a binary route",
                path
            ))),
            Route::Fail(error) => Err(error),
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        match self.record(method, path, &[], body) {
            Route::Json(value) => Ok(value),
            Route::File(_) => Err(Error::DeserializationError(format!(
                "{} is a binary route",
                path
            ))),
            Route::Fail(error) => Err(error),
        }
    }

    async fn download(&self, path: &str, query: &Query<'_>) -> Result<ExportedFile> {
        match self.record(Method::GET, path, query, None) {
            Route::File(file) => Ok(file),
            Route::Json(value) => Ok(ExportedFile {
                bytes: value.to_string().into_bytes(),
                content_type: Some("application/json".to_string()),
                file_name: None,
            }),
            Route::Fail(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_json_route() {
        let api = InMemoryApi::new();
        api.respond(Method::GET, "/exams/e1", json!({"id": "e1"}));

        let body = api
            .get("exams/e1", &[("expand", "questions".to_string())])
            .await
            .expect("Failed to get");
        assert_eq!(body, json!({"id": "e1"}));

        let request = api.last_request().expect("request recorded");
        assert_eq!(request.path, "exams/e1");
        assert_eq!(
            request.query,
            vec![("expand".to_string(), "questions".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let api = InMemoryApi::new();

        let result = api.get("/missing", &[]).await;
        assert!(matches!(result, Err(Error::Http { status: 404, .. })));
        assert_eq!(api.calls(Method::GET, "/missing"), 1);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let api = InMemoryApi::new();
        api.fail(Method::POST, "/exams", 422)
            .fail_transport(Method::GET, "/exams/stats");

        let result = api.send(Method::POST, "/exams", Some(json!({}))).await;
        assert!(matches!(result, Err(Error::Http { status: 422, .. })));

        let result = api.get("/exams/stats", &[]).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_delete_and_calls_per_method() {
        let api = InMemoryApi::new();
        api.respond(Method::DELETE, "/exams/e1", Value::Null)
            .respond(Method::GET, "/exams/e1", json!({"id": "e1"}));

        api.delete("/exams/e1").await.expect("Failed to delete");
        api.get("/exams/e1", &[]).await.expect("Failed to get");
        api.get("/exams/e1", &[]).await.expect("Failed to get");

        assert_eq!(api.calls(Method::DELETE, "/exams/e1"), 1);
        assert_eq!(api.calls(Method::GET, "/exams/e1"), 2);
        assert_eq!(api.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_download_route() {
        let api = InMemoryApi::new();
        api.respond_file(
            "/exams/e1/export",
            ExportedFile {
                bytes: b"id,score\n1,90\n".to_vec(),
                content_type: Some("text/csv".to_string()),
                file_name: Some("e1.csv".to_string()),
            },
        );

        let file = api
            .download("/exams/e1/export", &[("format", "csv".to_string())])
            .await
            .expect("Failed to download");
        assert_eq!(file.file_name.as_deref(), Some("e1.csv"));
        assert!(api.get("/exams/e1/export", &[]).await.is_err());
    }
}
