//! reqwest-backed [`RemoteApi`] implementation.

use super::{Method, Query, RemoteApi};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::ExportedFile;
use crate::session::SessionStorage;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

/// HTTP client for the exam service.
///
/// Every request reads the bearer token from [`SessionStorage`] at send time,
/// so a token set after the client was built is still picked up. When no token
/// is stored the request goes out without an `Authorization` header.
///
/// There is no retry, backoff or timeout here; failures are returned to the
/// caller as they happened.
///
/// # Example
///
/// ```no_run
/// use exam_dashboard_kit::{ApiClient, ClientConfig, SessionStorage};
/// use exam_dashboard_kit::api::RemoteApi;
///
/// # async fn run() -> exam_dashboard_kit::Result<()> {
/// let session = SessionStorage::with_item("token", "abc123");
/// let client = ApiClient::new(&ClientConfig::new("https://exams.example.com/api"), session)?;
///
/// let stats = client
///     .get("exams/stats", &[("organizationId", "org1".to_string())])
///     .await?;
/// println!("{}", stats);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
    session: SessionStorage,
    token_key: String,
}

impl ApiClient {
    /// Build a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid or the
    /// underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: SessionStorage) -> Result<Self> {
        config.validate()?;

        let mut base = Url::parse(&config.base_url)?;
        // `Url::join` drops the last path segment unless it ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        Ok(ApiClient {
            client,
            base,
            session,
            token_key: config.token_key.clone(),
        })
    }

    /// Base endpoint all paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Session storage the bearer token is read from.
    pub fn session(&self) -> &SessionStorage {
        &self.session
    }

    /// Resolve a request path against the base endpoint.
    ///
    /// # Errors
    /// Returns `Error::InvalidUrl` if the path cannot be joined.
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str, query: &Query<'_>) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        debug!("→ {} {}", method, url);

        let mut request = self.client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }

        match self.session.get_item(&self.token_key) {
            Some(token) => Ok(request.bearer_auth(token)),
            None => {
                debug!("No '{}' in session storage, sending unauthenticated", self.token_key);
                Ok(request)
            }
        }
    }

    /// Turn a non-2xx response into `Error::Http`, keeping the body text.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("← {} {}", status, body);
        Err(Error::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_json(response: Response) -> Result<Value> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| Error::DeserializationError(e.to_string()))
    }
}

impl RemoteApi for ApiClient {
    async fn get(&self, path: &str, query: &Query<'_>) -> Result<Value> {
        let response = self.request(Method::GET, path, query)?.send().await?;
        Self::read_json(response).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let mut request = self.request(method, path, &[])?;
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        Self::read_json(response).await
    }

    async fn download(&self, path: &str, query: &Query<'_>) -> Result<ExportedFile> {
        let response = self.request(Method::GET, path, query)?.send().await?;
        let response = Self::check_status(response).await?;

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(file_name_from_disposition);

        let bytes = response.bytes().await?.to_vec();
        Ok(ExportedFile {
            bytes,
            content_type,
            file_name,
        })
    }
}

/// Extract `filename` from a `Content-Disposition` header value.
fn file_name_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
