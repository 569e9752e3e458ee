//! Client configuration.
//!
//! Configuration is passed explicitly at construction time; nothing in this
//! crate reads process-wide state, so tests can build isolated instances.
//!
//! ```
//! use exam_dashboard_kit::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new("https://exams.example.com/api")
//!     .with_cache_duration(Duration::from_secs(120))
//!     .with_token_key("authToken");
//!
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Default base endpoint of the exam service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Default lifetime of a cached read (5 minutes).
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(5 * 60);

/// Session storage key the bearer token lives under.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Configuration for [`ApiClient`](crate::api::ApiClient) and
/// [`DashboardService`](crate::service::DashboardService).
///
/// Deserializable so applications can embed it in their own config files.
/// Durations are expressed in milliseconds there:
///
/// ```json
/// { "base_url": "https://exams.example.com/api", "cache_duration_ms": 300000 }
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base endpoint every request path is joined onto.
    pub base_url: String,

    /// How long a cached read stays valid.
    #[serde(rename = "cache_duration_ms", with = "duration_ms")]
    pub cache_duration: Duration,

    /// Session storage key holding the bearer token.
    pub token_key: String,

    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl ClientConfig {
    /// Configuration for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check the configuration before building a client from it.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` when the base URL is empty or not an
    /// absolute http(s) URL, the cache duration is zero, or the token key
    /// is empty.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::ConfigError("base_url must not be empty".to_string()));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("base_url is invalid: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::ConfigError(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.cache_duration.is_zero() {
            return Err(Error::ConfigError(
                "cache_duration must be > 0".to_string(),
            ));
        }

        if self.token_key.trim().is_empty() {
            return Err(Error::ConfigError("token_key must not be empty".to_string()));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_duration: DEFAULT_CACHE_DURATION,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            user_agent: concat!("exam-dashboard-kit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
