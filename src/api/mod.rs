//! The HTTP boundary.
//!
//! The [`RemoteApi`] trait decouples the data-access layer from the transport.
//! [`ApiClient`] talks to the real service over reqwest; [`InMemoryApi`] is a
//! scripted double for tests that counts every request it receives.

use crate::error::{Error, Result};
use crate::models::ExportedFile;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub mod client;
pub mod inmemory;

pub use client::ApiClient;
pub use inmemory::{InMemoryApi, RecordedRequest};
pub use reqwest::Method;

/// Query string parameters, in the order they are sent.
pub type Query<'a> = [(&'a str, String)];

/// Unreserved characters stay, everything else is encoded.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Join `segments` into a request path, percent-encoding each one.
///
/// `path(&["exams", "e1?x=1"])` → `"exams/e1%3Fx%3D1"`
///
/// # Errors
/// Returns `Error::InvalidUrl` for an empty, `.` or `..` segment, which
/// would otherwise address a different resource.
pub fn path(segments: &[&str]) -> Result<String> {
    let mut encoded = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment.is_empty() || *segment == "." || *segment == ".." {
            return Err(Error::InvalidUrl(format!("invalid path segment {:?}", segment)));
        }
        encoded.push(utf8_percent_encode(segment, SEGMENT).to_string());
    }
    Ok(encoded.join("/"))
}

/// Trait for remote API implementations.
///
/// Errors are reported as-is: `Error::Transport` when no response arrived,
/// `Error::Http` for any non-2xx status. Implementations must not retry.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait RemoteApi: Send + Sync {
    /// `GET path?query`, returning the decoded JSON body.
    ///
    /// # Errors
    /// Returns `Err` on transport failure or non-2xx status
    async fn get(&self, path: &str, query: &Query<'_>) -> Result<Value>;

    /// Send a request with an optional JSON body.
    ///
    /// An empty response body is reported as `Value::Null`.
    ///
    /// # Errors
    /// Returns `Err` on transport failure or non-2xx status
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value>;

    /// `GET path?query`, returning the raw body.
    ///
    /// # Errors
    /// Returns `Err` on transport failure or non-2xx status
    async fn download(&self, path: &str, query: &Query<'_>) -> Result<ExportedFile>;

    /// `DELETE path`, discarding any response body.
    ///
    /// # Errors
    /// Returns `Err` on transport failure or non-2xx status
    async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await.map(|_| ())
    }

    /// Typed `GET`.
    ///
    /// # Errors
    /// Same as [`get`](Self::get), plus `Error::DeserializationError` when
    /// the body does not match `T`.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &Query<'_>) -> Result<T> {
        let value = self.get(path, query).await?;
        decode(value)
    }

    /// Typed request with a JSON body.
    ///
    /// # Errors
    /// Same as [`send`](Self::send), plus `Error::SerializationError` /
    /// `Error::DeserializationError` for bodies that do not convert.
    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|e| Error::SerializationError(e.to_string()))?;
        let value = self.send(method, path, Some(body)).await?;
        decode(value)
    }
}

/// Decode a JSON body into `T`.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::DeserializationError(e.to_string()))
}
