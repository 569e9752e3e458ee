//! Error types for the dashboard client.

use std::fmt;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the dashboard client.
///
/// Every fallible operation returns `Result<T>`. The data-access layer never
/// rewrites these: whatever the HTTP boundary reports reaches the caller
/// unchanged, with the single exception of activity-log reads.
#[derive(Debug, Clone)]
pub enum Error {
    /// The request never produced an HTTP response.
    ///
    /// Common causes:
    /// - Connection refused or reset
    /// - DNS failure
    /// - TLS handshake failure
    ///
    /// **Recovery:** Retry once the backend is reachable.
    Transport(String),

    /// The server answered with a non-2xx status.
    ///
    /// `body` holds the raw response text, which usually carries the
    /// server's own error message.
    Http {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A request body could not be encoded as JSON.
    SerializationError(String),

    /// A response body (or cached payload) did not match the expected shape.
    DeserializationError(String),

    /// Invalid client configuration.
    ///
    /// Raised by `ClientConfig::validate()` and when building the HTTP client.
    ConfigError(String),

    /// A request path could not be joined onto the base URL.
    InvalidUrl(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// HTTP status code, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
            Error::Http { status, body } => {
                if body.is_empty() {
                    write!(f, "HTTP error: status {}", status)
                } else {
                    write!(f, "HTTP error: status {}: {}", status, body)
                }
            }
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            Error::Http {
                status: status.as_u16(),
                body: String::new(),
            }
        } else if e.is_decode() {
            Error::DeserializationError(e.to_string())
        } else if e.is_builder() {
            Error::ConfigError(e.to_string())
        } else {
            Error::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Transport(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ConfigError("empty base_url".to_string());
        assert_eq!(err.to_string(), "Config error: empty base_url");
    }

    #[test]
    fn test_http_error_display() {
        let err = Error::Http {
            status: 404,
            body: "exam not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: status 404: exam not found");
        assert_eq!(err.status(), Some(404));

        let bare = Error::Http {
            status: 500,
            body: String::new(),
        };
        assert_eq!(bare.to_string(), "HTTP error: status 500");
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_from_json_syntax() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: Error = parse.expect_err("invalid json").into();
        assert!(matches!(err, Error::DeserializationError(_)));
    }
}
