// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// S3-compatible object storage error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error outside of a page fetch (client construction etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single page could not be fetched.
    #[error("Fetch failed for {url}: {cause}")]
    Fetch { url: String, cause: FetchCause },

    /// Input did not have the structure a parser expected.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The durable content cache could not be read or written.
    #[error("Cache error for {key}: {message}")]
    Cache { key: String, message: String },

    /// One or more blob store writes were rejected.
    #[error("Publish failed for {} object(s) [{}]: {message}", failed.len(), failed.join(", "))]
    Publish { failed: Vec<String>, message: String },
}

/// Classification of a failed page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    /// The request exceeded the client timeout.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// The server answered with a non-2xx status.
    Status(u16),
    /// The body could not be read or decoded as text.
    Decode(String),
    /// Any other transport failure.
    Request(String),
}

impl FetchCause {
    /// Classify a reqwest error.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else if error.is_decode() || error.is_body() {
            Self::Decode(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect => write!(f, "connection failed"),
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::Decode(message) => write!(f, "decode error: {message}"),
            Self::Request(message) => write!(f, "request error: {message}"),
        }
    }
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, cause: FetchCause) -> Self {
        Self::Fetch {
            url: url.into(),
            cause,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create a cache error for a key.
    pub fn cache(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Cache {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create a publish error listing the rejected keys.
    pub fn publish(failed: Vec<String>, message: impl fmt::Display) -> Self {
        Self::Publish {
            failed,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = AppError::fetch("https://example.edu/", FetchCause::Status(404));
        assert_eq!(
            err.to_string(),
            "Fetch failed for https://example.edu/: HTTP status 404"
        );
    }

    #[test]
    fn test_toml_parse_error_converts() {
        let err: AppError = toml::from_str::<toml::Table>("= broken")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Toml(_)));
    }

    #[test]
    fn test_publish_error_lists_keys() {
        let err = AppError::publish(
            vec!["a.html".to_string(), "b.json".to_string()],
            "access denied",
        );
        let text = err.to_string();
        assert!(text.contains("2 object(s)"));
        assert!(text.contains("a.html, b.json"));
    }
}
