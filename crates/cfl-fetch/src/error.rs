//! Error types for configuration sources

use cfl_tree::ShapeError;
use std::path::PathBuf;

/// Errors while obtaining documents
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP client could not be built or a request could not be sent
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status that is not worth retrying
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// Every attempt failed
    #[error("retries exhausted for {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    /// Response body did not have the expected structure
    #[error("unexpected payload from {url}: {reason}")]
    Payload { url: String, reason: String },

    /// A configuration document has the wrong shape
    #[error("malformed configuration for {origin}: {source}")]
    Shape {
        origin: String,
        #[source]
        source: ShapeError,
    },

    /// Reading an offline document failed
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// API keys cannot be sent as headers
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The source cannot provide this document
    #[error("{0} is not supported by this source")]
    Unsupported(&'static str),
}

impl FetchError {
    /// Create payload error for url
    pub fn payload(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Payload {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create shape error for a document origin
    pub fn shape(origin: impl Into<String>, source: ShapeError) -> Self {
        Self::Shape {
            origin: origin.into(),
            source,
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = FetchError::Status {
            url: "https://example/api".into(),
            status: 401,
        };
        assert_eq!(
            err.to_string(),
            "request to https://example/api failed with status 401"
        );
    }

    #[test]
    fn unsupported_display() {
        let err = FetchError::Unsupported("firmware default configuration");
        assert!(err.to_string().starts_with("firmware default configuration"));
    }
}
