//! Error types for the Config Layers service

use cfl_fetch::FetchError;
use cfl_tree::{BuildError, LookupError};
use std::path::PathBuf;

/// Main service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Documents could not be obtained
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A document could not be merged into the tree
    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    /// A chart id did not resolve
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Queried before the first successful build
    #[error("no aggregation tree has been built yet")]
    NoTree,
}

impl ServiceError {
    /// Whether a later rebuild may succeed without any change on our side
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Fetch(FetchError::Transport(_) | FetchError::RetriesExhausted { .. })
        )
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this configuration
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
