//! API client configuration
//!
//! Defaults mirror what the management API tolerates: 500 records per page,
//! 100 devices per configuration request, up to 10 retries with doubling
//! backoff on throttling and gateway errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://www.cradlepointecm.com/api/v2";

/// Environment variables holding the API keys
pub const ENV_CP_API_ID: &str = "X_CP_API_ID";
pub const ENV_CP_API_KEY: &str = "X_CP_API_KEY";
pub const ENV_ECM_API_ID: &str = "X_ECM_API_ID";
pub const ENV_ECM_API_KEY: &str = "X_ECM_API_KEY";

/// Management API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Records per page on listing endpoints
    pub page_limit: u32,
    /// Devices per configuration request
    pub batch_size: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First retry delay in seconds (doubles each retry)
    pub backoff_secs: u64,
    /// Upper bound of the retry delay in seconds
    pub max_backoff_secs: u64,
    /// Statuses that are retried
    pub retry_statuses: Vec<u16>,
}

impl ApiConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API root
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With devices per configuration request
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// With retry count
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API root with any trailing slash removed
    #[inline]
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Retry policy derived from these settings
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_secs(self.backoff_secs),
            max_backoff: Duration::from_secs(self.max_backoff_secs),
            statuses: self.retry_statuses.clone(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: 500,
            batch_size: 100,
            timeout_secs: 30,
            max_retries: 10,
            backoff_secs: 1,
            max_backoff_secs: 120,
            retry_statuses: vec![408, 429, 502, 503, 504],
        }
    }
}

/// When and how long to wait before retrying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    pub max_backoff: Duration,
    pub statuses: Vec<u16>,
}

impl RetryPolicy {
    /// Whether a response status is retried
    #[inline]
    #[must_use]
    pub fn retries_status(&self, status: u16) -> bool {
        self.statuses.contains(&status)
    }

    /// Delay before retry number `attempt` (1-based)
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// API keys sent with every request
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub cp_api_id: String,
    pub cp_api_key: String,
    pub ecm_api_id: String,
    pub ecm_api_key: String,
}

impl Credentials {
    /// Create from the four keys
    #[must_use]
    pub fn new(
        cp_api_id: impl Into<String>,
        cp_api_key: impl Into<String>,
        ecm_api_id: impl Into<String>,
        ecm_api_key: impl Into<String>,
    ) -> Self {
        Self {
            cp_api_id: cp_api_id.into(),
            cp_api_key: cp_api_key.into(),
            ecm_api_id: ecm_api_id.into(),
            ecm_api_key: ecm_api_key.into(),
        }
    }

    /// Read keys from the environment; missing variables stay empty
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().overlay(|name| std::env::var(name).ok())
    }

    /// Replace keys with non-empty values returned by `lookup`
    #[must_use]
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fields = [
            (ENV_CP_API_ID, &mut self.cp_api_id),
            (ENV_CP_API_KEY, &mut self.cp_api_key),
            (ENV_ECM_API_ID, &mut self.ecm_api_id),
            (ENV_ECM_API_KEY, &mut self.ecm_api_key),
        ];
        for (name, field) in fields {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }
        self
    }

    /// Whether all four keys are set
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.cp_api_id,
            &self.cp_api_key,
            &self.ecm_api_id,
            &self.ecm_api_key,
        ]
        .iter()
        .all(|k| !k.is_empty())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("cp_api_id", &self.cp_api_id)
            .field("cp_api_key", &"<redacted>")
            .field("ecm_api_id", &self.ecm_api_id)
            .field("ecm_api_key", &"<redacted>")
            .finish()
    }
}
