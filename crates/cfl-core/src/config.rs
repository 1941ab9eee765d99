//! Service configuration
//!
//! Loaded from a TOML file; every section is optional. API keys in the
//! environment take precedence over keys in the file.

use crate::error::ConfigError;
use cfl_fetch::{ApiConfig, Credentials};
use cfl_tree::{BooleanPolicy, ChildOrder, ExcludeGroup, FlattenOptions, LabelStyle, SourceFilter};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayersConfig {
    /// Management API client settings
    pub api: ApiConfig,
    /// API keys
    pub credentials: Credentials,
    /// How booleans are merged
    pub aggregation: BooleanPolicy,
    /// How the chart is rendered
    pub chart: ChartConfig,
}

impl LayersConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not a valid configuration
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Overlay API keys from the environment
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.credentials = self.credentials.overlay(|name| std::env::var(name).ok());
        self
    }

    /// With API settings
    #[inline]
    #[must_use]
    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// With credentials
    #[inline]
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// With boolean policy
    #[inline]
    #[must_use]
    pub fn with_aggregation(mut self, policy: BooleanPolicy) -> Self {
        self.aggregation = policy;
        self
    }

    /// With chart settings
    #[inline]
    #[must_use]
    pub fn with_chart(mut self, chart: ChartConfig) -> Self {
        self.chart = chart;
        self
    }
}

/// Chart rendering settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Leave the group out of counts and labels
    pub exclude_group: bool,
    /// Sibling order
    pub order: ChildOrder,
    /// Label rendering
    pub label_style: LabelStyle,
}

impl ChartConfig {
    /// With group exclusion
    #[inline]
    #[must_use]
    pub fn with_exclude_group(mut self, exclude_group: bool) -> Self {
        self.exclude_group = exclude_group;
        self
    }

    /// With sibling order
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: ChildOrder) -> Self {
        self.order = order;
        self
    }

    /// With label style
    #[inline]
    #[must_use]
    pub fn with_label_style(mut self, label_style: LabelStyle) -> Self {
        self.label_style = label_style;
        self
    }

    /// Flattening options
    #[inline]
    #[must_use]
    pub fn options(&self) -> FlattenOptions {
        FlattenOptions::default()
            .with_order(self.order)
            .with_labels(self.label_style)
    }

    /// Source filter, if any
    #[must_use]
    pub fn filter(&self) -> Option<&'static dyn SourceFilter> {
        self.exclude_group.then_some(&ExcludeGroup as &'static dyn SourceFilter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = LayersConfig::from_toml_str("").unwrap();
        assert_eq!(config, LayersConfig::default());
        assert!(config.aggregation.suppress_true);
        assert!(!config.aggregation.suppress_false);
        assert_eq!(config.api.batch_size, 100);
    }

    #[test]
    fn sections_override_defaults() {
        let config = LayersConfig::from_toml_str(
            r#"
            [api]
            base_url = "http://localhost:9000/api/v2"
            batch_size = 20

            [credentials]
            cp_api_id = "cp"

            [aggregation]
            suppress_false = true

            [chart]
            exclude_group = true
            order = "sorted"
            label_style = "with_sources"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:9000/api/v2");
        assert_eq!(config.api.batch_size, 20);
        assert_eq!(config.api.page_limit, 500);
        assert_eq!(config.credentials.cp_api_id, "cp");
        assert!(config.aggregation.suppress_true);
        assert!(config.aggregation.suppress_false);
        assert_eq!(
            config.chart,
            ChartConfig::default()
                .with_exclude_group(true)
                .with_order(ChildOrder::Sorted)
                .with_label_style(LabelStyle::WithSources)
        );
    }

    #[test]
    fn unknown_order_is_rejected() {
        let err = LayersConfig::from_toml_str("[chart]\norder = \"random\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LayersConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn chart_filter_follows_exclude_flag() {
        assert!(ChartConfig::default().filter().is_none());
        assert!(ChartConfig::default().with_exclude_group(true).filter().is_some());
    }
}
