//! Layer service
//!
//! Owns the current aggregation tree and answers chart queries against it.
//! A rebuild assembles a complete new tree before swapping it in, so readers
//! always see either the previous tree or the new one. A failed rebuild keeps
//! the previous tree serving.

use crate::build::build_tree;
use crate::config::{ChartConfig, LayersConfig};
use crate::error::ServiceError;
use cfl_fetch::{ConfigSource, Credentials, EcmClient, GroupId};
use cfl_tree::{flatten_with, subtree_to_dict, AggregationTree, TreeStats, TreemapData};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

/// Tree built for one group
#[derive(Debug)]
pub struct Snapshot {
    /// Group the tree was built for
    pub group: GroupId,
    /// The aggregation tree
    pub tree: AggregationTree,
}

/// Serves chart data for the most recently built group
#[derive(Debug)]
pub struct LayerService {
    config: LayersConfig,
    current: RwLock<Option<Arc<Snapshot>>>,
    /// Serializes rebuilds
    rebuilding: tokio::sync::Mutex<()>,
}

impl LayerService {
    /// Create a service with no tree
    #[inline]
    #[must_use]
    pub fn new(config: LayersConfig) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            rebuilding: tokio::sync::Mutex::new(()),
        }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LayersConfig {
        &self.config
    }

    /// Rebuild from the management API
    ///
    /// # Errors
    /// Returns error if the client cannot be created or the build fails
    pub async fn rebuild(
        &self,
        credentials: &Credentials,
        group: &GroupId,
    ) -> Result<Arc<Snapshot>, ServiceError> {
        let client = EcmClient::new(self.config.api.clone(), credentials)?;
        self.rebuild_from(&client, group).await
    }

    /// Rebuild from any source
    ///
    /// # Errors
    /// Returns the build error; the previous tree stays current
    pub async fn rebuild_from(
        &self,
        source: &dyn ConfigSource,
        group: &GroupId,
    ) -> Result<Arc<Snapshot>, ServiceError> {
        let _guard = self.rebuilding.lock().await;

        let tree = match build_tree(
            source,
            group,
            self.config.aggregation,
            self.config.api.batch_size,
        )
        .await
        {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!(group = %group, error = %e, "rebuild failed, keeping previous tree");
                return Err(e);
            }
        };

        let stats = tree.stats();
        tracing::info!(
            group = %group,
            nodes = stats.nodes,
            sources = stats.sources,
            max_depth = stats.max_depth,
            "aggregation tree replaced"
        );

        let snapshot = Arc::new(Snapshot {
            group: group.clone(),
            tree,
        });
        *self.current.write() = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Current snapshot
    ///
    /// # Errors
    /// Returns [`ServiceError::NoTree`] before the first successful build
    pub fn snapshot(&self) -> Result<Arc<Snapshot>, ServiceError> {
        self.current.read().clone().ok_or(ServiceError::NoTree)
    }

    /// Chart sequences with the configured chart settings
    ///
    /// # Errors
    /// Returns [`ServiceError::NoTree`] before the first successful build
    pub fn chart(&self) -> Result<TreemapData, ServiceError> {
        self.chart_with(&self.config.chart)
    }

    /// Chart sequences with explicit chart settings
    ///
    /// # Errors
    /// Returns [`ServiceError::NoTree`] before the first successful build
    pub fn chart_with(&self, chart: &ChartConfig) -> Result<TreemapData, ServiceError> {
        let snapshot = self.snapshot()?;
        Ok(flatten_with(&snapshot.tree, chart.filter(), chart.options()))
    }

    /// Nested rendering of the node behind a chart id
    ///
    /// # Errors
    /// Returns error if there is no tree or the id does not resolve
    pub fn subtree(&self, id: &str) -> Result<Value, ServiceError> {
        let snapshot = self.snapshot()?;
        let node = snapshot.tree.lookup(id)?;
        Ok(subtree_to_dict(node))
    }

    /// Counters of the current tree
    ///
    /// # Errors
    /// Returns [`ServiceError::NoTree`] before the first successful build
    pub fn stats(&self) -> Result<TreeStats, ServiceError> {
        Ok(self.snapshot()?.tree.stats())
    }

    /// Firmware default configuration for a group
    ///
    /// Shown alongside the chart only; never merged into the tree.
    ///
    /// # Errors
    /// Returns error if the source cannot provide it
    pub async fn default_configuration(
        &self,
        source: &dyn ConfigSource,
        group: &GroupId,
    ) -> Result<Value, ServiceError> {
        Ok(source.default_configuration(group).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfl_test_utils::wifi_source;

    #[tokio::test]
    async fn queries_fail_before_first_build() {
        let service = LayerService::new(LayersConfig::default());
        assert!(matches!(service.chart(), Err(ServiceError::NoTree)));
        assert!(matches!(service.subtree("ROOT"), Err(ServiceError::NoTree)));
        assert!(matches!(service.stats(), Err(ServiceError::NoTree)));
    }

    #[tokio::test]
    async fn rebuild_records_group() {
        let service = LayerService::new(LayersConfig::default());
        let snapshot = service
            .rebuild_from(&wifi_source(), &GroupId::from(42))
            .await
            .unwrap();
        assert_eq!(snapshot.group, GroupId::from(42));
        assert_eq!(service.snapshot().unwrap().group.as_str(), "42");
    }

    #[tokio::test]
    async fn rebuild_with_bad_credentials_fails_fast() {
        let service = LayerService::new(LayersConfig::default());
        let creds = Credentials::new("id", "key\r\n", "eid", "ekey");
        let err = service.rebuild(&creds, &GroupId::from(1)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Fetch(cfl_fetch::FetchError::InvalidCredentials(_))
        ));
    }
}
