//! The seam between the aggregation build and whatever supplies documents

use crate::error::FetchError;
use async_trait::async_trait;
use cfl_tree::{ConfigDocument, DeviceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Group identifier on the management API
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Create a group id from its text form
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for GroupId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Supplier of configuration documents
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// All device ids in the group
    async fn device_ids(&self, group: &GroupId) -> Result<Vec<DeviceId>, FetchError>;

    /// The group-level configuration
    async fn group_configuration(&self, group: &GroupId) -> Result<ConfigDocument, FetchError>;

    /// Configurations of a batch of devices, paired with their ids
    ///
    /// Devices without a configuration are left out of the result.
    async fn device_configurations(
        &self,
        devices: &[DeviceId],
    ) -> Result<Vec<(DeviceId, ConfigDocument)>, FetchError>;

    /// Firmware default configuration of the group's target firmware
    ///
    /// Not part of the aggregation; sources that cannot provide it keep the
    /// default implementation.
    async fn default_configuration(&self, _group: &GroupId) -> Result<Value, FetchError> {
        Err(FetchError::Unsupported("firmware default configuration"))
    }
}
