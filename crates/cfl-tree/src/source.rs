//! Source identifiers
//!
//! A source is whoever contributed a configuration document: a device, or the
//! group the devices belong to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display token of the group sentinel
pub const GROUP_SENTINEL: &str = "group";

/// Device identifier as reported by the management API
///
/// The API hands ids out as numbers in some payloads and as strings in
/// others; both are normalized to their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device id from its text form
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

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for DeviceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Origin of a configuration document
///
/// Ordering puts devices first (by id text) and the group last, which keeps
/// rendered source lists stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceId {
    /// A single device
    Device(DeviceId),
    /// The group-level configuration baseline
    Group,
}

impl SourceId {
    /// Source for a device id
    #[inline]
    #[must_use]
    pub fn device(id: impl Into<DeviceId>) -> Self {
        Self::Device(id.into())
    }

    /// Whether this is the group sentinel
    #[inline]
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group)
    }

    /// Device id, if this is a device
    #[inline]
    #[must_use]
    pub fn as_device(&self) -> Option<&DeviceId> {
        match self {
            Self::Device(id) => Some(id),
            Self::Group => None,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(id) => write!(f, "{id}"),
            Self::Group => f.write_str(GROUP_SENTINEL),
        }
    }
}

impl From<DeviceId> for SourceId {
    fn from(id: DeviceId) -> Self {
        Self::Device(id)
    }
}
