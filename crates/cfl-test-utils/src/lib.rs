//! Testing utilities for the Config Layers workspace
//!
//! Shared fixtures and an in-memory [`ConfigSource`].

#![allow(missing_docs)]

use async_trait::async_trait;
use cfl_fetch::{ConfigSource, FetchError, GroupId};
use cfl_tree::{AggregationTree, ConfigDocument, DeviceId, TreeBuilder};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};

pub fn doc(value: Value) -> ConfigDocument {
    ConfigDocument::from_value(value).unwrap()
}

/// Two devices on `net1`, the group on `net0`
pub fn wifi_source() -> MemorySource {
    MemorySource::new(doc(json!({"wifi": {"ssid": "net0"}})))
        .with_device("1001", doc(json!({"wifi": {"ssid": "net1"}})))
        .with_device("1002", doc(json!({"wifi": {"ssid": "net1"}})))
}

/// Tree of the [`wifi_source`] scenario
pub fn wifi_tree() -> AggregationTree {
    let mut builder = TreeBuilder::new(Default::default());
    builder
        .add_device(&DeviceId::new("1001"), &doc(json!({"wifi": {"ssid": "net1"}})))
        .unwrap();
    builder
        .add_device(&DeviceId::new("1002"), &doc(json!({"wifi": {"ssid": "net1"}})))
        .unwrap();
    builder.add_group(&doc(json!({"wifi": {"ssid": "net0"}}))).unwrap();
    builder.finish()
}

/// A realistic router configuration with nested sections, lists, and booleans
pub fn router_document(ssid: &str, lan_ip: &str) -> ConfigDocument {
    doc(json!({
        "system": {
            "system_id": "router",
            "ui_activated": true,
            "logging": {"enabled": false, "level": "info"}
        },
        "lan": {"00000000-0d93-319d-8220-4a1fb0372b51": {"ip_address": lan_ip, "netmask": "255.255.255.0"}},
        "wlan": {"radio": {"0": {"bss": {"0": {"ssid": ssid}}}}},
        "firewall": {"ports": [22, 443]}
    }))
}

/// In-memory document source
///
/// Records the size of every device batch requested and can be switched into
/// a failing mode to exercise error paths.
#[derive(Debug, Default)]
pub struct MemorySource {
    group: ConfigDocument,
    devices: Vec<(DeviceId, ConfigDocument)>,
    defaults: Option<Value>,
    failing: AtomicBool,
    batches: Mutex<Vec<usize>>,
}

impl MemorySource {
    pub fn new(group: ConfigDocument) -> Self {
        Self {
            group,
            ..Self::default()
        }
    }

    pub fn with_device(mut self, id: &str, document: ConfigDocument) -> Self {
        self.devices.push((DeviceId::new(id), document));
        self
    }

    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Make every subsequent call fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Sizes of the device batches requested so far
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }

    fn check(&self) -> Result<(), FetchError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(FetchError::Status {
                url: "memory://".to_string(),
                status: 503,
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConfigSource for MemorySource {
    async fn device_ids(&self, _group: &GroupId) -> Result<Vec<DeviceId>, FetchError> {
        self.check()?;
        Ok(self.devices.iter().map(|(id, _)| id.clone()).collect())
    }

    async fn group_configuration(&self, _group: &GroupId) -> Result<ConfigDocument, FetchError> {
        self.check()?;
        Ok(self.group.clone())
    }

    async fn device_configurations(
        &self,
        devices: &[DeviceId],
    ) -> Result<Vec<(DeviceId, ConfigDocument)>, FetchError> {
        self.check()?;
        self.batches.lock().push(devices.len());
        Ok(self
            .devices
            .iter()
            .filter(|(id, _)| devices.contains(id))
            .cloned()
            .collect())
    }

    async fn default_configuration(&self, _group: &GroupId) -> Result<Value, FetchError> {
        self.check()?;
        self.defaults
            .clone()
            .ok_or(FetchError::Unsupported("firmware default configuration"))
    }
}
