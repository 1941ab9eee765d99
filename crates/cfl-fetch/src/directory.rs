//! Offline source reading documents from disk
//!
//! Layout:
//!
//! ```text
//! <root>/group.json            (or .yaml / .yml)
//! <root>/devices/<id>.json     (one per device)
//! <root>/defaults.json         (optional firmware defaults)
//! ```
//!
//! The group argument is ignored; a directory holds exactly one group.

use crate::error::FetchError;
use crate::source::{ConfigSource, GroupId};
use async_trait::async_trait;
use cfl_tree::{ConfigDocument, DeviceId};
use serde_json::Value;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Configuration documents stored in a directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn devices_dir(&self) -> PathBuf {
        self.root.join("devices")
    }

    /// First existing `<dir>/<stem>.<ext>` in extension order
    async fn find(dir: &Path, stem: &str) -> Option<PathBuf> {
        for ext in EXTENSIONS {
            let candidate = dir.join(format!("{stem}.{ext}"));
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }
        None
    }

    async fn read_document(path: &Path) -> Result<ConfigDocument, FetchError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FetchError::io_error(path, e))?;
        let parsed = if is_yaml(path) {
            ConfigDocument::from_yaml(&text)
        } else {
            ConfigDocument::from_json(&text)
        };
        parsed.map_err(|e| FetchError::shape(path.display().to_string(), e))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

fn not_found(path: PathBuf) -> FetchError {
    FetchError::io_error(
        path,
        std::io::Error::new(std::io::ErrorKind::NotFound, "no json or yaml document"),
    )
}

#[async_trait]
impl ConfigSource for DirectorySource {
    async fn device_ids(&self, _group: &GroupId) -> Result<Vec<DeviceId>, FetchError> {
        let dir = self.devices_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "no devices directory");
                return Ok(Vec::new());
            }
            Err(e) => return Err(FetchError::io_error(dir, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FetchError::io_error(&dir, e))?
        {
            let path = entry.path();
            let known = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));
            if !known {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(DeviceId::new(stem));
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn group_configuration(&self, _group: &GroupId) -> Result<ConfigDocument, FetchError> {
        match Self::find(&self.root, "group").await {
            Some(path) => Self::read_document(&path).await,
            None => Err(not_found(self.root.join("group.json"))),
        }
    }

    async fn device_configurations(
        &self,
        devices: &[DeviceId],
    ) -> Result<Vec<(DeviceId, ConfigDocument)>, FetchError> {
        let dir = self.devices_dir();
        let mut documents = Vec::with_capacity(devices.len());
        for device in devices {
            match Self::find(&dir, device.as_str()).await {
                Some(path) => documents.push((device.clone(), Self::read_document(&path).await?)),
                None => tracing::debug!(device = %device, "no document for device"),
            }
        }
        Ok(documents)
    }

    async fn default_configuration(&self, _group: &GroupId) -> Result<Value, FetchError> {
        match Self::find(&self.root, "defaults").await {
            Some(path) => Ok(Self::read_document(&path).await?.into_value()),
            None => Err(FetchError::Unsupported("firmware default configuration")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_detection() {
        assert!(is_yaml(Path::new("a/b.yaml")));
        assert!(is_yaml(Path::new("b.yml")));
        assert!(!is_yaml(Path::new("b.json")));
    }
}
