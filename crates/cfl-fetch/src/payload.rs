//! Response bodies of the management API

use crate::error::FetchError;
use cfl_tree::{ConfigDocument, DeviceId};
use serde::Deserialize;
use serde_json::Value;

/// One page of a listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: PageMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    /// Absolute url of the next page, if any
    #[serde(default)]
    pub next: Option<String>,
}

/// Reference to a router, either bare or expanded
#[derive(Debug, Clone, Deserialize)]
pub struct RouterRef {
    pub id: Value,
}

impl RouterRef {
    /// Device id, accepting numeric and string ids
    pub fn device_id(&self, url: &str) -> Result<DeviceId, FetchError> {
        match &self.id {
            Value::Number(n) => Ok(DeviceId::new(n.to_string())),
            Value::String(s) if !s.is_empty() => Ok(DeviceId::new(s.clone())),
            other => Err(FetchError::payload(
                url,
                format!("router id must be a number or string, got {other}"),
            )),
        }
    }
}

/// Entry of `configuration_managers` with its router expanded
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationManager {
    pub configuration: Value,
    pub router: RouterRef,
}

/// Body of `groups/{id}/?fields=configuration`
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfiguration {
    pub configuration: Value,
}

/// Body of `groups/{id}/?fields=target_firmware`
#[derive(Debug, Clone, Deserialize)]
pub struct GroupFirmware {
    pub target_firmware: String,
}

/// Take the first element of a `[updates, removals]` configuration pair
///
/// A bare object is accepted as the document itself. A missing or null
/// first element yields an empty document.
pub fn first_document(configuration: Value, origin: &str) -> Result<ConfigDocument, FetchError> {
    let document = match configuration {
        Value::Array(mut pair) => {
            if pair.is_empty() {
                Value::Null
            } else {
                pair.swap_remove(0)
            }
        }
        other => other,
    };
    match document {
        Value::Null => Ok(ConfigDocument::default()),
        value => ConfigDocument::from_value(value).map_err(|e| FetchError::shape(origin, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_without_meta_has_no_next() {
        let page: Page<RouterRef> = serde_json::from_value(json!({"data": [{"id": 1}]})).unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.meta.next.is_none());
    }

    #[test]
    fn router_ids_accept_numbers_and_strings() {
        let numeric = RouterRef { id: json!(1234) };
        let text = RouterRef { id: json!("5678") };
        assert_eq!(numeric.device_id("u").unwrap().as_str(), "1234");
        assert_eq!(text.device_id("u").unwrap().as_str(), "5678");
        assert!(RouterRef { id: json!(null) }.device_id("u").is_err());
    }

    #[test]
    fn first_document_takes_updates() {
        let doc = first_document(json!([{"system": {"ui": true}}, []]), "group 1").unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn first_document_empty_pair_is_empty() {
        assert!(first_document(json!([]), "group 1").unwrap().is_empty());
        assert!(first_document(json!([null, []]), "group 1").unwrap().is_empty());
    }

    #[test]
    fn first_document_rejects_scalars() {
        let err = first_document(json!(["oops", []]), "device 7").unwrap_err();
        assert!(matches!(err, FetchError::Shape { ref origin, .. } if origin == "device 7"));
    }
}
