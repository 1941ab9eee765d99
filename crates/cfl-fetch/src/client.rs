//! Management API client
//!
//! Every request goes through [`EcmClient::get_json`], which retries
//! transport failures and the configured throttling/gateway statuses with a
//! doubling backoff. Listing endpoints are followed through `meta.next`.

use crate::config::{ApiConfig, Credentials, RetryPolicy};
use crate::error::FetchError;
use crate::payload::{
    first_document, ConfigurationManager, GroupConfiguration, GroupFirmware, Page, RouterRef,
};
use crate::source::{ConfigSource, GroupId};
use async_trait::async_trait;
use cfl_tree::{ConfigDocument, DeviceId};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Client for the remote management API
#[derive(Debug, Clone)]
pub struct EcmClient {
    http: reqwest::Client,
    config: ApiConfig,
    retry: RetryPolicy,
}

impl EcmClient {
    /// Build a client sending `credentials` with every request
    pub fn new(config: ApiConfig, credentials: &Credentials) -> Result<Self, FetchError> {
        let headers = auth_headers(credentials)?;
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;
        let retry = config.retry_policy();
        Ok(Self {
            http,
            config,
            retry,
        })
    }

    /// Settings in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// GET a url and decode its JSON body, retrying per policy
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let attempts = self.retry.max_retries.saturating_add(1);
        let mut last = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.retry.delay(attempt);
                tracing::warn!(
                    url,
                    attempt,
                    max_retries = self.retry.max_retries,
                    ?delay,
                    error = %last,
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.http.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    last = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let body = response.bytes().await?;
                return serde_json::from_slice(&body)
                    .map_err(|e| FetchError::payload(url, e.to_string()));
            }
            if !self.retry.retries_status(status.as_u16()) {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            last = format!("status {status}");
        }

        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts,
            last,
        })
    }

    /// Collect every page of a listing, starting at `url`
    pub async fn collect_pages<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>, FetchError> {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let page: Page<T> = self.get_json(&url).await?;
            tracing::debug!(url = %url, records = page.data.len(), "page received");
            items.extend(page.data);
            next = page.meta.next.filter(|n| !n.is_empty());
        }
        Ok(items)
    }
}

#[async_trait]
impl ConfigSource for EcmClient {
    async fn device_ids(&self, group: &GroupId) -> Result<Vec<DeviceId>, FetchError> {
        let url = routers_url(&self.config, group);
        let routers: Vec<RouterRef> = self.collect_pages(url.clone()).await?;
        routers.iter().map(|r| r.device_id(&url)).collect()
    }

    async fn group_configuration(&self, group: &GroupId) -> Result<ConfigDocument, FetchError> {
        let url = group_configuration_url(&self.config, group);
        let body: GroupConfiguration = self.get_json(&url).await?;
        first_document(body.configuration, &format!("group {group}"))
    }

    async fn device_configurations(
        &self,
        devices: &[DeviceId],
    ) -> Result<Vec<(DeviceId, ConfigDocument)>, FetchError> {
        if devices.is_empty() {
            return Ok(Vec::new());
        }
        let url = configuration_managers_url(&self.config, devices);
        let managers: Vec<ConfigurationManager> = self.collect_pages(url.clone()).await?;
        managers
            .into_iter()
            .map(|manager| {
                let id = manager.router.device_id(&url)?;
                let doc = first_document(manager.configuration, &format!("device {id}"))?;
                Ok((id, doc))
            })
            .collect()
    }

    async fn default_configuration(&self, group: &GroupId) -> Result<Value, FetchError> {
        let url = group_firmware_url(&self.config, group);
        let firmware: GroupFirmware = self.get_json(&url).await?;
        let url = default_configuration_url(&firmware.target_firmware);
        self.get_json(&url).await
    }
}

fn auth_headers(credentials: &Credentials) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("x-cp-api-id", &credentials.cp_api_id),
        ("x-cp-api-key", &credentials.cp_api_key),
        ("x-ecm-api-id", &credentials.ecm_api_id),
        ("x-ecm-api-key", &credentials.ecm_api_key),
    ];
    for (name, value) in pairs {
        let mut value = HeaderValue::from_str(value)
            .map_err(|_| FetchError::InvalidCredentials(format!("{name} is not a valid header value")))?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(name), value);
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

pub(crate) fn routers_url(config: &ApiConfig, group: &GroupId) -> String {
    format!(
        "{}/routers/?group={group}&fields=id&limit={}",
        config.base(),
        config.page_limit
    )
}

pub(crate) fn group_configuration_url(config: &ApiConfig, group: &GroupId) -> String {
    format!("{}/groups/{group}/?fields=configuration", config.base())
}

pub(crate) fn configuration_managers_url(config: &ApiConfig, devices: &[DeviceId]) -> String {
    let ids = devices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{}/configuration_managers/?router__in={ids}&expand=router&limit={}",
        config.base(),
        config.page_limit
    )
}

pub(crate) fn group_firmware_url(config: &ApiConfig, group: &GroupId) -> String {
    format!("{}/groups/{group}/?fields=target_firmware", config.base())
}

/// `target_firmware` is an absolute resource url ending in `/`
pub(crate) fn default_configuration_url(target_firmware: &str) -> String {
    if target_firmware.ends_with('/') {
        format!("{target_firmware}default_configuration/")
    } else {
        format!("{target_firmware}/default_configuration/")
    }
}
