//! # IPFS HTTP API Content Store
//!
//! Client for an IPFS-compatible HTTP API (`/api/v0/add`, `/api/v0/cat`).
//! Addresses are the CIDs returned by the node; public links are resolved
//! through an optional gateway as `{gateway}/ipfs/{cid}`.

use crate::content_store::{ContentAddress, ContentStore, StoreError, StoreHealth};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// IPFS-style HTTP API client
#[derive(Debug, Clone)]
pub struct IpfsHttpStore {
    http_client: reqwest::Client,
    api_base: String,
    gateway_base: Option<String>,
    timeout: Duration,
}

/// Response body of `/api/v0/add`
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsHttpStore {
    /// Create a client for the API at `api_url`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the HTTP client cannot be built.
    pub fn new(
        api_url: &Url,
        gateway_url: Option<&Url>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("witness-gate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Unavailable {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_base: trim_base(api_url),
            gateway_base: gateway_url.map(trim_base),
            timeout,
        })
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/api/v0/{}", self.api_base, command)
    }

    fn map_send_error(&self, error: reqwest::Error) -> StoreError {
        if error.is_timeout() {
            StoreError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            StoreError::Unavailable {
                message: error.to_string(),
            }
        }
    }

    async fn rejected(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        if status == 404 || message.contains("not found") {
            return StoreError::NotFound { address: message };
        }
        StoreError::Rejected { status, message }
    }
}

fn trim_base(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

#[async_trait]
impl ContentStore for IpfsHttpStore {
    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn add(&self, content: Bytes) -> Result<ContentAddress, StoreError> {
        let part = Part::bytes(content.to_vec())
            .file_name("witness.json")
            .mime_str("application/json")
            .map_err(|e| StoreError::Serialization {
                message: e.to_string(),
            })?;
        let form = Form::new().part("file", part);

        let response = self
            .http_client
            .post(self.endpoint("add"))
            .query(&[("pin", "true"), ("cid-version", "1")])
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let body: AddResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse {
                message: format!("Failed to parse add response: {}", e),
            })?;

        let address = ContentAddress::new(body.hash).map_err(|e| StoreError::InvalidResponse {
            message: format!("Store returned an invalid address: {}", e),
        })?;

        debug!(address = %address, "Content added");
        Ok(address)
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn cat(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        let response = self
            .http_client
            .post(self.endpoint("cat"))
            .query(&[("arg", address.as_str())])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(match Self::rejected(response).await {
                StoreError::NotFound { .. } => StoreError::NotFound {
                    address: address.to_string(),
                },
                other => other,
            });
        }

        response.bytes().await.map_err(|e| self.map_send_error(e))
    }

    fn gateway_url(&self, address: &ContentAddress) -> Option<String> {
        self.gateway_base
            .as_ref()
            .map(|base| format!("{}/ipfs/{}", base, address))
    }

    async fn health_check(&self) -> StoreHealth {
        match self.http_client.post(self.endpoint("version")).send().await {
            Ok(response) if response.status().is_success() => StoreHealth::healthy(),
            Ok(response) => StoreHealth::unhealthy(format!(
                "Store API returned status {}",
                response.status()
            )),
            Err(e) => StoreHealth::unhealthy(self.map_send_error(e).to_string()),
        }
    }

    fn backend(&self) -> &'static str {
        "ipfs"
    }
}

#[cfg(test)]
#[path = "ipfs_http_store_tests.rs"]
mod tests;
