//! Content store construction from configuration.

use crate::config::{StoreConfig, StoreKind};
use crate::errors::{ConfigError, ServiceError};
use std::sync::Arc;
use tracing::info;
use witness_gate_core::{ContentStore, FilesystemContentStore, IpfsHttpStore, MemoryContentStore};

/// Build the configured content store
///
/// Returns `Ok(None)` for `kind: none`. The store is not probed here; an
/// unreachable IPFS node only degrades requests, it does not stop startup.
pub async fn build_content_store(
    config: &StoreConfig,
) -> Result<Option<Arc<dyn ContentStore>>, ServiceError> {
    let store: Arc<dyn ContentStore> = match config.kind {
        StoreKind::None => {
            info!("No content store configured; witness references will be null");
            return Ok(None);
        }
        StoreKind::Memory => Arc::new(MemoryContentStore::new()),
        StoreKind::Filesystem => {
            let base_path = config.base_path.clone().ok_or_else(|| ConfigError::Missing {
                key: "store.base_path".to_string(),
            })?;
            Arc::new(FilesystemContentStore::new(base_path).await?)
        }
        StoreKind::Ipfs => {
            let api_url = config.api_url()?.ok_or_else(|| ConfigError::Missing {
                key: "store.api_url".to_string(),
            })?;
            let gateway_url = config.gateway_url()?;
            Arc::new(IpfsHttpStore::new(
                &api_url,
                gateway_url.as_ref(),
                config.timeout(),
            )?)
        }
    };

    info!(backend = store.backend(), timeout_ms = config.timeout_ms, "Content store ready");
    Ok(Some(store))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
