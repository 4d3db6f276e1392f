//! # In-Memory Content Store
//!
//! Process-local store for development and tests. Addresses are
//! `sha256-<hex>` digests of the stored bytes.

use crate::content_store::{ContentAddress, ContentStore, StoreError, StoreHealth};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory content store
///
/// Clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    blobs: Arc<RwLock<HashMap<ContentAddress, Bytes>>>,
}

impl MemoryContentStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn add(&self, content: Bytes) -> Result<ContentAddress, StoreError> {
        let address = ContentAddress::from_content(&content);
        self.blobs
            .write()
            .await
            .entry(address.clone())
            .or_insert(content);
        Ok(address)
    }

    async fn cat(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        self.blobs
            .read()
            .await
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                address: address.to_string(),
            })
    }

    fn gateway_url(&self, _address: &ContentAddress) -> Option<String> {
        None
    }

    async fn health_check(&self) -> StoreHealth {
        StoreHealth::healthy()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[path = "memory_store_tests.rs"]
mod tests;
