//! # Filesystem Content Store
//!
//! Local filesystem implementation of [`ContentStore`] for single-node
//! deployments and development. Each blob is one file named after its
//! `sha256-<hex>` address.

use crate::content_store::{ContentAddress, ContentStore, StoreError, StoreHealth};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem-based content store
///
/// Writes are atomic (temp file then rename) and idempotent: an address that
/// already exists on disk is not rewritten. Reads re-hash the file and fail
/// with [`StoreError::ChecksumMismatch`] if it was modified.
///
/// # Examples
///
/// ```no_run
/// use witness_gate_core::FilesystemContentStore;
/// use std::path::PathBuf;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FilesystemContentStore::new(PathBuf::from("./data/witness")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemContentStore {
    base_path: PathBuf,
}

impl FilesystemContentStore {
    /// Create new filesystem store, creating `base_path` if needed
    pub async fn new(base_path: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| StoreError::Io {
                message: format!("Failed to create base directory: {}", e),
            })?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn blob_path(&self, address: &ContentAddress) -> PathBuf {
        self.base_path.join(address.as_str())
    }

    fn temp_path(&self, address: &ContentAddress) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.base_path
            .join(format!(".{}.{}.{}.tmp", address, std::process::id(), n))
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    async fn add(&self, content: Bytes) -> Result<ContentAddress, StoreError> {
        let address = ContentAddress::from_content(&content);
        let blob_path = self.blob_path(&address);

        if fs::try_exists(&blob_path).await.unwrap_or(false) {
            debug!(address = %address, "Content already stored");
            return Ok(address);
        }

        let temp_path = self.temp_path(&address);
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| StoreError::Io {
                message: format!("Failed to create temp file: {}", e),
            })?;

        file.write_all(&content).await.map_err(|e| StoreError::Io {
            message: format!("Failed to write content: {}", e),
        })?;

        file.flush().await.map_err(|e| StoreError::Io {
            message: format!("Failed to flush file: {}", e),
        })?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::Io {
                message: format!("Failed to rename temp file: {}", e),
            });
        }

        Ok(address)
    }

    async fn cat(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        let blob_path = self.blob_path(address);

        let data = match fs::read(&blob_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    address: address.to_string(),
                })
            }
            Err(e) => {
                return Err(StoreError::Io {
                    message: format!("Failed to read blob: {}", e),
                })
            }
        };

        if ContentAddress::from_content(&data) != *address {
            return Err(StoreError::ChecksumMismatch {
                address: address.to_string(),
            });
        }

        Ok(Bytes::from(data))
    }

    fn gateway_url(&self, _address: &ContentAddress) -> Option<String> {
        None
    }

    async fn health_check(&self) -> StoreHealth {
        match fs::metadata(&self.base_path).await {
            Ok(meta) if meta.is_dir() => StoreHealth::healthy(),
            Ok(_) => StoreHealth::unhealthy("Base path is not a directory"),
            Err(e) => StoreHealth::unhealthy(format!("Base path not accessible: {}", e)),
        }
    }

    fn backend(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
#[path = "filesystem_store_tests.rs"]
mod tests;
