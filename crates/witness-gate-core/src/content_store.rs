//! # Content Store Interface
//!
//! Abstraction over a content-addressed store: bytes go in, an address derived
//! from those bytes comes out, and the same address reads them back.
//!
//! The gateway treats every store as optional. Gate handlers catch all
//! [`StoreError`]s and degrade to a `null` witness reference, so nothing in
//! this module is allowed to affect whether a webhook is acknowledged.

use crate::ValidationError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Utility Functions
// ============================================================================

/// Compute SHA-256 checksum of data
///
/// # Examples
///
/// ```
/// use witness_gate_core::content_store::compute_checksum;
///
/// let checksum = compute_checksum(b"test data");
/// assert_eq!(checksum.len(), 64);
/// ```
pub fn compute_checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// ============================================================================
// Content Address
// ============================================================================

/// Address of a stored blob
///
/// Either a CID returned by an IPFS-style API or a locally derived
/// `sha256-<hex>` address. Addresses are restricted to ASCII alphanumerics and
/// hyphens so they are always safe as file names and URL segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentAddress(String);

impl ContentAddress {
    const MAX_LENGTH: usize = 128;

    /// Create a validated content address
    pub fn new(address: impl Into<String>) -> Result<Self, ValidationError> {
        let address = address.into();

        if address.is_empty() {
            return Err(ValidationError::Required {
                field: "content_address".to_string(),
            });
        }

        if address.len() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                field: "content_address".to_string(),
                max_length: Self::MAX_LENGTH,
            });
        }

        if !address.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::InvalidCharacters {
                field: "content_address".to_string(),
                invalid_chars: "non-alphanumeric except hyphens".to_string(),
            });
        }

        Ok(Self(address))
    }

    /// Derive the local address for a blob from its SHA-256 digest
    pub fn from_content(data: &[u8]) -> Self {
        Self(format!("sha256-{}", compute_checksum(data)))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentAddress> for String {
    fn from(address: ContentAddress) -> Self {
        address.0
    }
}

impl std::str::FromStr for ContentAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim().to_string())
    }
}

// ============================================================================
// Core Trait
// ============================================================================

/// Content-addressed add/cat store
///
/// Implementations must be safe for concurrent use by many in-flight
/// requests. Storing identical bytes twice yields the same address.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their address
    async fn add(&self, content: Bytes) -> Result<ContentAddress, StoreError>;

    /// Read the bytes stored at `address`
    async fn cat(&self, address: &ContentAddress) -> Result<Bytes, StoreError>;

    /// Public URL for `address`, if this store has a gateway
    fn gateway_url(&self, address: &ContentAddress) -> Option<String>;

    /// Probe store reachability
    async fn health_check(&self) -> StoreHealth;

    /// Short backend label for health and logs (`memory`, `filesystem`, `ipfs`)
    fn backend(&self) -> &'static str;
}

/// Result of a store health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHealth {
    pub healthy: bool,
    pub message: Option<String>,
}

impl StoreHealth {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            message: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during content store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store could not be reached
    #[error("Content store unavailable: {message}")]
    Unavailable { message: String },

    /// Store call exceeded its deadline
    #[error("Content store call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Content not found: {address}")]
    NotFound { address: String },

    /// Store answered with a non-success status
    #[error("Content store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from content store: {message}")]
    InvalidResponse { message: String },

    /// Stored bytes no longer match their address
    #[error("Checksum mismatch for {address}")]
    ChecksumMismatch { address: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl StoreError {
    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } | Self::Timeout { .. } | Self::Io { .. } => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::NotFound { .. }
            | Self::InvalidResponse { .. }
            | Self::ChecksumMismatch { .. }
            | Self::Serialization { .. } => false,
        }
    }
}

#[cfg(test)]
#[path = "content_store_tests.rs"]
mod tests;
