//! # Witness-Gate Core
//!
//! Core business logic for the witness-gate dual-tenant webhook gateway.
//!
//! This crate contains the domain logic for verifying signed CI callbacks,
//! classifying them into a normalized event, deriving a tamper-evident proof,
//! and writing an audit record through to a content-addressed store.
//!
//! ## Architecture
//!
//! - Business logic depends only on trait abstractions ([`ContentStore`], [`AuditHook`])
//! - Infrastructure implementations live in [`adapters`] and are injected at startup
//! - Gate configuration is immutable after construction and shared by reference
//!
//! ## Usage
//!
//! ```rust
//! use witness_gate_core::{GateName, Timestamp};
//!
//! let gate = GateName::new("gateA").unwrap();
//! assert_eq!(gate.as_str(), "gateA");
//!
//! let now = Timestamp::now();
//! assert!(!now.to_rfc3339().is_empty());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Name of a configured gate (tenant) within the gateway
///
/// Gate names appear verbatim as URL path segments (`POST /{gate}/webhook`),
/// so they are restricted to URL-safe characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateName(String);

impl GateName {
    /// Create new gate name with validation
    ///
    /// # Validation Rules
    /// - Must be 1-64 characters
    /// - Must contain only ASCII alphanumeric characters, hyphens, and underscores
    /// - Must not start or end with a hyphen
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "gate_name".to_string(),
            });
        }

        if name.len() > 64 {
            return Err(ValidationError::TooLong {
                field: "gate_name".to_string(),
                max_length: 64,
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidCharacters {
                field: "gate_name".to_string(),
                invalid_chars: "non-alphanumeric except hyphens and underscores".to_string(),
            });
        }

        if name.starts_with('-') || name.ends_with('-') {
            return Err(ValidationError::InvalidFormat {
                field: "gate_name".to_string(),
                message: "cannot start or end with hyphen".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GateName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

// ============================================================================
// Time Types
// ============================================================================

/// UTC timestamp with nanosecond precision
///
/// Serializes as an RFC3339 string, which makes it part of the canonical
/// proof input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse timestamp from RFC3339 string
    pub fn from_rfc3339(s: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "RFC3339 datetime".to_string(),
                actual: s.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    TooLong { field: String, max_length: usize },

    #[error("Field '{field}' contains invalid characters: {invalid_chars}")]
    InvalidCharacters {
        field: String,
        invalid_chars: String,
    },
}

/// Error type for string parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

// ============================================================================
// Module declarations
// ============================================================================

/// Raw webhook request capture
pub mod webhook;

/// HMAC-SHA256 signature verification
pub mod signature;

/// Payload classification and normalization
pub mod event;

/// Deterministic proof derivation
pub mod proof;

/// Content-addressed store collaborator interface
pub mod content_store;

/// Content store implementations
pub mod adapters;

/// Per-tenant gate pipeline
pub mod gate;

/// Post-processing callbacks for accepted events
pub mod hooks;

/// Startup witness manifest
pub mod witness;

// Re-export key types for convenience
pub use adapters::{FilesystemContentStore, IpfsHttpStore, MemoryContentStore};
pub use content_store::{ContentAddress, ContentStore, StoreError, StoreHealth};
pub use event::{
    EventKind, EventParser, NormalizedEvent, RepositoryInfo, SenderInfo, WorkflowInfo,
};
pub use gate::{
    AuditRecord, GateError, GateHandler, GateIdentity, GateOutcome, GateSecret, SecretSource,
};
pub use hooks::{AuditHook, TracingAuditHook};
pub use proof::{ProofError, ProofGenerator, ProofRecord};
pub use signature::SignatureVerifier;
pub use webhook::RawWebhookRequest;
pub use witness::WitnessManifest;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
