//! Startup witness manifest.
//!
//! Published once when the service starts so the running gate configuration
//! (minus secrets) is itself content-addressed. The resulting address is
//! reported by the health endpoint as `witness_cid`.

use crate::content_store::{ContentAddress, ContentStore, StoreError};
use crate::event::EventKind;
use crate::gate::GateIdentity;
use crate::Timestamp;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Public description of one gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestGate {
    pub name: String,
    pub domain: String,
    pub role: String,
    pub accepted_event: EventKind,
    pub action: String,
    pub secret_type: String,
    pub domains: Vec<String>,
}

impl From<&GateIdentity> for ManifestGate {
    fn from(identity: &GateIdentity) -> Self {
        Self {
            name: identity.name.to_string(),
            domain: identity.domain.clone(),
            role: identity.role.clone(),
            accepted_event: identity.accepted_event,
            action: identity.action.clone(),
            secret_type: identity.secret_source.label().to_string(),
            domains: identity.domains.clone(),
        }
    }
}

/// Manifest of the gateway configuration at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessManifest {
    pub service: String,
    pub version: String,
    pub gates: Vec<ManifestGate>,
    pub started_at: Timestamp,
}

impl WitnessManifest {
    pub fn new<'a>(gates: impl IntoIterator<Item = &'a GateIdentity>, started_at: Timestamp) -> Self {
        Self {
            service: "witness-gate".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            gates: gates.into_iter().map(ManifestGate::from).collect(),
            started_at,
        }
    }

    /// JCS canonical encoding
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, StoreError> {
        serde_jcs::to_vec(self).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })
    }

    /// Store the manifest, returning its address
    pub async fn publish(
        &self,
        store: &dyn ContentStore,
        timeout: Duration,
    ) -> Result<ContentAddress, StoreError> {
        let bytes = Bytes::from(self.to_canonical_bytes()?);
        let address = match tokio::time::timeout(timeout, store.add(bytes)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(StoreError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        info!(witness_cid = %address, gates = self.gates.len(), "Witness manifest published");
        Ok(address)
    }

    /// Publish if a store is available, logging instead of failing
    pub async fn publish_best_effort(
        &self,
        store: Option<&dyn ContentStore>,
        timeout: Duration,
    ) -> Option<ContentAddress> {
        let store = store?;
        match self.publish(store, timeout).await {
            Ok(address) => Some(address),
            Err(error) => {
                warn!(error = %error, "Failed to publish witness manifest");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "witness_tests.rs"]
mod tests;
