//! # Gate Handler
//!
//! One gate is one tenant of the gateway: a secret, the single event kind it
//! acts on, and the action tag stamped into its proofs. Every request handled
//! by a gate moves through the same states:
//!
//! ```text
//! Received -> SignatureChecked -> invalid: Rejected
//!                              -> valid: Classified -> other kind: Acknowledged
//!                                                   -> accepted kind: ProofGenerated
//!                                                        -> Stored{ok|degraded} -> Processed
//! ```
//!
//! Only a bad signature is an error. A kind mismatch is acknowledged without
//! a proof, and a store failure degrades to a `None` witness reference.

use crate::content_store::{ContentAddress, ContentStore, StoreError};
use crate::event::{EventKind, EventParser, NormalizedEvent};
use crate::hooks::AuditHook;
use crate::proof::{ProofError, ProofGenerator, ProofRecord};
use crate::signature::SignatureVerifier;
use crate::webhook::RawWebhookRequest;
use crate::{GateName, Timestamp};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

/// Default bound on a single witness write
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(5000);

// ============================================================================
// Gate Identity
// ============================================================================

/// HMAC secret for one gate
///
/// The value is zeroed on drop and never appears in `Debug` output.
#[derive(Clone)]
pub struct GateSecret(Zeroizing<String>);

impl GateSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the raw secret for signing or verification
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for GateSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateSecret")
            .field("value", &"<REDACTED>")
            .finish()
    }
}

/// Where a gate's secret was loaded from
///
/// Only this label is ever reported externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSource {
    Literal,
    Env,
}

impl SecretSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Env => "env",
        }
    }
}

/// Immutable configuration of one gate
#[derive(Debug, Clone)]
pub struct GateIdentity {
    pub name: GateName,
    pub domain: String,
    pub role: String,
    pub accepted_event: EventKind,
    pub action: String,
    pub secret: GateSecret,
    pub secret_source: SecretSource,
    /// Host substrings that route the shared endpoint to this gate
    pub domains: Vec<String>,
}

impl GateIdentity {
    /// Check whether a `Host` header value names this gate
    ///
    /// Case-insensitive substring match against each configured domain.
    /// Empty domain entries never match.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.domains
            .iter()
            .map(|d| d.trim().to_ascii_lowercase())
            .any(|d| !d.is_empty() && host.contains(&d))
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Persisted result of an accepted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event: NormalizedEvent,
    pub proof: ProofRecord,
    pub witness_ref: Option<ContentAddress>,
    pub witness_url: Option<String>,
    pub delivery_id: Option<String>,
    pub stored_at: Timestamp,
}

/// Result of a request that passed signature verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Event matched the gate's kind; a proof was produced
    Processed(AuditRecord),

    /// Event kind is not the one this gate acts on
    Acknowledged { kind: EventKind },
}

/// Gate processing errors
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Invalid signature for gate '{gate}'")]
    InvalidSignature { gate: String },

    #[error("Proof generation failed: {0}")]
    Proof(#[from] ProofError),
}

/// Document written to the content store for an accepted event
#[derive(Serialize)]
struct WitnessDocument<'a> {
    gate: &'a str,
    delivery_id: Option<&'a str>,
    declared_kind: Option<&'a str>,
    event: &'a NormalizedEvent,
    proof: &'a ProofRecord,
    stored_at: &'a Timestamp,
}

// ============================================================================
// Handler
// ============================================================================

/// Pipeline for one gate
///
/// # Examples
///
/// ```rust
/// use witness_gate_core::{
///     EventKind, GateHandler, GateIdentity, GateName, GateSecret, SecretSource,
/// };
///
/// let identity = GateIdentity {
///     name: GateName::new("gateA").unwrap(),
///     domain: "identity.example".to_string(),
///     role: "completion".to_string(),
///     accepted_event: EventKind::WorkflowRun,
///     action: "identity".to_string(),
///     secret: GateSecret::new("gate-a-secret"),
///     secret_source: SecretSource::Literal,
///     domains: vec!["identity.example".to_string()],
/// };
///
/// let handler = GateHandler::new(identity);
/// assert_eq!(handler.identity().name.as_str(), "gateA");
/// ```
pub struct GateHandler {
    identity: Arc<GateIdentity>,
    store: Option<Arc<dyn ContentStore>>,
    store_timeout: Duration,
    hooks: Vec<Arc<dyn AuditHook>>,
}

impl GateHandler {
    pub fn new(identity: GateIdentity) -> Self {
        Self {
            identity: Arc::new(identity),
            store: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            hooks: Vec::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Append a post-processing hook; hooks run in the order added
    pub fn with_hook(mut self, hook: Arc<dyn AuditHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn identity(&self) -> &GateIdentity {
        &self.identity
    }

    /// Run one request through the gate
    ///
    /// # Errors
    ///
    /// [`GateError::InvalidSignature`] when the signature is absent or does
    /// not match. Nothing is parsed or stored in that case.
    #[instrument(
        skip(self, request),
        fields(gate = %self.identity.name, delivery_id = request.delivery_id())
    )]
    pub async fn handle(&self, request: &RawWebhookRequest) -> Result<GateOutcome, GateError> {
        let identity = &self.identity;

        if !SignatureVerifier::verify(
            &request.body,
            request.signature(),
            identity.secret.expose(),
        ) {
            warn!(
                signature_present = request.signature().is_some(),
                user_agent = request.user_agent(),
                "Webhook signature verification failed"
            );
            return Err(GateError::InvalidSignature {
                gate: identity.name.to_string(),
            });
        }

        let event = EventParser::normalize_at(&request.payload, request.received_at);

        if let Some(declared) = request.declared_kind() {
            if declared != event.kind.as_str() {
                debug!(
                    declared_kind = declared,
                    inferred_kind = %event.kind,
                    "Declared event kind differs from payload structure"
                );
            }
        }

        if event.kind != identity.accepted_event {
            info!(
                event_kind = %event.kind,
                accepted_event = %identity.accepted_event,
                "Event received, not processed by this gate"
            );
            return Ok(GateOutcome::Acknowledged { kind: event.kind });
        }

        let proof = ProofGenerator::generate(identity.name.as_str(), &event, &identity.action)?;

        let stored_at = Timestamp::now();
        let witness_ref = match self.persist(request, &event, &proof, &stored_at).await {
            Ok(address) => address,
            Err(error) => {
                warn!(
                    error = %error,
                    transient = error.is_transient(),
                    "Witness write failed; continuing without witness reference"
                );
                self.notify_degraded(Some(&error));
                None
            }
        };

        let witness_url = match (&self.store, &witness_ref) {
            (Some(store), Some(address)) => store.gateway_url(address),
            _ => None,
        };

        let record = AuditRecord {
            event,
            proof,
            witness_ref,
            witness_url,
            delivery_id: request.delivery_id().map(str::to_string),
            stored_at,
        };

        info!(
            event_kind = %record.event.kind,
            proof_hash = %record.proof.proof_hash,
            witnessed = record.witness_ref.is_some(),
            "Event processed"
        );

        for hook in &self.hooks {
            hook.on_audit(identity, &record);
        }

        Ok(GateOutcome::Processed(record))
    }

    /// Write the witness document, bounded by the store timeout
    ///
    /// Returns `Ok(None)` when no store is configured.
    async fn persist(
        &self,
        request: &RawWebhookRequest,
        event: &NormalizedEvent,
        proof: &ProofRecord,
        stored_at: &Timestamp,
    ) -> Result<Option<ContentAddress>, StoreError> {
        let Some(store) = &self.store else {
            warn!("No content store configured; witness reference will be null");
            self.notify_degraded(None);
            return Ok(None);
        };

        let document = WitnessDocument {
            gate: self.identity.name.as_str(),
            delivery_id: request.delivery_id(),
            declared_kind: request.declared_kind(),
            event,
            proof,
            stored_at,
        };
        let bytes = serde_jcs::to_vec(&document).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;

        match tokio::time::timeout(self.store_timeout, store.add(Bytes::from(bytes))).await {
            Ok(result) => result.map(Some),
            Err(_) => Err(StoreError::Timeout {
                timeout_ms: self.store_timeout.as_millis() as u64,
            }),
        }
    }

    fn notify_degraded(&self, error: Option<&StoreError>) {
        for hook in &self.hooks {
            hook.on_store_degraded(&self.identity, error);
        }
    }
}

impl fmt::Debug for GateHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateHandler")
            .field("identity", &self.identity)
            .field("store", &self.store.as_ref().map(|s| s.backend()))
            .field("store_timeout", &self.store_timeout)
            .field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
