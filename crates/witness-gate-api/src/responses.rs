//! Response types returned by the HTTP endpoints.

use serde::Serialize;
use std::collections::BTreeMap;
use witness_gate_core::{
    AuditRecord, ContentAddress, EventKind, GateIdentity, NormalizedEvent, Timestamp,
};

// ============================================================================
// Webhook Responses
// ============================================================================

/// Accepted event: proof produced
#[derive(Debug, Serialize)]
pub struct ProcessedResponse {
    pub status: &'static str,
    pub gate: String,
    pub domain: String,
    pub role: String,
    pub action: String,
    pub event: NormalizedEvent,
    pub proof_hash: String,
    pub witness_ref: Option<ContentAddress>,
    pub witness_url: Option<String>,
}

impl ProcessedResponse {
    pub fn new(gate: &GateIdentity, record: AuditRecord) -> Self {
        Self {
            status: "processed",
            gate: gate.name.to_string(),
            domain: gate.domain.clone(),
            role: gate.role.clone(),
            action: gate.action.clone(),
            event: record.event,
            proof_hash: record.proof.proof_hash,
            witness_ref: record.witness_ref,
            witness_url: record.witness_url,
        }
    }
}

/// Signed event of a kind the gate does not act on
#[derive(Debug, Serialize)]
pub struct AcknowledgedResponse {
    pub status: &'static str,
    pub gate: String,
    pub domain: String,
    pub role: String,
    pub action: String,
    pub event: EventKind,
    pub message: &'static str,
}

impl AcknowledgedResponse {
    pub fn new(gate: &GateIdentity, kind: EventKind) -> Self {
        Self {
            status: "received",
            gate: gate.name.to_string(),
            domain: gate.domain.clone(),
            role: gate.role.clone(),
            action: gate.action.clone(),
            event: kind,
            message: "received, not processed",
        }
    }
}

/// Shared-endpoint request whose host matched no gate
#[derive(Debug, Serialize)]
pub struct UnroutedResponse {
    pub status: &'static str,
    pub routed: bool,
    pub message: &'static str,
}

impl Default for UnroutedResponse {
    fn default() -> Self {
        Self {
            status: "received",
            routed: false,
            message: "received, unrouted",
        }
    }
}

// ============================================================================
// Health Responses
// ============================================================================

/// Public description of a gate; never carries the secret
#[derive(Debug, Serialize)]
pub struct GateSummary {
    pub name: String,
    pub domain: String,
    pub role: String,
    pub accepted_event: EventKind,
    pub action: String,
    pub secret_type: &'static str,
}

impl From<&GateIdentity> for GateSummary {
    fn from(gate: &GateIdentity) -> Self {
        Self {
            name: gate.name.to_string(),
            domain: gate.domain.clone(),
            role: gate.role.clone(),
            accepted_event: gate.accepted_event,
            action: gate.action.clone(),
            secret_type: gate.secret_source.label(),
        }
    }
}

/// Content store status as seen by the health endpoint
#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub backend: String,
    /// `None` when no store is configured
    pub healthy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health check response
///
/// `status` stays `healthy` while the store is down: the gateway keeps
/// answering webhooks in degraded mode.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub gates: BTreeMap<String, GateSummary>,
    pub witness_cid: Option<ContentAddress>,
    pub store: StoreStatus,
    pub version: &'static str,
    pub timestamp: Timestamp,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub gates: usize,
    pub timestamp: Timestamp,
}
