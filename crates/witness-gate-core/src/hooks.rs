//! # Post-Processing Hooks
//!
//! Observers notified after a gate has produced an [`AuditRecord`]. Hooks run
//! synchronously, in registration order, once the pipeline has finished; they
//! cannot change the outcome of the request.

use crate::content_store::StoreError;
use crate::gate::{AuditRecord, GateIdentity};
use tracing::info;

/// Observer for accepted events
pub trait AuditHook: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Called once for every produced audit record
    fn on_audit(&self, gate: &GateIdentity, record: &AuditRecord);

    /// Called when the witness write failed or no store was configured
    fn on_store_degraded(&self, _gate: &GateIdentity, _error: Option<&StoreError>) {}
}

/// Emits one structured `info` event per audit record
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditHook;

impl AuditHook for TracingAuditHook {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_audit(&self, gate: &GateIdentity, record: &AuditRecord) {
        info!(
            gate = %gate.name,
            action = %gate.action,
            event_kind = %record.event.kind,
            proof_hash = %record.proof.proof_hash,
            witness_ref = record.witness_ref.as_ref().map(|a| a.as_str()),
            delivery_id = record.delivery_id.as_deref(),
            "Audit record produced"
        );
    }
}
