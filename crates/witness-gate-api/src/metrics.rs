//! Metrics collection and observability types for the API service.

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use witness_gate_core::{AuditHook, AuditRecord, GateIdentity, StoreError};

/// Service metrics for observability
///
/// Each instance owns its registry so several routers can coexist in one
/// process (tests build many).
pub struct ServiceMetrics {
    registry: Registry,

    // HTTP request metrics
    pub http_requests_total: IntCounterVec,

    // Webhook pipeline metrics
    pub webhook_requests_total: IntCounterVec,
    pub signature_failures_total: IntCounterVec,
    pub unrouted_requests_total: IntCounter,
    pub gate_processing_duration_seconds: HistogramVec,

    // Audit trail metrics
    pub audit_records_total: IntCounterVec,
    pub store_degradations_total: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "status"],
        )?;
        let webhook_requests_total = IntCounterVec::new(
            Opts::new(
                "webhook_requests_total",
                "Webhook requests handled, by gate and outcome",
            ),
            &["gate", "outcome"],
        )?;
        let signature_failures_total = IntCounterVec::new(
            Opts::new(
                "signature_failures_total",
                "Webhooks rejected for an absent or wrong signature",
            ),
            &["gate"],
        )?;
        let unrouted_requests_total = IntCounter::new(
            "unrouted_requests_total",
            "Shared-endpoint webhooks whose host matched no gate",
        )?;
        let gate_processing_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "gate_processing_duration_seconds",
                "Time from request receipt to gate outcome",
            )
            .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0]),
            &["gate"],
        )?;
        let audit_records_total = IntCounterVec::new(
            Opts::new("audit_records_total", "Audit records produced"),
            &["gate"],
        )?;
        let store_degradations_total = IntCounterVec::new(
            Opts::new(
                "store_degradations_total",
                "Accepted events recorded without a witness reference",
            ),
            &["gate"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(webhook_requests_total.clone()))?;
        registry.register(Box::new(signature_failures_total.clone()))?;
        registry.register(Box::new(unrouted_requests_total.clone()))?;
        registry.register(Box::new(gate_processing_duration_seconds.clone()))?;
        registry.register(Box::new(audit_records_total.clone()))?;
        registry.register(Box::new(store_degradations_total.clone()))?;

        Ok(Arc::new(Self {
            registry,
            http_requests_total,
            webhook_requests_total,
            signature_failures_total,
            unrouted_requests_total,
            gate_processing_duration_seconds,
            audit_records_total,
            store_degradations_total,
        }))
    }

    /// Prometheus text exposition of every metric in this instance
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    pub fn record_outcome(&self, gate: &str, outcome: &str) {
        self.webhook_requests_total
            .with_label_values(&[gate, outcome])
            .inc();
    }
}

/// Audit hook feeding [`ServiceMetrics`]
pub struct MetricsAuditHook {
    metrics: Arc<ServiceMetrics>,
}

impl MetricsAuditHook {
    pub fn new(metrics: Arc<ServiceMetrics>) -> Self {
        Self { metrics }
    }
}

impl AuditHook for MetricsAuditHook {
    fn name(&self) -> &str {
        "metrics"
    }

    fn on_audit(&self, gate: &GateIdentity, _record: &AuditRecord) {
        self.metrics
            .audit_records_total
            .with_label_values(&[gate.name.as_str()])
            .inc();
    }

    fn on_store_degraded(&self, gate: &GateIdentity, _error: Option<&StoreError>) {
        self.metrics
            .store_degradations_total
            .with_label_values(&[gate.name.as_str()])
            .inc();
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
