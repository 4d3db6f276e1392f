//! Startup wiring: configuration to a ready [`AppState`].

use std::sync::Arc;
use tracing::{info, warn};
use witness_gate_api::{
    build_content_store, AppState, GateRegistry, MetricsAuditHook, ServiceConfig, ServiceError,
    ServiceMetrics,
};
use witness_gate_core::{AuditHook, Timestamp, TracingAuditHook, WitnessManifest};

/// Resolve configuration and build everything the router needs
///
/// # Errors
///
/// - [`ServiceError::Configuration`] when validation or secret resolution fails
/// - [`ServiceError::Store`] when the store cannot be constructed
/// - [`ServiceError::Metrics`] when the metrics registry cannot be built
///
/// A store that is constructed but unreachable is not an error: the manifest
/// publish is best effort and `witness_cid` is then reported as null.
pub async fn build_app_state(config: &ServiceConfig) -> Result<AppState, ServiceError> {
    let gateway = config.resolve()?;

    for gate in &gateway.gates {
        info!(
            gate = %gate.name,
            accepted_event = %gate.accepted_event,
            action = %gate.action,
            secret_type = gate.secret_source.label(),
            "Configured gate"
        );
    }

    let store = build_content_store(&gateway.store).await?;

    let metrics = ServiceMetrics::new().map_err(|e| ServiceError::Metrics {
        message: e.to_string(),
    })?;

    let hooks: Vec<Arc<dyn AuditHook>> = vec![
        Arc::new(TracingAuditHook),
        Arc::new(MetricsAuditHook::new(Arc::clone(&metrics))),
    ];

    let registry = GateRegistry::from_gateway(&gateway, store.clone(), &hooks);

    let manifest = WitnessManifest::new(&gateway.gates, Timestamp::now());
    let witness_cid = manifest
        .publish_best_effort(store.as_deref(), gateway.store_timeout())
        .await;

    if witness_cid.is_none() {
        warn!("Witness manifest not published; health will report a null witness_cid");
    }

    Ok(AppState::new(
        registry,
        metrics,
        store,
        witness_cid,
        config.server.clone(),
    )
    .with_store_timeout(gateway.store_timeout()))
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
