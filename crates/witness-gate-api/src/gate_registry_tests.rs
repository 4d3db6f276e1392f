//! Tests for [`GateRegistry`].

use super::*;
use witness_gate_core::{EventKind, GateName, GateSecret, SecretSource};

fn handler(name: &str, action: &str, domains: &[&str]) -> Arc<GateHandler> {
    Arc::new(GateHandler::new(GateIdentity {
        name: GateName::new(name).unwrap(),
        domain: format!("{}.example", name),
        role: "completion".to_string(),
        accepted_event: EventKind::WorkflowRun,
        action: action.to_string(),
        secret: GateSecret::new("secret"),
        secret_source: SecretSource::Literal,
        domains: domains.iter().map(|d| d.to_string()).collect(),
    }))
}

// ============================================================================
// Lookup
// ============================================================================

mod lookup_tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let registry = GateRegistry::new();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("gateA").is_none());
        assert!(registry.infer_from_host("gate-a.example").is_none());
    }

    #[test]
    fn test_get_is_exact_match() {
        let mut registry = GateRegistry::new();
        registry.register(handler("gateA", "seal", &[]));

        assert!(registry.contains("gateA"));
        assert!(!registry.contains("gatea"));
        assert!(!registry.contains("gate"));
    }

    #[test]
    fn test_register_replaces_existing_name_in_place() {
        let mut registry = GateRegistry::new();
        registry
            .register(handler("gateA", "seal", &[]))
            .register(handler("gateB", "heartbeat", &[]))
            .register(handler("gateA", "stamp", &[]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("gateA").unwrap().identity().action, "stamp");

        let order: Vec<&str> = registry.identities().map(|i| i.name.as_str()).collect();
        assert_eq!(order, vec!["gateA", "gateB"]);
    }
}

// ============================================================================
// Host inference
// ============================================================================

mod host_inference_tests {
    use super::*;

    #[test]
    fn test_infers_gate_from_host_substring() {
        let mut registry = GateRegistry::new();
        registry
            .register(handler("gateA", "seal", &["gate-a.example"]))
            .register(handler("gateB", "heartbeat", &["gate-b.example"]));

        let found = registry.infer_from_host("hooks.gate-b.example:443").unwrap();
        assert_eq!(found.identity().name.as_str(), "gateB");
    }

    #[test]
    fn test_first_match_in_registration_order_wins() {
        let mut registry = GateRegistry::new();
        registry
            .register(handler("gateA", "seal", &["shared.example"]))
            .register(handler("gateB", "heartbeat", &["shared.example"]));

        let found = registry.infer_from_host("shared.example").unwrap();
        assert_eq!(found.identity().name.as_str(), "gateA");
    }

    #[test]
    fn test_no_match_and_empty_host() {
        let mut registry = GateRegistry::new();
        registry.register(handler("gateA", "seal", &["gate-a.example"]));

        assert!(registry.infer_from_host("unknown.example").is_none());
        assert!(registry.infer_from_host("").is_none());
    }
}

// ============================================================================
// Construction from configuration
// ============================================================================

mod from_gateway_tests {
    use super::*;
    use crate::config::StoreConfig;
    use witness_gate_core::{MemoryContentStore, TracingAuditHook};

    #[test]
    fn test_builds_handlers_in_config_order() {
        let config = GatewayConfig {
            gates: vec![
                handler("gateB", "heartbeat", &[]).identity().clone(),
                handler("gateA", "seal", &[]).identity().clone(),
            ],
            store: StoreConfig::default(),
        };
        let store: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
        let hooks: Vec<Arc<dyn AuditHook>> = vec![Arc::new(TracingAuditHook)];

        let registry = GateRegistry::from_gateway(&config, Some(store), &hooks);

        let order: Vec<&str> = registry.identities().map(|i| i.name.as_str()).collect();
        assert_eq!(order, vec!["gateB", "gateA"]);
        assert_eq!(format!("{:?}", registry), "GateRegistry { gates: [\"gateB\", \"gateA\"] }");
    }
}
