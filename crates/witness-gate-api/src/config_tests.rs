//! Tests for service configuration

use super::*;
use std::collections::HashMap;

fn gate(name: &str, kind: EventKind) -> GateConfig {
    GateConfig {
        name: name.to_string(),
        domain: format!("{}.example", name),
        role: "completion".to_string(),
        accepted_event: kind,
        action: "seal".to_string(),
        secret: GateSecretConfig::Literal {
            value: format!("{}-secret", name),
        },
        domains: vec![format!("{}.example", name)],
    }
}

fn config_with(gates: Vec<GateConfig>) -> ServiceConfig {
    ServiceConfig {
        gates,
        ..ServiceConfig::default()
    }
}

// ============================================================================
// Defaults
// ============================================================================

mod default_tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_store_defaults_to_none_with_five_second_timeout() {
        let config = StoreConfig::default();

        assert_eq!(config.kind, StoreKind::None);
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert!(config.validate().is_ok());
    }
}

// ============================================================================
// Deserialization
// ============================================================================

mod deserialize_tests {
    use super::*;

    const YAML: &str = r#"
server:
  port: 9090
gates:
  - name: gateA
    domain: gate-a.example
    role: completion
    accepted_event: workflow_run
    action: seal
    secret:
      type: env
      var: GATE_A_SECRET
    domains: ["gate-a.example"]
  - name: gateB
    accepted_event: workflow_job
    action: heartbeat
    secret:
      type: literal
      value: dev-only
store:
  kind: ipfs
  api_url: http://127.0.0.1:5001
  gateway_url: https://ipfs.io
"#;

    #[test]
    fn test_full_document_parses() {
        let config: ServiceConfig = serde_yaml::from_str(YAML).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.gates.len(), 2);
        assert_eq!(config.gates[0].accepted_event, EventKind::WorkflowRun);
        assert!(matches!(
            config.gates[0].secret,
            GateSecretConfig::Env { ref var } if var == "GATE_A_SECRET"
        ));
        assert!(config.gates[1].domains.is_empty());
        assert_eq!(config.store.kind, StoreKind::Ipfs);
        assert_eq!(config.store.timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_event_kind_is_rejected_at_parse_time() {
        let yaml = r#"
gates:
  - name: gateA
    accepted_event: release
    action: seal
    secret: { type: literal, value: x }
"#;
        assert!(serde_yaml::from_str::<ServiceConfig>(yaml).is_err());
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_no_gates_is_missing() {
        let result = ServiceConfig::default().validate();
        assert!(matches!(result, Err(ConfigError::Missing { ref key }) if key == "gates"));
    }

    #[test]
    fn test_duplicate_gate_names_rejected() {
        let config = config_with(vec![
            gate("gateA", EventKind::WorkflowRun),
            gate("gateA", EventKind::WorkflowJob),
        ]);

        let result = config.validate();
        assert!(
            matches!(result, Err(ConfigError::GateValidation { ref message, .. }) if message.contains("duplicate"))
        );
    }

    #[test]
    fn test_reserved_names_rejected() {
        for name in RESERVED_GATE_NAMES {
            let config = config_with(vec![gate(name, EventKind::WorkflowRun)]);
            assert!(config.validate().is_err(), "{} should be reserved", name);
        }
    }

    #[test]
    fn test_invalid_gate_name_rejected() {
        let config = config_with(vec![gate("bad name", EventKind::WorkflowRun)]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GateValidation { .. })
        ));
    }

    #[test]
    fn test_unknown_accepted_event_rejected() {
        let config = config_with(vec![gate("gateA", EventKind::Unknown)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_action_rejected() {
        let mut g = gate("gateA", EventKind::WorkflowRun);
        g.action = "  ".to_string();
        assert!(config_with(vec![g]).validate().is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut g = gate("gateA", EventKind::WorkflowRun);
        g.secret = GateSecretConfig::Literal {
            value: String::new(),
        };
        assert!(config_with(vec![g]).validate().is_err());

        let mut g = gate("gateA", EventKind::WorkflowRun);
        g.secret = GateSecretConfig::Env { var: " ".to_string() };
        assert!(config_with(vec![g]).validate().is_err());
    }

    #[test]
    fn test_store_timeout_bounds() {
        let mut store = StoreConfig::default();

        store.timeout_ms = 0;
        assert!(store.validate().is_err());

        store.timeout_ms = MAX_STORE_TIMEOUT_MS + 1;
        assert!(store.validate().is_err());

        store.timeout_ms = MAX_STORE_TIMEOUT_MS;
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_ipfs_requires_api_url() {
        let mut store = StoreConfig {
            kind: StoreKind::Ipfs,
            ..StoreConfig::default()
        };
        assert!(matches!(store.validate(), Err(ConfigError::Missing { .. })));

        store.api_url = Some("not a url".to_string());
        assert!(matches!(store.validate(), Err(ConfigError::Invalid { .. })));

        store.api_url = Some("ftp://node.example".to_string());
        assert!(store.validate().is_err());

        store.api_url = Some("http://127.0.0.1:5001".to_string());
        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_filesystem_requires_base_path() {
        let mut store = StoreConfig {
            kind: StoreKind::Filesystem,
            ..StoreConfig::default()
        };
        assert!(store.validate().is_err());

        store.base_path = Some(PathBuf::from("/var/lib/witness-gate"));
        assert!(store.validate().is_ok());
    }
}

// ============================================================================
// Resolution
// ============================================================================

mod resolve_tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_preserves_order_and_reads_env_secret() {
        let mut a = gate("gateA", EventKind::WorkflowRun);
        a.secret = GateSecretConfig::Env {
            var: "GATE_A_SECRET".to_string(),
        };
        let b = gate("gateB", EventKind::WorkflowJob);

        let resolved = config_with(vec![a, b])
            .resolve_with(env(&[("GATE_A_SECRET", "from-env")]))
            .unwrap();

        assert_eq!(resolved.gates.len(), 2);
        assert_eq!(resolved.gates[0].name.as_str(), "gateA");
        assert_eq!(resolved.gates[0].secret.expose(), "from-env");
        assert_eq!(resolved.gates[0].secret_source, SecretSource::Env);
        assert_eq!(resolved.gates[1].secret.expose(), "gateB-secret");
        assert_eq!(resolved.gates[1].secret_source, SecretSource::Literal);
        assert_eq!(resolved.store_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_missing_env_secret_fails_resolution() {
        let mut a = gate("gateA", EventKind::WorkflowRun);
        a.secret = GateSecretConfig::Env {
            var: "GATE_A_SECRET".to_string(),
        };

        let result = config_with(vec![a.clone()]).resolve_with(env(&[]));
        assert!(matches!(result, Err(ConfigError::GateValidation { ref gate, .. }) if gate == "gateA"));

        let result = config_with(vec![a]).resolve_with(env(&[("GATE_A_SECRET", "")]));
        assert!(result.is_err());
    }
}

// ============================================================================
// Redaction
// ============================================================================

mod redaction_tests {
    use super::*;

    #[test]
    fn test_debug_never_prints_literal_secret() {
        let secret = GateSecretConfig::Literal {
            value: "hunter2".to_string(),
        };
        let debug = format!("{:?}", secret);

        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<REDACTED>"));
    }

    #[test]
    fn test_redacted_copy_masks_literals_and_keeps_env_names() {
        let mut b = gate("gateB", EventKind::WorkflowJob);
        b.secret = GateSecretConfig::Env {
            var: "GATE_B_SECRET".to_string(),
        };
        let config = config_with(vec![gate("gateA", EventKind::WorkflowRun), b]);

        let yaml = serde_yaml::to_string(&config.redacted()).unwrap();

        assert!(!yaml.contains("gateA-secret"));
        assert!(yaml.contains("<REDACTED>"));
        assert!(yaml.contains("GATE_B_SECRET"));
    }
}
