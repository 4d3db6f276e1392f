//! Common test utilities for witness-gate-api integration tests
//!
//! This module provides:
//! - Content store doubles (failing, stalled)
//! - A recording audit hook
//! - The two-gate fixture configuration and request builders

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use witness_gate_api::{
    AppState, GateConfig, GateRegistry, GateSecretConfig, ServerConfig, ServiceConfig,
    ServiceMetrics, StoreConfig,
};
use witness_gate_core::{
    AuditHook, AuditRecord, ContentAddress, ContentStore, EventKind, GateIdentity,
    SignatureVerifier, StoreError, StoreHealth,
};

pub const GATE_A_SECRET: &str = "identity-gate-secret";
pub const GATE_B_SECRET: &str = "bridgeworld-gate-secret";

pub const WORKFLOW_RUN_PAYLOAD: &str = r#"{
  "action": "completed",
  "workflow_run": {
    "id": 9001,
    "name": "Release",
    "status": "completed",
    "conclusion": "success",
    "run_started_at": "2024-05-01T11:58:00Z",
    "updated_at": "2024-05-01T12:00:00Z"
  },
  "repository": {"name": "site", "full_name": "acme/site", "html_url": "https://github.com/acme/site"},
  "sender": {"login": "octocat", "id": 1}
}"#;

pub const WORKFLOW_JOB_PAYLOAD: &str = r#"{
  "action": "completed",
  "workflow_job": {
    "run_id": 9002,
    "workflow_name": "Heartbeat",
    "status": "completed",
    "conclusion": "success",
    "started_at": "2024-05-01T11:59:00Z",
    "completed_at": "2024-05-01T12:00:00Z"
  },
  "repository": {"name": "bridge", "full_name": "acme/bridge"},
  "sender": {"login": "hubot", "id": 2}
}"#;

// ============================================================================
// Content store doubles
// ============================================================================

/// Store whose writes always fail
pub struct FailingStore;

#[async_trait]
impl ContentStore for FailingStore {
    async fn add(&self, _content: Bytes) -> Result<ContentAddress, StoreError> {
        Err(StoreError::Unavailable {
            message: "node offline".to_string(),
        })
    }

    async fn cat(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        Err(StoreError::NotFound {
            address: address.to_string(),
        })
    }

    fn gateway_url(&self, _address: &ContentAddress) -> Option<String> {
        None
    }

    async fn health_check(&self) -> StoreHealth {
        StoreHealth::unhealthy("node offline")
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

/// Store whose writes never complete
pub struct StalledStore;

#[async_trait]
impl ContentStore for StalledStore {
    async fn add(&self, _content: Bytes) -> Result<ContentAddress, StoreError> {
        std::future::pending().await
    }

    async fn cat(&self, _address: &ContentAddress) -> Result<Bytes, StoreError> {
        std::future::pending().await
    }

    fn gateway_url(&self, _address: &ContentAddress) -> Option<String> {
        None
    }

    async fn health_check(&self) -> StoreHealth {
        std::future::pending().await
    }

    fn backend(&self) -> &'static str {
        "stalled"
    }
}

// ============================================================================
// Recording hook
// ============================================================================

/// Captures every audit record and degradation, tagged with the gate name
#[derive(Default)]
pub struct RecordingHook {
    pub audits: Mutex<Vec<(String, AuditRecord)>>,
    pub degraded: Mutex<Vec<String>>,
}

impl RecordingHook {
    pub fn audit_count(&self) -> usize {
        self.audits.lock().unwrap().len()
    }

    pub fn degraded_count(&self) -> usize {
        self.degraded.lock().unwrap().len()
    }
}

impl AuditHook for RecordingHook {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_audit(&self, gate: &GateIdentity, record: &AuditRecord) {
        self.audits
            .lock()
            .unwrap()
            .push((gate.name.to_string(), record.clone()));
    }

    fn on_store_degraded(&self, gate: &GateIdentity, _error: Option<&StoreError>) {
        self.degraded.lock().unwrap().push(gate.name.to_string());
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Two gates: A accepts `workflow_run`, B accepts `workflow_job`
pub fn two_gate_config() -> ServiceConfig {
    ServiceConfig {
        gates: vec![
            GateConfig {
                name: "gateA".to_string(),
                domain: "identity.example".to_string(),
                role: "completion".to_string(),
                accepted_event: EventKind::WorkflowRun,
                action: "identity".to_string(),
                secret: GateSecretConfig::Literal {
                    value: GATE_A_SECRET.to_string(),
                },
                domains: vec!["identity.example".to_string()],
            },
            GateConfig {
                name: "gateB".to_string(),
                domain: "bridgeworld.example".to_string(),
                role: "pulse".to_string(),
                accepted_event: EventKind::WorkflowJob,
                action: "bridgeworld".to_string(),
                secret: GateSecretConfig::Env {
                    var: "GATE_B_SECRET".to_string(),
                },
                domains: vec!["bridgeworld.example".to_string()],
            },
        ],
        store: StoreConfig {
            timeout_ms: 200,
            ..StoreConfig::default()
        },
        ..ServiceConfig::default()
    }
}

/// Test application built from [`two_gate_config`]
pub struct TestApp {
    pub state: AppState,
    pub hook: Arc<RecordingHook>,
}

impl TestApp {
    pub fn router(&self) -> axum::Router {
        witness_gate_api::create_router(self.state.clone())
    }
}

pub fn create_test_app(store: Option<Arc<dyn ContentStore>>) -> TestApp {
    let gateway = two_gate_config()
        .resolve_with(|var| (var == "GATE_B_SECRET").then(|| GATE_B_SECRET.to_string()))
        .unwrap();

    let hook = Arc::new(RecordingHook::default());
    let hooks: Vec<Arc<dyn AuditHook>> = vec![hook.clone()];
    let registry = GateRegistry::from_gateway(&gateway, store.clone(), &hooks);

    let state = AppState::new(
        registry,
        ServiceMetrics::new().unwrap(),
        store,
        None,
        ServerConfig::default(),
    )
    .with_store_timeout(Duration::from_millis(200));

    TestApp { state, hook }
}

/// Signed JSON POST
pub fn signed_request(uri: &str, body: &str, secret: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(
            "x-hub-signature-256",
            SignatureVerifier::sign(body.as_bytes(), secret),
        )
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Signed JSON POST with a `Host` header
pub fn signed_request_for_host(uri: &str, host: &str, body: &str, secret: &str) -> Request<Body> {
    let mut request = signed_request(uri, body, secret);
    request
        .headers_mut()
        .insert("host", host.parse().unwrap());
    request
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
