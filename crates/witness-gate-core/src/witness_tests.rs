use super::*;
use crate::adapters::MemoryContentStore;
use crate::gate::{GateSecret, SecretSource};
use crate::GateName;

fn identity(name: &str, kind: EventKind, secret: &str) -> GateIdentity {
    GateIdentity {
        name: GateName::new(name).unwrap(),
        domain: format!("{}.example", name),
        role: "role".to_string(),
        accepted_event: kind,
        action: "action".to_string(),
        secret: GateSecret::new(secret),
        secret_source: SecretSource::Literal,
        domains: vec![format!("{}.example", name)],
    }
}

fn started_at() -> Timestamp {
    Timestamp::from_rfc3339("2024-05-01T00:00:00Z").unwrap()
}

#[test]
fn test_manifest_never_contains_secrets() {
    let gates = [
        identity("gateA", EventKind::WorkflowRun, "super-secret-a"),
        identity("gateB", EventKind::WorkflowJob, "super-secret-b"),
    ];

    let manifest = WitnessManifest::new(&gates, started_at());
    let bytes = manifest.to_canonical_bytes().unwrap();
    let text = String::from_utf8(bytes).unwrap();

    assert!(!text.contains("super-secret"));
    assert!(text.contains("\"secret_type\":\"literal\""));
    assert_eq!(manifest.gates.len(), 2);
    assert_eq!(manifest.gates[1].accepted_event, EventKind::WorkflowJob);
}

#[tokio::test]
async fn test_publishing_same_manifest_twice_yields_same_address() {
    let gates = [identity("gateA", EventKind::WorkflowRun, "s")];
    let manifest = WitnessManifest::new(&gates, started_at());
    let store = MemoryContentStore::new();

    let first = manifest.publish(&store, Duration::from_secs(1)).await.unwrap();
    let second = manifest.publish(&store, Duration::from_secs(1)).await.unwrap();

    assert_eq!(first, second);
    let stored: WitnessManifest =
        serde_json::from_slice(&store.cat(&first).await.unwrap()).unwrap();
    assert_eq!(stored, manifest);
}

#[tokio::test]
async fn test_best_effort_without_store_is_none() {
    let gates = [identity("gateA", EventKind::WorkflowRun, "s")];
    let manifest = WitnessManifest::new(&gates, started_at());

    assert!(manifest
        .publish_best_effort(None, Duration::from_secs(1))
        .await
        .is_none());
}
