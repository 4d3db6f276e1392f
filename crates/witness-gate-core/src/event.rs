//! # Event Normalization
//!
//! Turns an arbitrary CI callback payload into a [`NormalizedEvent`].
//!
//! The event kind is derived only from which top-level fields are present in
//! the payload. Headers and any client-declared `type`/`kind` fields are never
//! consulted. Classification follows a fixed precedence so payloads carrying
//! several candidate fields always resolve the same way:
//!
//! 1. `workflow_job` → [`EventKind::WorkflowJob`]
//! 2. `workflow_run` or `workflow` → [`EventKind::WorkflowRun`]
//! 3. `pusher` → [`EventKind::Push`]
//! 4. `deployment` → [`EventKind::Deployment`]
//! 5. anything else → [`EventKind::Unknown`]
//!
//! A field counts as present when the key exists and its value is not `null`.
//! Missing or wrong-typed sub-fields normalize to `None`; normalization never
//! fails.

use crate::{ParseError, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Event Kind
// ============================================================================

/// Kind of CI event, inferred from payload structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WorkflowRun,
    WorkflowJob,
    Push,
    Deployment,
    Unknown,
}

impl EventKind {
    /// Wire name used in configuration, responses, and proofs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowRun => "workflow_run",
            Self::WorkflowJob => "workflow_job",
            Self::Push => "push",
            Self::Deployment => "deployment",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "workflow_run" => Ok(Self::WorkflowRun),
            "workflow_job" => Ok(Self::WorkflowJob),
            "push" => Ok(Self::Push),
            "deployment" => Ok(Self::Deployment),
            "unknown" => Ok(Self::Unknown),
            other => Err(ParseError::InvalidFormat {
                expected: "workflow_run, workflow_job, push, deployment, or unknown".to_string(),
                actual: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Normalized Event
// ============================================================================

/// Workflow or job metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInfo {
    pub name: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub run_id: Option<u64>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

/// Repository metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub url: Option<String>,
}

/// Identity of the account that triggered the event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderInfo {
    pub login: Option<String>,
    pub id: Option<u64>,
}

/// Canonical, tenant-independent view of a CI event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub kind: EventKind,
    pub workflow: WorkflowInfo,
    pub repository: RepositoryInfo,
    pub sender: SenderInfo,
    pub received_at: Timestamp,
}

// ============================================================================
// Parser
// ============================================================================

/// Stateless payload classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct EventParser;

impl EventParser {
    /// Normalize a payload, stamping it with the current time
    pub fn normalize(payload: &Value) -> NormalizedEvent {
        Self::normalize_at(payload, Timestamp::now())
    }

    /// Normalize a payload with an explicit receive time
    pub fn normalize_at(payload: &Value, received_at: Timestamp) -> NormalizedEvent {
        let kind = Self::classify(payload);

        NormalizedEvent {
            kind,
            workflow: extract_workflow(payload, kind),
            repository: extract_repository(payload),
            sender: extract_sender(payload),
            received_at,
        }
    }

    /// Infer the event kind from payload structure alone
    pub fn classify(payload: &Value) -> EventKind {
        if has_field(payload, "workflow_job") {
            EventKind::WorkflowJob
        } else if has_field(payload, "workflow_run") || has_field(payload, "workflow") {
            EventKind::WorkflowRun
        } else if has_field(payload, "pusher") {
            EventKind::Push
        } else if has_field(payload, "deployment") {
            EventKind::Deployment
        } else {
            EventKind::Unknown
        }
    }
}

fn has_field(payload: &Value, key: &str) -> bool {
    payload.get(key).is_some_and(|v| !v.is_null())
}

fn string_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Accepts either a JSON number or a numeric string
fn u64_at(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| string_at(value, key))
}

fn extract_workflow(payload: &Value, kind: EventKind) -> WorkflowInfo {
    let workflow_name = payload.get("workflow").and_then(|w| string_at(w, "name"));

    match kind {
        EventKind::WorkflowJob => {
            let job = &payload["workflow_job"];
            WorkflowInfo {
                name: first_string(job, &["workflow_name", "name"]).or(workflow_name),
                status: string_at(job, "status"),
                conclusion: string_at(job, "conclusion"),
                run_id: u64_at(job, "run_id"),
                started_at: string_at(job, "started_at"),
                completed_at: string_at(job, "completed_at"),
            }
        }
        EventKind::WorkflowRun => {
            let run = &payload["workflow_run"];
            WorkflowInfo {
                name: string_at(run, "name").or(workflow_name),
                status: string_at(run, "status"),
                conclusion: string_at(run, "conclusion"),
                run_id: u64_at(run, "id"),
                started_at: first_string(run, &["run_started_at", "created_at"]),
                completed_at: string_at(run, "updated_at"),
            }
        }
        _ => WorkflowInfo::default(),
    }
}

fn extract_repository(payload: &Value) -> RepositoryInfo {
    let repo = &payload["repository"];
    RepositoryInfo {
        name: string_at(repo, "name"),
        full_name: string_at(repo, "full_name"),
        url: first_string(repo, &["html_url", "url"]),
    }
}

fn extract_sender(payload: &Value) -> SenderInfo {
    let sender = &payload["sender"];
    SenderInfo {
        login: string_at(sender, "login"),
        id: u64_at(sender, "id"),
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
