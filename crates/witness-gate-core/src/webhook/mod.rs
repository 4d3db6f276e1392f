//! # Webhook Request Capture
//!
//! Immutable per-request input to a gate. The raw body bytes are captured
//! before any JSON parsing so signature verification always runs over exactly
//! what the sender signed.

use crate::Timestamp;
use bytes::Bytes;
use std::collections::HashMap;

/// Signature header carrying `sha256=<hex>`
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Declared event kind headers, in lookup order
pub const EVENT_KIND_HEADERS: [&str; 2] = ["x-event-kind", "x-github-event"];

/// Delivery identifier headers, in lookup order
pub const DELIVERY_ID_HEADERS: [&str; 2] = ["x-delivery-id", "x-github-delivery"];

// ============================================================================
// Core Types
// ============================================================================

/// Raw HTTP request data for a single webhook call
#[derive(Debug, Clone)]
pub struct RawWebhookRequest {
    pub headers: WebhookHeaders,
    pub body: Bytes,
    pub payload: serde_json::Value,
    pub received_at: Timestamp,
}

impl RawWebhookRequest {
    /// Create new webhook request
    ///
    /// The body is parsed as JSON once. A body that is not valid JSON yields
    /// `Value::Null`, which classifies as an unknown event downstream.
    pub fn new(headers: WebhookHeaders, body: Bytes) -> Self {
        let payload = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        Self {
            headers,
            body,
            payload,
            received_at: Timestamp::now(),
        }
    }

    /// Get signature from headers if present
    pub fn signature(&self) -> Option<&str> {
        self.headers.signature.as_deref()
    }

    /// Get the client-declared event kind, if any
    ///
    /// Informational only; classification never reads this value.
    pub fn declared_kind(&self) -> Option<&str> {
        self.headers.declared_kind.as_deref()
    }

    /// Get delivery ID from headers if present
    pub fn delivery_id(&self) -> Option<&str> {
        self.headers.delivery_id.as_deref()
    }

    /// Get the routing hint (Host header) if present
    pub fn host(&self) -> Option<&str> {
        self.headers.host.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.user_agent.as_deref()
    }
}

/// Headers relevant to gate processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub signature: Option<String>,     // X-Hub-Signature-256
    pub declared_kind: Option<String>, // X-Event-Kind / X-GitHub-Event
    pub delivery_id: Option<String>,   // X-Delivery-Id / X-GitHub-Delivery
    pub host: Option<String>,          // Host
    pub user_agent: Option<String>,    // User-Agent
}

impl WebhookHeaders {
    /// Extract gate-relevant headers from a lowercase-keyed header map
    ///
    /// Missing headers are left as `None`; nothing here rejects a request.
    pub fn from_http_headers(headers: &HashMap<String, String>) -> Self {
        let lookup = |name: &str| {
            headers
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let first_of = |names: &[&str]| names.iter().find_map(|name| lookup(name));

        Self {
            signature: lookup(SIGNATURE_HEADER),
            declared_kind: first_of(&EVENT_KIND_HEADERS),
            delivery_id: first_of(&DELIVERY_ID_HEADERS),
            host: lookup("host"),
            user_agent: lookup("user-agent"),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
