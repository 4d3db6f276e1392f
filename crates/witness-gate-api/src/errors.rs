//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use witness_gate_core::{GateError, StoreError};
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// Only an invalid signature is ever reported to a legitimate sender as a
/// failure. Every other webhook condition (unrouted request, kind mismatch,
/// store outage) is answered with `200` by the handlers themselves, because
/// the sending CI system treats any non-2xx as a delivery failure and retries.
///
/// - `401 Unauthorized`: signature absent or wrong
/// - `404 Not Found`: explicit path names a gate that is not configured
/// - `500 Internal Server Error`: proof canonicalization failed
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Maps to: `401 Unauthorized` (never retried internally)
    #[error("Invalid signature")]
    InvalidSignature { gate: String },

    /// Maps to: `404 Not Found`
    #[error("Gate not found: {gate}")]
    GateNotFound { gate: String },

    /// Maps to: `500 Internal Server Error`
    ///
    /// Details are logged server-side; the client gets a generic message.
    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl From<GateError> for WebhookHandlerError {
    fn from(error: GateError) -> Self {
        match error {
            GateError::InvalidSignature { gate } => Self::InvalidSignature { gate },
            GateError::Proof(e) => Self::InternalError {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidSignature { ref gate } => {
                warn!(gate = %gate, "Rejecting webhook with invalid signature");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            Self::GateNotFound { ref gate } => {
                warn!(gate = %gate, "Webhook addressed to unknown gate");
                (StatusCode::NOT_FOUND, self.to_string())
            }
            Self::InternalError { ref message } => {
                error!(error = %message, "Internal server error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error occurred. Please try again later.".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Content store initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("Metrics initialization failed: {message}")]
    Metrics { message: String },
}

impl ServiceError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
            Self::Store(_) => 4,
            Self::Metrics { .. } => 5,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Invalid configuration for gate '{gate}': {message}")]
    GateValidation { gate: String, message: String },

    #[error("Configuration loading failed: {message}")]
    Load { message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        Self::Load {
            message: error.to_string(),
        }
    }
}
