//! Configuration types for the HTTP service
//!
//! [`ServiceConfig`] is the deserialised, operator-facing form loaded from
//! layered sources. [`ServiceConfig::resolve`] turns it into a
//! [`GatewayConfig`]: the immutable runtime form with secrets read and
//! identifiers validated, built once at startup and passed by reference.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use witness_gate_core::{EventKind, GateIdentity, GateName, GateSecret, SecretSource};

/// Gate names that would collide with fixed routes
pub const RESERVED_GATE_NAMES: [&str; 4] = ["webhook", "health", "metrics", "ready"];

/// Upper bound for `store.timeout_ms`
pub const MAX_STORE_TIMEOUT_MS: u64 = 30_000;

/// Prefix for environment variable overrides (`WG__SERVER__PORT=9090`)
pub const ENV_PREFIX: &str = "WG";

/// Environment variable naming an explicit configuration file
pub const CONFIG_FILE_ENV: &str = "WG_CONFIG_FILE";

// ============================================================================
// ServiceConfig
// ============================================================================

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Gates in routing order
    #[serde(default)]
    pub gates: Vec<GateConfig>,

    /// Content store backing witness records
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from layered sources
    ///
    /// Sources, later overriding earlier:
    ///  1. `/etc/witness-gate/service.yaml`
    ///  2. `./config/service.yaml`
    ///  3. `explicit_path`, or the file named by `WG_CONFIG_FILE`
    ///  4. Environment variables prefixed `WG__` (`__` separates levels)
    ///
    /// Missing optional files are skipped. The result is not validated.
    pub fn load(explicit_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("/etc/witness-gate/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        let explicit = explicit_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_FILE_ENV).ok())
            .filter(|p| !p.is_empty());

        if let Some(path) = explicit {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in this order:
    /// - no gates configured
    /// - any individual gate invalid (see [`GateConfig::validate`])
    /// - duplicate gate names
    /// - store settings invalid (see [`StoreConfig::validate`])
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gates.is_empty() {
            return Err(ConfigError::Missing {
                key: "gates".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for gate in &self.gates {
            gate.validate()?;
            if !seen.insert(gate.name.as_str()) {
                return Err(ConfigError::GateValidation {
                    gate: gate.name.clone(),
                    message: "duplicate gate name".to_string(),
                });
            }
        }

        self.store.validate()
    }

    /// Validate and resolve into the runtime form, reading env secrets
    pub fn resolve(&self) -> Result<GatewayConfig, ConfigError> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve_with<F>(&self, lookup: F) -> Result<GatewayConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.validate()?;

        let gates = self
            .gates
            .iter()
            .map(|gate| gate.to_identity(&lookup))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GatewayConfig {
            gates,
            store: self.store.clone(),
        })
    }

    /// Copy of this configuration with literal secrets masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for gate in &mut copy.gates {
            if let GateSecretConfig::Literal { value } = &mut gate.secret {
                *value = "<REDACTED>".to_string();
            }
        }
        copy
    }
}

/// Resolved, immutable runtime configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gates in routing order
    pub gates: Vec<GateIdentity>,
    pub store: StoreConfig,
}

impl GatewayConfig {
    pub fn store_timeout(&self) -> Duration {
        self.store.timeout()
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub enable_cors: bool,

    /// Enable compression
    pub enable_compression: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB
            enable_cors: true,
            enable_compression: true,
        }
    }
}

// ============================================================================
// GateConfig
// ============================================================================

/// Source of a gate's HMAC secret
///
/// The secret type label (`literal` / `env`) is reported by `/health`; the
/// value never is.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GateSecretConfig {
    /// Secret embedded in the configuration file
    ///
    /// **Development / testing only.**
    Literal { value: String },

    /// Secret read from an environment variable once at startup
    Env { var: String },
}

impl GateSecretConfig {
    pub fn source(&self) -> SecretSource {
        match self {
            Self::Literal { .. } => SecretSource::Literal,
            Self::Env { .. } => SecretSource::Env,
        }
    }

    /// Check the secret reference is usable without reading it
    pub fn validate(&self, gate: &str) -> Result<(), ConfigError> {
        let (empty, what) = match self {
            Self::Literal { value } => (value.is_empty(), "literal secret value"),
            Self::Env { var } => (var.trim().is_empty(), "secret environment variable name"),
        };

        if empty {
            return Err(ConfigError::GateValidation {
                gate: gate.to_string(),
                message: format!("{} must not be empty", what),
            });
        }

        Ok(())
    }

    /// Read the secret value
    pub fn resolve<F>(&self, gate: &str, lookup: F) -> Result<GateSecret, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Self::Literal { value } => Ok(GateSecret::new(value.clone())),
            Self::Env { var } => match lookup(var.trim()) {
                Some(value) if !value.is_empty() => Ok(GateSecret::new(value)),
                _ => Err(ConfigError::GateValidation {
                    gate: gate.to_string(),
                    message: format!("environment variable '{}' is unset or empty", var),
                }),
            },
        }
    }
}

impl std::fmt::Debug for GateSecretConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal { .. } => f
                .debug_struct("GateSecretConfig::Literal")
                .field("value", &"<REDACTED>")
                .finish(),
            Self::Env { var } => f
                .debug_struct("GateSecretConfig::Env")
                .field("var", var)
                .finish(),
        }
    }
}

/// Configuration of one gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// URL path segment and tenant name in proofs
    pub name: String,

    /// Public domain this gate represents
    #[serde(default)]
    pub domain: String,

    /// Free-form role label (e.g. `completion`, `pulse`)
    #[serde(default)]
    pub role: String,

    /// The single event kind this gate acts on
    pub accepted_event: EventKind,

    /// Action tag stamped into proofs as `proof_kind`
    pub action: String,

    pub secret: GateSecretConfig,

    /// Host substrings routing the shared `/webhook` endpoint here
    #[serde(default)]
    pub domains: Vec<String>,
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        GateName::new(self.name.clone()).map_err(|e| ConfigError::GateValidation {
            gate: self.name.clone(),
            message: e.to_string(),
        })?;

        if RESERVED_GATE_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(&self.name))
        {
            return Err(ConfigError::GateValidation {
                gate: self.name.clone(),
                message: "name is reserved for a built-in route".to_string(),
            });
        }

        if self.action.trim().is_empty() {
            return Err(ConfigError::GateValidation {
                gate: self.name.clone(),
                message: "action must not be empty".to_string(),
            });
        }

        if self.accepted_event == EventKind::Unknown {
            return Err(ConfigError::GateValidation {
                gate: self.name.clone(),
                message: "accepted_event must be a concrete event kind".to_string(),
            });
        }

        self.secret.validate(&self.name)
    }

    fn to_identity<F>(&self, lookup: &F) -> Result<GateIdentity, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = GateName::new(self.name.clone()).map_err(|e| ConfigError::GateValidation {
            gate: self.name.clone(),
            message: e.to_string(),
        })?;

        Ok(GateIdentity {
            name,
            domain: self.domain.clone(),
            role: self.role.clone(),
            accepted_event: self.accepted_event,
            action: self.action.clone(),
            secret: self.secret.resolve(&self.name, lookup)?,
            secret_source: self.secret.source(),
            domains: self.domains.clone(),
        })
    }
}

// ============================================================================
// StoreConfig
// ============================================================================

/// Content store backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// No store; every witness reference is null
    #[default]
    None,
    Memory,
    Filesystem,
    Ipfs,
}

/// Content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// IPFS-style API base URL (required for `ipfs`)
    pub api_url: Option<String>,

    /// Public gateway base URL for witness links
    pub gateway_url: Option<String>,

    /// Directory for the `filesystem` backend
    pub base_path: Option<PathBuf>,

    /// Bound on each store call, in milliseconds
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::None,
            api_url: None,
            gateway_url: None,
            base_path: None,
            timeout_ms: 5000,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 || self.timeout_ms > MAX_STORE_TIMEOUT_MS {
            return Err(ConfigError::Invalid {
                message: format!(
                    "store.timeout_ms must be between 1 and {}",
                    MAX_STORE_TIMEOUT_MS
                ),
            });
        }

        if let Some(gateway) = &self.gateway_url {
            parse_url("store.gateway_url", gateway)?;
        }

        match self.kind {
            StoreKind::Ipfs => {
                let api = self.api_url.as_deref().ok_or_else(|| ConfigError::Missing {
                    key: "store.api_url".to_string(),
                })?;
                parse_url("store.api_url", api)?;
            }
            StoreKind::Filesystem if self.base_path.is_none() => {
                return Err(ConfigError::Missing {
                    key: "store.base_path".to_string(),
                });
            }
            _ => {}
        }

        Ok(())
    }

    /// Parsed API URL
    pub fn api_url(&self) -> Result<Option<Url>, ConfigError> {
        self.api_url
            .as_deref()
            .map(|s| parse_url("store.api_url", s))
            .transpose()
    }

    /// Parsed gateway URL
    pub fn gateway_url(&self) -> Result<Option<Url>, ConfigError> {
        self.gateway_url
            .as_deref()
            .map(|s| parse_url("store.gateway_url", s))
            .transpose()
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        message: format!("{} is not a valid URL: {}", key, e),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            message: format!("{} must use http or https", key),
        });
    }

    Ok(url)
}

// ============================================================================
// LoggingConfig
// ============================================================================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
