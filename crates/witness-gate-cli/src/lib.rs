//! # Witness-Gate CLI
//!
//! Operator tooling for the witness-gate webhook gateway.
//!
//! This module provides CLI commands for:
//! - Signing payloads and checking signatures the way a gate does
//! - Normalizing payloads and recomputing proofs offline
//! - Fetching stored witness documents and re-verifying their proofs
//! - Validating and displaying service configuration

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use witness_gate_api::ServiceConfig;
use witness_gate_core::{
    ContentAddress, ContentStore, EventParser, IpfsHttpStore, NormalizedEvent, ProofError,
    ProofGenerator, ProofRecord, SignatureVerifier, StoreError, Timestamp,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Witness-Gate CLI - tools for the dual-tenant webhook gateway
#[derive(Parser)]
#[command(name = "witness-gate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator tools for the witness-gate webhook gateway")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Compute the X-Hub-Signature-256 value for a payload
    Sign {
        /// Gate secret
        #[arg(short, long, env = "WG_GATE_SECRET", hide_env_values = true)]
        secret: String,

        /// Payload file (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Check a signature against a payload
    Verify {
        /// Gate secret
        #[arg(short, long, env = "WG_GATE_SECRET", hide_env_values = true)]
        secret: String,

        /// Presented signature, `sha256=<hex>`
        #[arg(long)]
        signature: String,

        /// Payload file (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the normalized event a gate would derive from a payload
    Normalize {
        /// Payload file (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Receipt time to stamp (RFC 3339, defaults to now)
        #[arg(long, value_parser = parse_timestamp)]
        received_at: Option<Timestamp>,
    },

    /// Recompute a proof for a fixed timestamp
    Proof {
        /// Gate name the proof is issued under
        #[arg(long)]
        tenant: String,

        /// Gate action tag
        #[arg(long)]
        action: String,

        /// Proof timestamp (RFC 3339)
        #[arg(long, value_parser = parse_timestamp)]
        timestamp: Timestamp,

        /// Receipt time of the event (defaults to the proof timestamp)
        #[arg(long, value_parser = parse_timestamp)]
        received_at: Option<Timestamp>,

        /// Input is an already-normalized event rather than a raw payload
        #[arg(long)]
        normalized: bool,

        /// Fail unless the recomputed hash equals this value
        #[arg(long)]
        expect: Option<String>,

        /// Input file (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Fetch a stored witness document and re-verify its proof
    Fetch {
        /// Content address of the witness document
        address: String,

        /// IPFS-style API base URL
        #[arg(long, env = "WG_STORE_API_URL", default_value = "http://127.0.0.1:5001")]
        api_url: String,

        /// Request timeout in milliseconds
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the layered service configuration
    Validate {
        /// Configuration file layered over the defaults
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Also read every env-sourced gate secret
        #[arg(long)]
        resolve_secrets: bool,
    },

    /// Print the effective configuration with literal secrets masked
    Show {
        /// Configuration file layered over the defaults
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: ConfigFormat,
    },
}

/// Configuration format options
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

fn parse_timestamp(value: &str) -> Result<Timestamp, String> {
    Timestamp::from_rfc3339(value).map_err(|e| e.to_string())
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] witness_gate_api::ConfigError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Signature does not match payload")]
    SignatureMismatch,

    #[error("Proof mismatch: expected {expected}, computed {actual}")]
    ProofMismatch { expected: String, actual: String },

    #[error("Proof error: {0}")]
    Proof(#[from] ProofError),

    #[error("Content store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output encoding failed: {message}")]
    Output { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SignatureMismatch | Self::ProofMismatch { .. } => 1,
            Self::Configuration(_) => 2,
            Self::InvalidArgument { .. } | Self::Json(_) => 3,
            Self::Store(_) => 4,
            Self::Proof(_) | Self::Output { .. } => 5,
            Self::Io(_) => 6,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    initialize_logging(&cli);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, &mut out).await
}

/// Run one command, writing its result to `out`
pub async fn execute(command: Commands, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Commands::Sign { secret, file } => {
            let body = read_input(file.as_deref())?;
            writeln!(out, "{}", SignatureVerifier::sign(&body, &secret))?;
            Ok(())
        }
        Commands::Verify {
            secret,
            signature,
            file,
        } => {
            let body = read_input(file.as_deref())?;
            if SignatureVerifier::verify(&body, Some(&signature), &secret) {
                writeln!(out, "valid")?;
                Ok(())
            } else {
                Err(CliError::SignatureMismatch)
            }
        }
        Commands::Normalize { file, received_at } => {
            let payload: serde_json::Value = serde_json::from_slice(&read_input(file.as_deref())?)?;
            let event =
                EventParser::normalize_at(&payload, received_at.unwrap_or_else(Timestamp::now));
            write_json(out, &event)
        }
        Commands::Proof {
            tenant,
            action,
            timestamp,
            received_at,
            normalized,
            expect,
            file,
        } => {
            let input = read_input(file.as_deref())?;
            let event: NormalizedEvent = if normalized {
                serde_json::from_slice(&input)?
            } else {
                let payload: serde_json::Value = serde_json::from_slice(&input)?;
                EventParser::normalize_at(&payload, received_at.unwrap_or(timestamp))
            };

            let proof = ProofGenerator::generate_at(&tenant, &event, &action, timestamp)?;
            if let Some(expected) = expect {
                if !expected.eq_ignore_ascii_case(&proof.proof_hash) {
                    return Err(CliError::ProofMismatch {
                        expected,
                        actual: proof.proof_hash,
                    });
                }
            }
            write_json(out, &proof)
        }
        Commands::Fetch {
            address,
            api_url,
            timeout_ms,
        } => fetch_witness(&address, &api_url, Duration::from_millis(timeout_ms), out).await,
        Commands::Config { action } => execute_config_command(action, out),
    }
}

/// Initialize logging based on CLI arguments
fn initialize_logging(cli: &Cli) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output stays pipeable.
    let result = if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("warning: logging already initialized: {}", e);
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Witness document fields needed for re-verification
#[derive(Debug, Deserialize)]
struct StoredWitness {
    gate: String,
    #[serde(default)]
    delivery_id: Option<String>,
    proof: ProofRecord,
}

async fn fetch_witness(
    address: &str,
    api_url: &str,
    timeout: Duration,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let address: ContentAddress = address.parse().map_err(|e: witness_gate_core::ValidationError| {
        CliError::InvalidArgument {
            arg: "address".to_string(),
            message: e.to_string(),
        }
    })?;
    let api_url = Url::parse(api_url).map_err(|e| CliError::InvalidArgument {
        arg: "api-url".to_string(),
        message: e.to_string(),
    })?;

    let store = IpfsHttpStore::new(&api_url, None, timeout)?;
    let bytes = store.cat(&address).await?;
    debug!(address = %address, size = bytes.len(), "Fetched witness document");

    let document: serde_json::Value = serde_json::from_slice(&bytes)?;
    let witness: StoredWitness = serde_json::from_value(document.clone())?;

    if !witness.proof.verify()? {
        let actual = ProofGenerator::compute_hash(
            &witness.proof.tenant,
            &witness.proof.event,
            &witness.proof.proof_kind,
            &witness.proof.generated_at,
        )?;
        return Err(CliError::ProofMismatch {
            expected: witness.proof.proof_hash,
            actual,
        });
    }

    info!(
        gate = %witness.gate,
        delivery_id = witness.delivery_id.as_deref(),
        "Witness proof verified"
    );
    write_json(out, &document)?;
    writeln!(out, "proof: valid ({})", witness.proof.proof_hash)?;
    Ok(())
}

/// Execute config command
fn execute_config_command(action: ConfigCommands, out: &mut dyn Write) -> Result<(), CliError> {
    match action {
        ConfigCommands::Validate {
            file,
            resolve_secrets,
        } => {
            let config = load_config(file.as_deref())?;
            if resolve_secrets {
                config.resolve()?;
            } else {
                config.validate()?;
            }
            writeln!(out, "configuration valid: {} gate(s)", config.gates.len())?;
            Ok(())
        }
        ConfigCommands::Show { file, format } => {
            let config = load_config(file.as_deref())?.redacted();
            match format {
                ConfigFormat::Yaml => {
                    let text = serde_yaml::to_string(&config).map_err(|e| CliError::Output {
                        message: e.to_string(),
                    })?;
                    write!(out, "{}", text)?;
                    Ok(())
                }
                ConfigFormat::Json => write_json(out, &config),
            }
        }
    }
}

fn load_config(file: Option<&Path>) -> Result<ServiceConfig, CliError> {
    let path = file.map(|p| p.to_string_lossy().into_owned());
    Ok(ServiceConfig::load(path.as_deref())?)
}

/// Read a file, or stdin when no path is given
fn read_input(file: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn write_json<T: serde::Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
