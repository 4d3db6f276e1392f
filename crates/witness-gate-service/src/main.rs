//! # Witness-Gate Service
//!
//! Binary entry point for the witness-gate HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Builds the content store, gate handlers and witness manifest
//! - Starts the HTTP server from witness-gate-api

mod bootstrap;

use tracing::{error, info};
use witness_gate_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};

#[tokio::main]
async fn main() {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (later override earlier):
    //  1. /etc/witness-gate/service.yaml
    //  2. ./config/service.yaml
    //  3. Path given by WG_CONFIG_FILE
    //  4. Environment variables prefixed WG__, e.g. WG__SERVER__PORT=9090
    //
    // Logging is initialised from whatever loaded so the failure itself is
    // reported through tracing.
    // -------------------------------------------------------------------------
    let loaded = ServiceConfig::load(None);
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting witness-gate service");

    let service_config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load service configuration; aborting");
            std::process::exit(3);
        }
    };

    if let Err(e) = run(service_config).await {
        error!(error = %e, "Service terminated with error");
        std::process::exit(e.exit_code());
    }
}

async fn run(service_config: ServiceConfig) -> Result<(), ServiceError> {
    let state = bootstrap::build_app_state(&service_config).await?;

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        gates = state.registry.len(),
        "Starting HTTP server"
    );

    start_server(&service_config.server, state).await
}

fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
