//! # Witness-Gate HTTP Service
//!
//! HTTP surface of the dual-tenant webhook gateway.
//!
//! This service provides:
//! - Per-gate webhook endpoints (`POST /{gate}/webhook`) with signature validation
//! - A shared endpoint (`POST /webhook`) routed by request host
//! - Health, readiness and Prometheus metrics endpoints
//!
//! Only an invalid signature produces a non-2xx webhook response. Unrouted
//! requests, kind mismatches and store outages are all answered with `200`.

pub mod config;
pub mod errors;
pub mod gate_registry;
pub mod metrics;
pub mod responses;
pub mod store;

pub use config::{
    GateConfig, GateSecretConfig, GatewayConfig, LoggingConfig, ServerConfig, ServiceConfig,
    StoreConfig, StoreKind,
};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use gate_registry::GateRegistry;
pub use metrics::{MetricsAuditHook, ServiceMetrics};
pub use store::build_content_store;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use responses::{
    AcknowledgedResponse, GateSummary, HealthResponse, ProcessedResponse, ReadinessResponse,
    StoreStatus, UnroutedResponse,
};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info, instrument, warn};
use witness_gate_core::{
    webhook::WebhookHeaders, ContentAddress, ContentStore, GateError, GateHandler, GateOutcome,
    RawWebhookRequest, Timestamp,
};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Gate handlers in routing order
    pub registry: Arc<GateRegistry>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,

    /// Content store, reported by the health endpoint
    pub store: Option<Arc<dyn ContentStore>>,

    /// Address of the startup witness manifest
    pub witness_cid: Option<ContentAddress>,

    /// Bound on the store health probe
    pub store_timeout: Duration,

    pub server: ServerConfig,
}

impl AppState {
    /// Create new application state
    pub fn new(
        registry: GateRegistry,
        metrics: Arc<ServiceMetrics>,
        store: Option<Arc<dyn ContentStore>>,
        witness_cid: Option<ContentAddress>,
        server: ServerConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            metrics,
            store,
            witness_cid,
            store_timeout: witness_gate_core::gate::DEFAULT_STORE_TIMEOUT,
            server,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let webhook_routes = Router::new()
        .route("/webhook", post(handle_shared_webhook))
        .route("/{gate}/webhook", post(handle_gate_webhook));

    let health_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/ready", get(handle_readiness_check));

    let observability_routes = Router::new().route("/metrics", get(metrics_endpoint));

    let mut router = Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .merge(observability_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.server.max_body_size));

    if state.server.enable_compression {
        router = router.layer(CompressionLayer::new());
    }
    if state.server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM, then lets in-flight requests finish.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), ServiceError> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| ServiceError::BindFailed {
            address: format!("{}:{}", config.host, config.port),
            message: e.to_string(),
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: addr.to_string(),
            message: e.to_string(),
        })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_seconds);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
    }
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle a webhook addressed to a gate by path
///
/// An unconfigured gate name is a `404`; signature checking never runs.
#[instrument(skip(state, headers, body), fields(gate = %gate))]
pub async fn handle_gate_webhook(
    State(state): State<AppState>,
    Path(gate): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookHandlerError> {
    let handler = state
        .registry
        .get(&gate)
        .ok_or(WebhookHandlerError::GateNotFound { gate })?;

    let request = build_request(&headers, None, body);
    dispatch(&state, &handler, request).await
}

/// Handle a webhook on the shared endpoint, routed by host
#[instrument(skip(state, uri, headers, body))]
pub async fn handle_shared_webhook(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookHandlerError> {
    let request = build_request(&headers, uri.host(), body);
    let host = request.host().unwrap_or_default();

    match state.registry.infer_from_host(host) {
        Some(handler) => {
            info!(host = %host, gate = %handler.identity().name, "Routed webhook by host");
            dispatch(&state, &handler, request).await
        }
        None => {
            info!(host = %host, "No gate matched request host; acknowledging unrouted");
            state.metrics.unrouted_requests_total.inc();
            Ok(Json(UnroutedResponse::default()).into_response())
        }
    }
}

/// Capture the request for a gate, falling back to the URI authority for host
fn build_request(headers: &HeaderMap, uri_host: Option<&str>, body: Bytes) -> RawWebhookRequest {
    let header_map: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_lowercase(),
                v.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();

    let mut webhook_headers = WebhookHeaders::from_http_headers(&header_map);
    if webhook_headers.host.is_none() {
        webhook_headers.host = uri_host.map(str::to_string);
    }

    RawWebhookRequest::new(webhook_headers, body)
}

async fn dispatch(
    state: &AppState,
    handler: &GateHandler,
    request: RawWebhookRequest,
) -> Result<Response, WebhookHandlerError> {
    let identity = handler.identity();
    let gate = identity.name.as_str();

    let timer = state
        .metrics
        .gate_processing_duration_seconds
        .with_label_values(&[gate])
        .start_timer();
    let result = handler.handle(&request).await;
    timer.observe_duration();

    match result {
        Ok(GateOutcome::Processed(record)) => {
            state.metrics.record_outcome(gate, "processed");
            Ok(Json(ProcessedResponse::new(identity, record)).into_response())
        }
        Ok(GateOutcome::Acknowledged { kind }) => {
            state.metrics.record_outcome(gate, "acknowledged");
            Ok(Json(AcknowledgedResponse::new(identity, kind)).into_response())
        }
        Err(error) => {
            if matches!(error, GateError::InvalidSignature { .. }) {
                state
                    .metrics
                    .signature_failures_total
                    .with_label_values(&[gate])
                    .inc();
                state.metrics.record_outcome(gate, "rejected");
            } else {
                state.metrics.record_outcome(gate, "error");
            }
            Err(error.into())
        }
    }
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Gate summary, store status and witness manifest address
///
/// Always `200` while the process serves requests; a failing store is
/// reported in `store.healthy` rather than as an unhealthy service.
#[instrument(skip(state))]
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let gates = state
        .registry
        .identities()
        .map(|identity| (identity.name.to_string(), GateSummary::from(identity)))
        .collect();

    let store = match &state.store {
        Some(store) => {
            let health =
                match tokio::time::timeout(state.store_timeout, store.health_check()).await {
                    Ok(health) => health,
                    Err(_) => witness_gate_core::StoreHealth::unhealthy("health probe timed out"),
                };
            if !health.healthy {
                warn!(backend = store.backend(), message = ?health.message, "Content store unhealthy");
            }
            StoreStatus {
                backend: store.backend().to_string(),
                healthy: Some(health.healthy),
                message: health.message,
            }
        }
        None => StoreStatus {
            backend: "none".to_string(),
            healthy: None,
            message: None,
        },
    };

    Json(HealthResponse {
        status: "healthy",
        gates,
        witness_cid: state.witness_cid.clone(),
        store,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Timestamp::now(),
    })
}

/// Readiness check for Kubernetes
#[instrument(skip(state))]
async fn handle_readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let response = ReadinessResponse {
        ready: !state.registry.is_empty(),
        gates: state.registry.len(),
        timestamp: Timestamp::now(),
    };

    if response.ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

// ============================================================================
// Observability Handlers
// ============================================================================

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.render().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware
///
/// - Logs request start and completion with structured fields
/// - Propagates correlation ID through response headers
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    request.extensions_mut().insert(correlation_id.clone());

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();
    let duration_ms = duration.as_millis() as u64;

    macro_rules! completed {
        ($level:expr, $class:literal) => {
            tracing::event!(
                $level,
                correlation_id = %correlation_id,
                method = %method,
                uri = %uri,
                status = %status,
                status_class = $class,
                duration_ms,
                "Request completed"
            )
        };
    }

    if status.is_server_error() {
        completed!(tracing::Level::ERROR, "server_error");
    } else if status.is_client_error() {
        completed!(tracing::Level::WARN, "client_error");
    } else {
        completed!(tracing::Level::INFO, "success");
    }

    response
}

/// Counts every HTTP response by method and status
async fn metrics_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;

    state
        .metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), response.status().as_str()])
        .inc();

    response
}
