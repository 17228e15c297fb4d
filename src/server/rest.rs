// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! REST API server implementation using axum.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health of every rig
//! - `GET /api/v1/rigs` - List rigs
//! - `GET /api/v1/operations` - Operation table
//! - `POST /api/v1/operations/{id or name}` - Invoke an operation
//! - `POST /api/v1/kill` - Stop the server after the kill delay
//! - `GET /api/v1/version` - Get server version

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::ServerState;
use crate::config::{CorsConfig, ServerConfig};
use crate::error::{Error, HardwareError, Result};
use crate::hardware::{ContextHandle, HealthStatus};
use crate::protocol::{Operation, OperationInfo, Outcome, OPERATIONS};

/// REST server for the Bell experiment.
pub struct RestServer {
    state: Arc<ServerState>,
}

impl RestServer {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Build the router without binding.
    pub fn router(&self, cors: &CorsConfig) -> Router {
        Router::new()
            .route("/api/v1/health", get(health_check))
            .route("/api/v1/rigs", get(list_rigs))
            .route("/api/v1/operations", get(list_operations))
            .route("/api/v1/operations/:key", post(invoke_operation))
            .route("/api/v1/kill", post(kill))
            .route("/api/v1/version", get(get_version))
            .layer(cors_layer(cors))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the REST server.
    pub async fn serve(self, config: &ServerConfig) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid REST address: {}", e)))?;

        info!(address = %addr, "Starting REST server");

        let app = self.router(&config.cors);
        let mut shutdown_rx = self.state.shutdown_receiver();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Server(format!("Failed to bind REST server: {}", e)))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
                info!("REST server shutting down");
            })
            .await
            .map_err(|e| Error::Server(format!("REST server error: {}", e)))?;

        Ok(())
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if config.allow_all {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

// =============================================================================
// Request/Response types
// =============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    rigs: Vec<RigHealth>,
}

#[derive(Debug, Serialize)]
struct RigHealth {
    name: String,
    status: String,
    rig_type: String,
}

#[derive(Debug, Serialize)]
struct RigsResponse {
    rigs: Vec<RigSummary>,
    default_rig: Option<String>,
}

#[derive(Debug, Serialize)]
struct RigSummary {
    name: String,
    rig_type: String,
}

#[derive(Debug, Serialize)]
struct OperationsResponse {
    operations: Vec<OperationInfo>,
}

/// Body of an operation invocation. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct InvokeRequest {
    #[serde(default)]
    context: ContextHandle,
    rig: Option<String>,
}

#[derive(Debug, Serialize)]
struct InvokeResponse {
    request_id: String,
    operation: String,
    id: u32,
    values: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct KillResponse {
    shutdown_in_ms: u64,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    version: String,
    name: String,
}

/// Error response.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: &Error) -> ApiError {
    let (status, code) = match e {
        Error::Hardware(HardwareError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        Error::Hardware(HardwareError::Timeout(_)) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
        Error::Hardware(HardwareError::Unavailable(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "RIG_UNAVAILABLE")
        }
        Error::Hardware(_) => (StatusCode::BAD_GATEWAY, "HARDWARE_ERROR"),
        Error::NeedTwoQubits { .. } => (StatusCode::BAD_REQUEST, "NEED_TWO_QUBITS"),
        Error::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        Error::Parameter(_) => (StatusCode::UNPROCESSABLE_ENTITY, "PARAMETER_ERROR"),
        Error::Calibration(_) => (StatusCode::PRECONDITION_FAILED, "CALIBRATION_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            code: code.to_string(),
        }),
    )
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_check(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let registry = state.dispatcher.rigs();
    let mut rigs = Vec::new();
    let mut overall_healthy = true;

    for (name, rig_type) in registry.list_with_types() {
        let Ok(rig) = registry.get(&name) else {
            continue;
        };
        let status = match rig.health_check().await {
            Ok(HealthStatus::Healthy) => "healthy".to_string(),
            Ok(HealthStatus::Degraded) => {
                overall_healthy = false;
                "degraded".to_string()
            }
            Ok(HealthStatus::Unavailable) => {
                overall_healthy = false;
                "unavailable".to_string()
            }
            Err(e) => {
                overall_healthy = false;
                format!("error: {}", e)
            }
        };
        rigs.push(RigHealth {
            name,
            status,
            rig_type: rig_type.to_string(),
        });
    }

    Json(HealthResponse {
        status: if overall_healthy { "healthy" } else { "degraded" }.to_string(),
        rigs,
    })
}

async fn list_rigs(State(state): State<Arc<ServerState>>) -> Json<RigsResponse> {
    let registry = state.dispatcher.rigs();
    Json(RigsResponse {
        rigs: registry
            .list_with_types()
            .into_iter()
            .map(|(name, rig_type)| RigSummary {
                name,
                rig_type: rig_type.to_string(),
            })
            .collect(),
        default_rig: registry.default_rig_name(),
    })
}

async fn list_operations() -> Json<OperationsResponse> {
    Json(OperationsResponse {
        operations: OPERATIONS.iter().map(|(_, info)| *info).collect(),
    })
}

async fn invoke_operation(
    State(state): State<Arc<ServerState>>,
    Path(key): Path<String>,
    body: Option<Json<InvokeRequest>>,
) -> std::result::Result<Json<InvokeResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let operation = Operation::lookup(&key).ok_or_else(|| {
        api_error(&Error::Hardware(HardwareError::NotFound(format!(
            "operation '{}'",
            key
        ))))
    })?;

    debug!(
        request_id = %request_id,
        operation = %operation,
        context = %req.context,
        rig = ?req.rig,
        "REST invoke request"
    );

    let call = state
        .dispatcher
        .invoke(operation, req.context, req.rig.as_deref());
    let outcome = match tokio::time::timeout(state.timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::Hardware(HardwareError::Timeout(format!(
            "{} exceeded {}s",
            operation,
            state.timeout.as_secs()
        )))),
    }
    .map_err(|e| {
        error!(request_id = %request_id, error = %e, "Operation failed");
        api_error(&e)
    })?;

    let values = match outcome {
        Outcome::Values(values) => values,
        Outcome::Shutdown => {
            state.schedule_shutdown();
            Vec::new()
        }
    };

    Ok(Json(InvokeResponse {
        request_id,
        operation: operation.to_string(),
        id: operation.info().id,
        values,
    }))
}

async fn kill(State(state): State<Arc<ServerState>>) -> Json<KillResponse> {
    state.schedule_shutdown();
    Json(KillResponse {
        shutdown_in_ms: state.kill_delay.as_millis() as u64,
    })
}

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        name: "QubitOS Bell".to_string(),
    })
}
