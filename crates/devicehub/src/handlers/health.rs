//! Health check endpoints for Kubernetes-style health checks.
//!
//! - `/livez` - Basic liveness check (immediate 200, no checks)
//! - `/healthz` - Backend name, capabilities and pool stats (passive)
//! - `/readyz` - Readiness check (active storage check)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use devicehub_core::storage::BackendCapabilities;

use crate::{state::AppState, storage::sqlite::PoolStats};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub backend: &'static str,
    pub capabilities: BackendCapabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

#[derive(Debug, Serialize)]
pub struct ReadinessReport {
    pub healthy: bool,
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /livez - Basic liveness check.
///
/// Returns 200 immediately. Does not touch storage.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Storage stats without issuing a query.
#[axum::debug_handler]
pub async fn healthz(State(state): State<AppState>) -> Json<HealthReport> {
    let pool = match &state.pool {
        Some(pool) => Some(pool.stats().await),
        None => None,
    };

    Json(HealthReport {
        backend: state.repository.backend_name(),
        capabilities: state.repository.capabilities(),
        pool,
    })
}

/// GET /readyz - Readiness check.
///
/// Returns 200 when the backend answers a health check, 503 otherwise.
#[axum::debug_handler]
pub async fn readyz(State(state): State<AppState>) -> Response {
    let backend = state.repository.backend_name();

    match state.repository.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessReport {
                healthy: true,
                backend,
                error: None,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(backend, error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessReport {
                    healthy: false,
                    backend,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
