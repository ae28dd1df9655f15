use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    uptime_secs: i64,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    model_store: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    cached_models: usize,
    snapshots_enabled: bool,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.engine.store();

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        uptime_secs: state.uptime_secs(),
        checks: HealthChecks {
            model_store: ComponentHealth {
                status: "healthy".to_string(),
                cached_models: store.len(),
                snapshots_enabled: store.snapshot_dir().is_some(),
            },
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /healthz - Liveness probe
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
