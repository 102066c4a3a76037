//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness))
        .route("/live", get(liveness))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub checks: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProbeResponse {
    pub status: String,
    pub timestamp: String,
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let mut checks = BTreeMap::new();
    checks.insert("tenant_registry".to_string(), "healthy".to_string());

    Json(HealthResponse {
        status: "healthy".into(),
        service: state.settings.service.name.clone(),
        version: state.settings.service.version.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks,
    })
}

/// Readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    responses((status = 200, description = "Ready to serve traffic", body = ProbeResponse)),
    tag = "health"
)]
pub async fn readiness() -> Json<ProbeResponse> {
    probe("ready")
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    responses((status = 200, description = "Process is alive", body = ProbeResponse)),
    tag = "health"
)]
pub async fn liveness() -> Json<ProbeResponse> {
    probe("alive")
}

fn probe(status: &str) -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: status.into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
