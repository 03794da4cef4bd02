//! Liveness endpoint.

use axum::Json;
use chrono::Utc;

use crate::models::HealthResponse;

/// `GET /health`: always `ok` while the process is serving.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        timestamp: Utc::now(),
    })
}
