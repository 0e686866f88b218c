use axum::Json;

use crate::models::HealthResponse;

/// `GET /health` — liveness probe.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: aci_core::version().into(),
    })
}
