use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Prometheus text exposition of the process metrics.
pub async fn metrics() -> Result<String, StatusCode> {
    common::metrics::gather_metrics().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
