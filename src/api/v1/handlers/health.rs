use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Liveness probe; never touches the token codec.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
