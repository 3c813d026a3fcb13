use axum::{routing::get, Json, Router};

use crate::models::HealthResponse;

pub fn router() -> Router {
    Router::new().route("/api/health", get(health_check))
}

/// Health check del servizio
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Servizio funzionante", body = HealthResponse),
    ),
    tag = "Sistema"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
