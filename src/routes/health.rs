use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status (always "ok" when reachable)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether a port gazetteer is loaded
    pub gazetteer_loaded: bool,
    /// Number of ports in the loaded gazetteer
    pub port_count: usize,
}

/// Health check endpoint.
///
/// Reports the API version and whether a gazetteer has been loaded, so
/// clients can tell an empty instance from a seeded one.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.datasets.read().await;
    let port_count = store.gazetteer.as_ref().map_or(0, |g| g.len());

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        gazetteer_loaded: store.gazetteer.is_some(),
        port_count,
    })
}
