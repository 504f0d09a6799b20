//! Liveness check for the provisioning API.

use axum::Json;
use serde::Serialize;

/// Liveness body. Reports the running build; store and relay
/// reachability are not checked here.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health: reports that the provisioning API is serving requests.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
