use axum::extract::State;
use serde::Serialize;

use crate::api::response::{success, ApiResponse};
use crate::controller::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: &'static str,
    regions_loaded: usize,
}

/// GET /api/v1/healthz
///
/// Rule tables are validated before the server starts, so a running process
/// always has a usable set.
pub async fn healthz(State(st): State<AppState>) -> ApiResponse<HealthResponse> {
    success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION"),
        regions_loaded: st.tables.regions().count(),
    })
}
