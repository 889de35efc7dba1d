use axum::{routing::get, Router};

use crate::api::{health, quote, regions};
use crate::controller::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/quote", get(quote::get_quote))
        .route("/regions", get(regions::list_regions))
        .route("/healthz", get(health::healthz))
        .with_state(state)
}
