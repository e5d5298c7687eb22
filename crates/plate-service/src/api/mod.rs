pub mod dto;
pub mod routes;

use crate::state::PlateServiceState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn router(state: PlateServiceState) -> Router {
    // base64 inflates the payload by a third, plus room for the JSON envelope
    let body_limit = state.max_image_bytes().div_ceil(3) * 4 + 4096;

    Router::new()
        // Health and metrics endpoints
        .route("/healthz", get(routes::healthz))
        .route("/readyz", get(routes::readyz))
        .route("/metrics", get(routes::metrics))
        // Backend endpoints
        .route("/v1/backends", get(routes::list_backends))
        .route("/v1/backends/:id", get(routes::get_backend))
        // Recognition
        .route("/v1/recognize", post(routes::recognize))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
