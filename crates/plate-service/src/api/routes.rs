use crate::api::dto::{BackendListResponse, RecognizeRequest};
use crate::error::ApiError;
use crate::state::PlateServiceState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

/// Recognize the plate in an uploaded image
pub async fn recognize(
    State(state): State<PlateServiceState>,
    Json(request): Json<RecognizeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.recognize(request).await?;
    Ok((StatusCode::OK, Json(response)))
}

/// List all registered model backends
pub async fn list_backends(State(state): State<PlateServiceState>) -> impl IntoResponse {
    let backends = state.backends().list().await;
    let response = BackendListResponse {
        backends,
        default_backend: state.default_backend().to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// Get information about a specific backend
pub async fn get_backend(
    State(state): State<PlateServiceState>,
    Path(backend_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let backend = state
        .backends()
        .get(&backend_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Backend '{}' not found", backend_id)))?;
    Ok((StatusCode::OK, Json(backend.info())))
}

/// Health check endpoint
pub async fn healthz(State(state): State<PlateServiceState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "plate-service",
            "node_id": state.node_id(),
            "version": plate_core::VERSION
        })),
    )
}

/// Readiness check endpoint
pub async fn readyz(State(state): State<PlateServiceState>) -> impl IntoResponse {
    let backend_health = state.backends().health_check_all().await;
    let all_healthy = backend_health.values().all(|&h| h);

    if all_healthy {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "backends": backend_health
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not ready",
                "backends": backend_health
            })),
        )
    }
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics() -> impl IntoResponse {
    match telemetry::metrics::encode_metrics() {
        Ok(body) => body.into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
