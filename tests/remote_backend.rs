/// Integration tests for the HTTP model backend against an in-process model server
use axum::{http::StatusCode, routing::post, Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use plate_core::{Alphabet, InferenceBackend, NormalizedTensor, RecognizerConfig};
use plate_service::{
    api,
    api::dto::RecognizeResponse,
    backend::{remote::RemoteModelBackend, ModelBackend},
    BackendRegistry, PlateServiceConfig, PlateServiceState,
};
use reqwest::Url;
use serde_json::{json, Value};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const MODEL_TEXT: &str = "HB 7";

/// One-hot predictions over `steps` positions spelling `text`
fn predictions(text: &str, steps: usize) -> Value {
    let alphabet = Alphabet::plates();
    let symbols: Vec<usize> = text
        .chars()
        .map(|ch| alphabet.index_of(ch).unwrap())
        .collect();
    let grid: Vec<Vec<f32>> = (0..steps)
        .map(|t| {
            let hot = symbols[t.min(symbols.len() - 1)];
            (0..alphabet.len())
                .map(|c| if c == hot { 0.95 } else { 0.001 })
                .collect()
        })
        .collect();
    json!({ "predictions": [grid] })
}

async fn predict(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let instance = &body["instances"][0];
    let columns = instance.as_array().ok_or(StatusCode::BAD_REQUEST)?;
    let rows = columns[0].as_array().ok_or(StatusCode::BAD_REQUEST)?;
    if columns.len() != 128 || rows.len() != 64 || rows[0].as_array().map(Vec::len) != Some(1) {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(predictions(MODEL_TEXT, 32)))
}

async fn short_predict(Json(_body): Json<Value>) -> Json<Value> {
    Json(predictions(MODEL_TEXT, 31))
}

async fn failing_predict(Json(_body): Json<Value>) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn slow_predict(Json(_body): Json<Value>) -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(predictions(MODEL_TEXT, 32))
}

/// Start a model server on an ephemeral port
async fn spawn_model_server() -> SocketAddr {
    let app = Router::new()
        .route("/predict", post(predict))
        .route("/short", post(short_predict))
        .route("/fail", post(failing_predict))
        .route("/slow", post(slow_predict));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn endpoint(addr: SocketAddr, path: &str) -> Url {
    Url::parse(&format!("http://{}{}", addr, path)).unwrap()
}

fn blank_tensor() -> NormalizedTensor {
    NormalizedTensor::new(128, 64, vec![0.5; 128 * 64]).unwrap()
}

fn plate_png() -> String {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(256, 60, Rgb([250, 250, 250])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    STANDARD.encode(buf.into_inner())
}

async fn infer_blocking(
    backend: Arc<RemoteModelBackend>,
) -> anyhow::Result<plate_core::ProbabilityGrid> {
    tokio::task::spawn_blocking(move || backend.infer(blank_tensor()))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remote_inference_round_trip() {
    telemetry::init();
    let addr = spawn_model_server().await;
    let backend =
        Arc::new(RemoteModelBackend::new(endpoint(addr, "/predict"), Duration::from_secs(5)).unwrap());

    let grid = infer_blocking(Arc::clone(&backend)).await.unwrap();
    assert_eq!(grid.time_steps(), 32);
    assert_eq!(grid.alphabet_size(), 42);
    assert!(backend.health_check());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remote_failure_marks_unhealthy() {
    let addr = spawn_model_server().await;
    let backend =
        Arc::new(RemoteModelBackend::new(endpoint(addr, "/fail"), Duration::from_secs(5)).unwrap());

    let err = infer_blocking(Arc::clone(&backend)).await.unwrap_err();
    assert!(format!("{:#}", err).contains("error status"));
    assert!(!backend.health_check());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remote_timeout() {
    let addr = spawn_model_server().await;
    let backend = Arc::new(
        RemoteModelBackend::new(endpoint(addr, "/slow"), Duration::from_millis(200)).unwrap(),
    );

    assert!(infer_blocking(backend).await.is_err());
}

/// Service wired to the model server, with `remote` as the default backend
async fn setup_remote_service(path: &str) -> axum_test::TestServer {
    let addr = spawn_model_server().await;
    let model_url = endpoint(addr, path).to_string();
    let config = PlateServiceConfig::from_lookup(|key| match key {
        "NODE_ID" => Some("remote-test".to_string()),
        "PLATE_MODEL_URL" => Some(model_url.clone()),
        _ => None,
    })
    .unwrap();

    let registry = BackendRegistry::new();
    let remote = RemoteModelBackend::new(
        config.model_url.clone().unwrap(),
        config.model_timeout,
    )
    .unwrap();
    registry.register(Arc::new(remote)).await.unwrap();

    let state = PlateServiceState::new(&config, RecognizerConfig::default(), registry);
    axum_test::TestServer::new(api::router(state)).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_service_recognizes_through_model_server() {
    let server = setup_remote_service("/predict").await;

    let response = server
        .post("/v1/recognize")
        .json(&json!({ "image": plate_png() }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: RecognizeResponse = response.json();
    assert_eq!(body.text, MODEL_TEXT);
    assert_eq!(body.backend, "remote");
    assert!((body.confidence - 0.95).abs() < 1e-4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_service_reports_bad_gateway() {
    let server = setup_remote_service("/short").await;
    let response = server
        .post("/v1/recognize")
        .json(&json!({ "image": plate_png() }))
        .await;
    assert_eq!(response.status_code(), 502);

    let server = setup_remote_service("/fail").await;
    let response = server
        .post("/v1/recognize")
        .json(&json!({ "image": plate_png() }))
        .await;
    assert_eq!(response.status_code(), 502);

    let response = server.get("/readyz").await;
    assert_eq!(response.status_code(), 503);
}
