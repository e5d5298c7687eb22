use crate::api::dto::{RecognizeRequest, RecognizeResponse};
use crate::backend::{registry::BackendRegistry, ModelBackend};
use crate::config::PlateServiceConfig;
use crate::error::ApiError;
use base64::{engine::general_purpose::STANDARD, Engine};
use plate_core::{
    DecodedPlate, InferenceBackend, NormalizedTensor, PlateRecognizer, ProbabilityGrid,
    RecognizerConfig,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{info, warn};

type SharedRecognizer = Arc<PlateRecognizer<TimedBackend>>;

#[derive(Clone)]
pub struct PlateServiceState {
    inner: Arc<PlateServiceStateInner>,
}

struct PlateServiceStateInner {
    node_id: String,
    recognizer_config: RecognizerConfig,
    backends: BackendRegistry,
    /// One recognizer per backend id, built on first use
    recognizers: RwLock<HashMap<String, SharedRecognizer>>,
    default_backend: String,
    max_image_bytes: usize,
}

/// Records time spent inside the model, separate from end-to-end latency.
struct TimedBackend {
    backend: Arc<dyn ModelBackend>,
}

impl InferenceBackend for TimedBackend {
    fn infer(&self, tensor: NormalizedTensor) -> anyhow::Result<ProbabilityGrid> {
        let start = Instant::now();
        let result = self.backend.infer(tensor);
        telemetry::metrics::PLATE_INFERENCE_TIME
            .with_label_values(&[self.backend.id()])
            .observe(start.elapsed().as_secs_f64());
        result
    }
}

impl PlateServiceState {
    pub fn new(
        config: &PlateServiceConfig,
        recognizer_config: RecognizerConfig,
        backends: BackendRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(PlateServiceStateInner {
                node_id: config.node_id.clone(),
                recognizer_config,
                backends,
                recognizers: RwLock::new(HashMap::new()),
                default_backend: config.default_backend.clone(),
                max_image_bytes: config.max_image_bytes,
            }),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.inner.node_id
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.inner.backends
    }

    pub fn default_backend(&self) -> &str {
        &self.inner.default_backend
    }

    pub fn recognizer_config(&self) -> &RecognizerConfig {
        &self.inner.recognizer_config
    }

    pub fn max_image_bytes(&self) -> usize {
        self.inner.max_image_bytes
    }

    /// Decode the uploaded image and run it through the selected backend.
    pub async fn recognize(&self, request: RecognizeRequest) -> Result<RecognizeResponse, ApiError> {
        let backend_id = request
            .backend
            .unwrap_or_else(|| self.inner.default_backend.clone());
        let backend = self
            .inner
            .backends
            .get(&backend_id)
            .await
            .ok_or_else(|| ApiError::not_found(format!("Backend '{}' not found", backend_id)))?;

        let start = Instant::now();
        let result = self.run_recognition(&backend_id, backend, &request.image).await;
        let elapsed = start.elapsed();

        telemetry::metrics::PLATE_RECOGNITION_LATENCY
            .with_label_values(&[backend_id.as_str()])
            .observe(elapsed.as_secs_f64());

        match result {
            Ok(decoded) => {
                record_outcome(&backend_id, "success");
                info!(
                    node_id = %self.inner.node_id,
                    backend = %backend_id,
                    text = %decoded.text,
                    confidence = decoded.confidence,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "plate recognized"
                );
                Ok(RecognizeResponse {
                    text: decoded.text,
                    confidence: decoded.confidence,
                    backend: backend_id,
                    processing_time_ms: elapsed.as_millis() as u64,
                })
            }
            Err(e) => {
                record_outcome(&backend_id, outcome_label(&e));
                warn!(backend = %backend_id, error = %e, "plate recognition failed");
                Err(e)
            }
        }
    }

    async fn run_recognition(
        &self,
        backend_id: &str,
        backend: Arc<dyn ModelBackend>,
        encoded: &str,
    ) -> Result<DecodedPlate, ApiError> {
        let bytes = self.decode_image(encoded)?;
        let recognizer = self.recognizer_for(backend_id, backend).await?;
        let decoded = tokio::task::spawn_blocking(move || recognizer.recognize_bytes(&bytes)).await??;
        Ok(decoded)
    }

    async fn recognizer_for(
        &self,
        backend_id: &str,
        backend: Arc<dyn ModelBackend>,
    ) -> Result<SharedRecognizer, ApiError> {
        if let Some(recognizer) = self.inner.recognizers.read().await.get(backend_id) {
            return Ok(Arc::clone(recognizer));
        }

        let mut recognizers = self.inner.recognizers.write().await;
        if let Some(recognizer) = recognizers.get(backend_id) {
            return Ok(Arc::clone(recognizer));
        }

        let recognizer = Arc::new(PlateRecognizer::new(
            self.inner.recognizer_config.clone(),
            TimedBackend { backend },
        )?);
        recognizers.insert(backend_id.to_string(), Arc::clone(&recognizer));
        Ok(recognizer)
    }

    fn decode_image(&self, encoded: &str) -> Result<Vec<u8>, ApiError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ApiError::bad_request(format!("image is not valid base64: {}", e)))?;

        if bytes.is_empty() {
            return Err(ApiError::bad_request("image is empty"));
        }
        if bytes.len() > self.inner.max_image_bytes {
            return Err(ApiError::bad_request(format!(
                "image is {} bytes, limit is {}",
                bytes.len(),
                self.inner.max_image_bytes
            )));
        }
        Ok(bytes)
    }
}

/// Client input problems are "rejected", everything else is an "error".
fn outcome_label(err: &ApiError) -> &'static str {
    match err {
        ApiError::BadRequest(_) => "rejected",
        _ => "error",
    }
}

fn record_outcome(backend: &str, status: &str) {
    telemetry::metrics::PLATE_RECOGNITIONS
        .with_label_values(&[backend, status])
        .inc();
}
