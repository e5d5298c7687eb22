use crate::backend::BackendInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeRequest {
    /// Encoded plate crop (PNG, JPEG, ...), base64 with the standard alphabet
    pub image: String,
    /// Backend id; the service default when absent
    #[serde(default)]
    pub backend: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeResponse {
    pub text: String,
    pub confidence: f32,
    pub backend: String,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendListResponse {
    pub backends: Vec<BackendInfo>,
    pub default_backend: String,
}
