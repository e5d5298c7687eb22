use thiserror::Error;

/// Failures surfaced by the recognition pipeline.
///
/// Every variant is reported to the caller as-is; nothing in this crate
/// retries or produces partial output.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised by the inference backend and passed through untouched.
    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl RecognitionError {
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RecognitionError>;
