pub mod registry;
pub mod remote;
pub mod synthetic;

use plate_core::InferenceBackend;
use serde::{Deserialize, Serialize};

/// Backend metadata exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    /// Backend-specific details (endpoint, emitted text, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// A model runtime the service can route recognition requests to.
///
/// `infer` is synchronous and may block; the service only calls it from the
/// blocking thread pool.
pub trait ModelBackend: InferenceBackend {
    /// Unique backend identifier (e.g., "remote")
    fn id(&self) -> &'static str;

    /// Human-readable backend name
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn details(&self) -> Option<serde_json::Value> {
        None
    }

    fn info(&self) -> BackendInfo {
        BackendInfo {
            id: self.id().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
            version: self.version().to_string(),
            details: self.details(),
        }
    }

    /// Cheap, non-blocking health check
    fn health_check(&self) -> bool {
        true
    }
}
