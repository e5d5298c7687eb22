use super::{BackendInfo, ModelBackend};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry for model backends
#[derive(Clone)]
pub struct BackendRegistry {
    backends: Arc<RwLock<HashMap<String, Arc<dyn ModelBackend>>>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a backend; ids must be unique
    pub async fn register(&self, backend: Arc<dyn ModelBackend>) -> Result<()> {
        let mut backends = self.backends.write().await;
        let id = backend.id().to_string();

        if backends.contains_key(&id) {
            return Err(anyhow!("Backend '{}' is already registered", id));
        }

        backends.insert(id.clone(), backend);
        tracing::info!("Registered model backend: {}", id);
        Ok(())
    }

    pub async fn get(&self, backend_id: &str) -> Option<Arc<dyn ModelBackend>> {
        let backends = self.backends.read().await;
        backends.get(backend_id).cloned()
    }

    /// List all registered backends, sorted by id
    pub async fn list(&self) -> Vec<BackendInfo> {
        let backends = self.backends.read().await;
        let mut infos: Vec<BackendInfo> = backends.values().map(|b| b.info()).collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    pub async fn has_backend(&self, backend_id: &str) -> bool {
        let backends = self.backends.read().await;
        backends.contains_key(backend_id)
    }

    pub async fn count(&self) -> usize {
        let backends = self.backends.read().await;
        backends.len()
    }

    /// Probe every backend and publish the result as a gauge
    pub async fn health_check_all(&self) -> HashMap<String, bool> {
        let backends = self.backends.read().await;
        let mut results = HashMap::new();

        for (id, backend) in backends.iter() {
            let healthy = backend.health_check();
            telemetry::metrics::PLATE_BACKEND_HEALTH
                .with_label_values(&[id.as_str()])
                .set(i64::from(healthy));
            results.insert(id.clone(), healthy);
        }

        results
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
