use super::ModelBackend;
use crate::config::REMOTE_BACKEND_ID;
use anyhow::{anyhow, bail, Context, Result};
use plate_core::{InferenceBackend, NormalizedTensor, ProbabilityGrid};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{instrument, warn};

/// Request body of a TensorFlow-Serving style predict call
#[derive(Debug, Serialize)]
struct PredictRequest {
    /// One instance shaped [width][height][1]
    instances: Vec<Vec<Vec<Vec<f32>>>>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    /// One [time_steps][alphabet_size] grid per instance
    predictions: Vec<Vec<Vec<f32>>>,
}

/// Backend that forwards the tensor to a model server over HTTP.
///
/// `infer` blocks on the runtime the backend was created in, so it must be
/// called from a blocking thread (`spawn_blocking`) and never from async code.
pub struct RemoteModelBackend {
    endpoint: Url,
    client: reqwest::Client,
    runtime: Handle,
    healthy: AtomicBool,
}

impl RemoteModelBackend {
    /// Must be called inside a tokio runtime.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let runtime = Handle::try_current().context("remote backend needs a tokio runtime")?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            endpoint,
            client,
            runtime,
            healthy: AtomicBool::new(true),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn predict(&self, tensor: NormalizedTensor) -> Result<ProbabilityGrid> {
        let request = PredictRequest {
            instances: vec![to_instance(&tensor)],
        };

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .context("model server request failed")?;
        let resp = resp
            .error_for_status()
            .context("model server returned error status")?;
        let body: PredictResponse = resp
            .json()
            .await
            .context("failed to parse model server response")?;

        to_grid(body)
    }
}

/// Lay the transposed buffer out as nested [W][H][1] rows.
fn to_instance(tensor: &NormalizedTensor) -> Vec<Vec<Vec<f32>>> {
    tensor
        .as_slice()
        .chunks(tensor.height().max(1))
        .map(|column| column.iter().map(|&v| vec![v]).collect())
        .collect()
}

fn to_grid(body: PredictResponse) -> Result<ProbabilityGrid> {
    let rows = body
        .predictions
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("model server returned no predictions"))?;

    let steps = rows.len();
    let classes = rows.first().map(Vec::len).unwrap_or(0);
    if rows.iter().any(|row| row.len() != classes) {
        bail!("model server returned ragged predictions");
    }

    let data = rows.into_iter().flatten().collect();
    Ok(ProbabilityGrid::from_shape_vec(&[steps, classes], data)?)
}

impl InferenceBackend for RemoteModelBackend {
    fn infer(&self, tensor: NormalizedTensor) -> Result<ProbabilityGrid> {
        let result = self.runtime.block_on(self.predict(tensor));
        if let Err(e) = &result {
            warn!(endpoint = %self.endpoint, error = %e, "remote inference failed");
        }
        self.healthy.store(result.is_ok(), Ordering::Relaxed);
        result
    }
}

impl ModelBackend for RemoteModelBackend {
    fn id(&self) -> &'static str {
        REMOTE_BACKEND_ID
    }

    fn name(&self) -> &'static str {
        "Remote Model Server"
    }

    fn description(&self) -> &'static str {
        "Forwards plate tensors to an HTTP predict endpoint"
    }

    fn details(&self) -> Option<serde_json::Value> {
        Some(json!({ "endpoint": self.endpoint.as_str() }))
    }

    /// Healthy until a call fails, and again after the next success.
    fn health_check(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}
