use anyhow::{bail, Context, Result};
use reqwest::Url;
use std::env;
use std::time::Duration;

pub const SYNTHETIC_BACKEND_ID: &str = "synthetic";
pub const REMOTE_BACKEND_ID: &str = "remote";

#[derive(Debug, Clone)]
pub struct PlateServiceConfig {
    /// Address to bind the HTTP server to
    pub bind_addr: String,

    /// Node ID for this service instance
    pub node_id: String,

    /// Predict endpoint of the model server (enables the remote backend)
    pub model_url: Option<Url>,

    /// Request timeout for the remote backend
    pub model_timeout: Duration,

    /// Backend used when a request does not name one
    pub default_backend: String,

    /// Text the synthetic backend spells out
    pub synthetic_text: String,

    /// Largest accepted image payload after base64 decoding
    pub max_image_bytes: usize,
}

impl PlateServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("PLATE_SERVICE_ADDR").unwrap_or_else(|| "0.0.0.0:8090".to_string());

        let node_id = lookup("NODE_ID").unwrap_or_else(|| {
            format!(
                "plate-service-{}",
                hostname::get()
                    .ok()
                    .and_then(|h| h.into_string().ok())
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
            )
        });

        let model_url = lookup("PLATE_MODEL_URL")
            .map(|s| Url::parse(&s).context("Invalid PLATE_MODEL_URL"))
            .transpose()?;

        let model_timeout = match lookup("PLATE_MODEL_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(
                raw.parse()
                    .with_context(|| format!("Invalid PLATE_MODEL_TIMEOUT_MS: {}", raw))?,
            ),
            None => Duration::from_millis(5000),
        };

        let default_backend = lookup("PLATE_DEFAULT_BACKEND").unwrap_or_else(|| {
            if model_url.is_some() {
                REMOTE_BACKEND_ID.to_string()
            } else {
                SYNTHETIC_BACKEND_ID.to_string()
            }
        });
        if default_backend == REMOTE_BACKEND_ID && model_url.is_none() {
            bail!("PLATE_DEFAULT_BACKEND is 'remote' but PLATE_MODEL_URL is not set");
        }

        let synthetic_text = lookup("PLATE_SYNTHETIC_TEXT").unwrap_or_else(|| "HB AB 123".to_string());

        let max_image_bytes = match lookup("PLATE_MAX_IMAGE_BYTES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid PLATE_MAX_IMAGE_BYTES: {}", raw))?,
            None => 10 * 1024 * 1024,
        };

        Ok(Self {
            bind_addr,
            node_id,
            model_url,
            model_timeout,
            default_backend,
            synthetic_text,
            max_image_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<PlateServiceConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlateServiceConfig::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("NODE_ID", "node-a")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8090");
        assert_eq!(config.node_id, "node-a");
        assert!(config.model_url.is_none());
        assert_eq!(config.model_timeout, Duration::from_millis(5000));
        assert_eq!(config.default_backend, SYNTHETIC_BACKEND_ID);
        assert_eq!(config.synthetic_text, "HB AB 123");
        assert_eq!(config.max_image_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_generated_node_id() {
        let config = config_from(&[]).unwrap();
        assert!(config.node_id.starts_with("plate-service-"));
    }

    #[test]
    fn test_model_url_selects_remote_default() {
        let config = config_from(&[
            ("PLATE_MODEL_URL", "http://models:8501/v1/models/plates:predict"),
            ("PLATE_MODEL_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.default_backend, REMOTE_BACKEND_ID);
        assert_eq!(config.model_timeout, Duration::from_millis(250));
        assert_eq!(
            config.model_url.unwrap().as_str(),
            "http://models:8501/v1/models/plates:predict"
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("PLATE_MODEL_URL", "not a url")]).is_err());
        assert!(config_from(&[("PLATE_MODEL_TIMEOUT_MS", "soon")]).is_err());
        assert!(config_from(&[("PLATE_MAX_IMAGE_BYTES", "-1")]).is_err());
        assert!(config_from(&[("PLATE_DEFAULT_BACKEND", "remote")]).is_err());
    }
}
