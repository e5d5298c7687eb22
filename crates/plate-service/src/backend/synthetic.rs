use super::ModelBackend;
use crate::config::SYNTHETIC_BACKEND_ID;
use anyhow::{bail, Result};
use ndarray::Array2;
use plate_core::{InferenceBackend, NormalizedTensor, ProbabilityGrid, RecognizerConfig};
use serde_json::json;

const PEAK: f32 = 0.9;

/// Development backend that ignores the image and always spells out a fixed text.
///
/// Step `t` peaks on character `min(t, n - 1)`, so the grid decodes back to the
/// configured text. Text with adjacent repeated characters is rejected because
/// the decoder would merge them.
pub struct SyntheticBackend {
    text: String,
    grid: ProbabilityGrid,
}

impl SyntheticBackend {
    pub fn new(config: &RecognizerConfig, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let symbols = text
            .chars()
            .map(|ch| {
                config
                    .alphabet
                    .index_of(ch)
                    .ok_or_else(|| anyhow::anyhow!("character {:?} is not in the alphabet", ch))
            })
            .collect::<Result<Vec<usize>>>()?;

        if symbols.is_empty() {
            bail!("synthetic text must not be empty");
        }
        if symbols.len() > config.time_steps {
            bail!(
                "synthetic text has {} characters but the model only has {} time steps",
                symbols.len(),
                config.time_steps
            );
        }
        if symbols.windows(2).any(|pair| pair[0] == pair[1]) {
            bail!("synthetic text {:?} repeats a character back to back", text);
        }

        let classes = config.alphabet_size();
        let rest = if classes > 1 {
            (1.0 - PEAK) / (classes - 1) as f32
        } else {
            0.0
        };
        let mut values = Array2::from_elem((config.time_steps, classes), rest);
        for t in 0..config.time_steps {
            let symbol = symbols[t.min(symbols.len() - 1)];
            values[[t, symbol]] = PEAK;
        }

        Ok(Self {
            text,
            grid: ProbabilityGrid::new(values),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl InferenceBackend for SyntheticBackend {
    fn infer(&self, _tensor: NormalizedTensor) -> Result<ProbabilityGrid> {
        Ok(self.grid.clone())
    }
}

impl ModelBackend for SyntheticBackend {
    fn id(&self) -> &'static str {
        SYNTHETIC_BACKEND_ID
    }

    fn name(&self) -> &'static str {
        "Synthetic Backend"
    }

    fn description(&self) -> &'static str {
        "Deterministic backend that always reads the configured text"
    }

    fn details(&self) -> Option<serde_json::Value> {
        Some(json!({ "text": self.text }))
    }
}
