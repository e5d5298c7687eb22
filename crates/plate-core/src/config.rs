use crate::alphabet::Alphabet;
use crate::error::{RecognitionError, Result};
use serde::{Deserialize, Serialize};

/// Model contract shared by the normalizer, the decoder and the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Width the plate is resized to; becomes the outer axis of the tensor
    #[serde(default = "default_input_width")]
    pub input_width: u32,

    /// Height after crop/pad; becomes the inner axis of the tensor
    #[serde(default = "default_input_height")]
    pub input_height: u32,

    /// Number of output positions produced by the model
    #[serde(default = "default_time_steps")]
    pub time_steps: usize,

    /// Output label table, one symbol per model class
    #[serde(default)]
    pub alphabet: Alphabet,
}

fn default_input_width() -> u32 {
    128
}

fn default_input_height() -> u32 {
    64
}

fn default_time_steps() -> usize {
    32
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            input_width: default_input_width(),
            input_height: default_input_height(),
            time_steps: default_time_steps(),
            alphabet: Alphabet::default(),
        }
    }
}

impl RecognizerConfig {
    pub fn alphabet_size(&self) -> usize {
        self.alphabet.len()
    }

    /// Number of floats in a normalized tensor.
    pub fn tensor_len(&self) -> usize {
        self.input_width as usize * self.input_height as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_width == 0 || self.input_height == 0 {
            return Err(RecognitionError::invalid_config(format!(
                "input size must be non-zero, got {}x{}",
                self.input_width, self.input_height
            )));
        }
        if self.time_steps == 0 {
            return Err(RecognitionError::invalid_config("time_steps must be non-zero"));
        }
        if self.alphabet.is_empty() {
            return Err(RecognitionError::invalid_config("alphabet must not be empty"));
        }
        Ok(())
    }
}
