//! License plate text recognition around an opaque sequence model.
//!
//! The crate owns the deterministic parts of the pipeline: turning a plate crop
//! into the model's input tensor and turning the model's per-position scores
//! back into text. The model itself is any [`InferenceBackend`].

pub mod alphabet;
pub mod config;
pub mod decode;
pub mod error;
pub mod inference;
pub mod normalize;
pub mod pipeline;
pub mod tensor;

pub use alphabet::{Alphabet, PLATE_ALPHABET};
pub use config::RecognizerConfig;
pub use decode::{DecodedPlate, SequenceDecoder};
pub use error::{RecognitionError, Result};
pub use inference::{FnBackend, InferenceBackend};
pub use normalize::{HeightFit, ImageNormalizer};
pub use pipeline::PlateRecognizer;
pub use tensor::{NormalizedTensor, ProbabilityGrid};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Normalize an image to a `width` x `height` model input.
pub fn normalize(img: &image::DynamicImage, width: u32, height: u32) -> Result<NormalizedTensor> {
    ImageNormalizer::new(width, height)?.normalize(img)
}

/// Greedy-decode a probability grid against an alphabet.
pub fn decode(grid: &ProbabilityGrid, alphabet: &Alphabet) -> Result<String> {
    SequenceDecoder::new(alphabet.clone()).decode(grid)
}
