use crate::config::RecognizerConfig;
use crate::decode::{DecodedPlate, SequenceDecoder};
use crate::error::{RecognitionError, Result};
use crate::inference::InferenceBackend;
use crate::normalize::ImageNormalizer;
use crate::tensor::ProbabilityGrid;
use image::DynamicImage;
use tracing::{debug, instrument};

/// normalize -> infer -> decode, all on the calling thread.
///
/// Holds no per-call state, so one recognizer can serve concurrent callers
/// as long as the backend can.
pub struct PlateRecognizer<B> {
    config: RecognizerConfig,
    normalizer: ImageNormalizer,
    decoder: SequenceDecoder,
    backend: B,
}

impl<B: InferenceBackend> PlateRecognizer<B> {
    pub fn new(config: RecognizerConfig, backend: B) -> Result<Self> {
        config.validate()?;
        let normalizer = ImageNormalizer::from_config(&config)?;
        let decoder = SequenceDecoder::new(config.alphabet.clone());

        Ok(Self {
            config,
            normalizer,
            decoder,
            backend,
        })
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn recognize(&self, img: &DynamicImage) -> Result<String> {
        self.recognize_detailed(img).map(|decoded| decoded.text)
    }

    #[instrument(skip_all, fields(width = img.width(), height = img.height()))]
    pub fn recognize_detailed(&self, img: &DynamicImage) -> Result<DecodedPlate> {
        let tensor = self.normalizer.normalize(img)?;
        let grid = self
            .backend
            .infer(tensor)
            .map_err(RecognitionError::Inference)?;
        self.check_grid(&grid)?;

        let decoded = self.decoder.decode_detailed(&grid)?;
        debug!(text = %decoded.text, confidence = decoded.confidence, "plate recognized");
        Ok(decoded)
    }

    /// Decode an encoded image (PNG, JPEG, ...) and recognize it.
    pub fn recognize_bytes(&self, bytes: &[u8]) -> Result<DecodedPlate> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| RecognitionError::invalid_image(format!("failed to decode image: {}", e)))?;
        self.recognize_detailed(&img)
    }

    fn check_grid(&self, grid: &ProbabilityGrid) -> Result<()> {
        let expected = (self.config.time_steps, self.config.alphabet_size());
        let actual = (grid.time_steps(), grid.alphabet_size());
        if expected != actual {
            return Err(RecognitionError::shape_mismatch(
                format!("[{}, {}]", expected.0, expected.1),
                format!("[{}, {}]", actual.0, actual.1),
            ));
        }
        Ok(())
    }
}
