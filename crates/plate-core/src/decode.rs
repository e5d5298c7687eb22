use crate::alphabet::Alphabet;
use crate::error::{RecognitionError, Result};
use crate::tensor::ProbabilityGrid;

/// Greedy decode result with the evidence behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPlate {
    pub text: String,
    /// Mean of the winning score over all time steps
    pub confidence: f32,
    /// Collapsed symbol indices, including any out-of-range ones
    pub symbols: Vec<usize>,
}

/// Greedy CTC-style decoder: arg-max per step, merge adjacent repeats, map to characters.
///
/// There is no dedicated blank symbol; every index that survives the collapse
/// and lies inside the alphabet becomes a character.
#[derive(Debug, Clone)]
pub struct SequenceDecoder {
    alphabet: Alphabet,
}

impl SequenceDecoder {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn decode(&self, grid: &ProbabilityGrid) -> Result<String> {
        self.decode_detailed(grid).map(|decoded| decoded.text)
    }

    pub fn decode_detailed(&self, grid: &ProbabilityGrid) -> Result<DecodedPlate> {
        self.check_shape(grid)?;

        let path = best_path(grid);
        let confidence = path.iter().map(|&(_, score)| score).sum::<f32>() / path.len() as f32;

        let indices: Vec<usize> = path.into_iter().map(|(index, _)| index).collect();
        let symbols = collapse_repeats(&indices);
        let text = self.map_symbols(&symbols);

        tracing::debug!(
            time_steps = grid.time_steps(),
            groups = symbols.len(),
            text = %text,
            confidence,
            "decoded plate sequence"
        );

        Ok(DecodedPlate {
            text,
            confidence,
            symbols,
        })
    }

    /// Map symbol indices to characters, silently skipping indices outside the alphabet.
    pub fn map_symbols(&self, symbols: &[usize]) -> String {
        symbols
            .iter()
            .filter_map(|&index| self.alphabet.get(index))
            .collect()
    }

    fn check_shape(&self, grid: &ProbabilityGrid) -> Result<()> {
        if grid.time_steps() == 0 {
            return Err(RecognitionError::shape_mismatch(
                "at least one time step",
                "0 time steps",
            ));
        }
        if grid.alphabet_size() != self.alphabet.len() {
            return Err(RecognitionError::shape_mismatch(
                format!("{} classes per step", self.alphabet.len()),
                format!("{} classes per step", grid.alphabet_size()),
            ));
        }
        Ok(())
    }
}

/// Arg-max for every time step as `(index, score)`.
///
/// Strict `>` against the running maximum, so the lowest index wins ties.
pub fn best_path(grid: &ProbabilityGrid) -> Vec<(usize, f32)> {
    (0..grid.time_steps())
        .map(|t| {
            let step = grid.step(t);
            let mut max_idx = 0;
            let mut max_prob = f32::NEG_INFINITY;
            for (c, &prob) in step.iter().enumerate() {
                if c == 0 || prob > max_prob {
                    max_prob = prob;
                    max_idx = c;
                }
            }
            (max_idx, max_prob)
        })
        .collect()
}

/// Keep the first index and every index that differs from the last kept one.
pub fn collapse_repeats(indices: &[usize]) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(indices.len());
    for &index in indices {
        if kept.last() != Some(&index) {
            kept.push(index);
        }
    }
    kept
}
