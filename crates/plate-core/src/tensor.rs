use crate::error::{RecognitionError, Result};
use ndarray::{Array2, Array4, ArrayView1, Ix2};

/// Model input: a transposed single-channel plate, logical shape
/// `[1, width, height, 1]`, values in `[0, 1]`.
///
/// `data[x * height + y]` holds the intensity of pixel `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl NormalizedTensor {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(RecognitionError::shape_mismatch(
                format!("{} elements ({}x{})", width * height, width, height),
                format!("{} elements", data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Caller guarantees `data.len() == width * height`.
    pub(crate) fn from_parts(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `[batch, width, height, channels]`
    pub fn shape(&self) -> [usize; 4] {
        [1, self.width, self.height, 1]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Value at original pixel `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(x * self.height + y).copied()
    }

    /// Raw buffer in native byte order, as handed to byte-oriented runtimes.
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    pub fn to_array(&self) -> Result<Array4<f32>> {
        Array4::from_shape_vec(self.shape(), self.data.clone()).map_err(|e| {
            RecognitionError::shape_mismatch(format!("{:?}", self.shape()), e.to_string())
        })
    }
}

/// Per-position class scores produced by the model, shape `[time_steps, alphabet_size]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityGrid {
    values: Array2<f32>,
}

impl ProbabilityGrid {
    pub fn new(values: Array2<f32>) -> Self {
        Self { values }
    }

    /// Build a grid from a flat buffer and the shape reported by the model.
    ///
    /// Accepts `[T, A]` or a batched `[1, T, A]`.
    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>) -> Result<Self> {
        let (steps, classes) = match shape {
            [steps, classes] => (*steps, *classes),
            [1, steps, classes] => (*steps, *classes),
            other => {
                return Err(RecognitionError::shape_mismatch(
                    "[time_steps, alphabet_size] or [1, time_steps, alphabet_size]",
                    format!("{:?}", other),
                ))
            }
        };

        let values = Array2::from_shape_vec((steps, classes), data).map_err(|e| {
            RecognitionError::shape_mismatch(format!("[{}, {}]", steps, classes), e.to_string())
        })?;
        Ok(Self { values })
    }

    pub fn time_steps(&self) -> usize {
        self.values.nrows()
    }

    pub fn alphabet_size(&self) -> usize {
        self.values.ncols()
    }

    pub fn step(&self, t: usize) -> ArrayView1<'_, f32> {
        self.values.row(t)
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }
}

impl From<Array2<f32>> for ProbabilityGrid {
    fn from(values: Array2<f32>) -> Self {
        Self::new(values)
    }
}

impl TryFrom<ndarray::ArrayD<f32>> for ProbabilityGrid {
    type Error = RecognitionError;

    fn try_from(array: ndarray::ArrayD<f32>) -> Result<Self> {
        let shape = array.shape().to_vec();
        match shape.as_slice() {
            [1, _, _] => {
                let squeezed = array.index_axis_move(ndarray::Axis(0), 0);
                let values = squeezed.into_dimensionality::<Ix2>().map_err(|e| {
                    RecognitionError::shape_mismatch("rank 2 after batch squeeze", e.to_string())
                })?;
                Ok(Self { values })
            }
            [_, _] => {
                let values = array.into_dimensionality::<Ix2>().map_err(|e| {
                    RecognitionError::shape_mismatch("rank 2", e.to_string())
                })?;
                Ok(Self { values })
            }
            other => Err(RecognitionError::shape_mismatch(
                "[time_steps, alphabet_size] or [1, time_steps, alphabet_size]",
                format!("{:?}", other),
            )),
        }
    }
}
