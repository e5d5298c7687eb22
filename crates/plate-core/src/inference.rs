use crate::tensor::{NormalizedTensor, ProbabilityGrid};
use std::sync::Arc;

/// The model runtime, seen from the recognizer: one tensor in, one grid out.
///
/// Implementations own everything about the model (format, weights, threads,
/// devices). They must be callable from several threads at once; a runtime
/// that is not reentrant serializes internally.
pub trait InferenceBackend: Send + Sync {
    fn infer(&self, tensor: NormalizedTensor) -> anyhow::Result<ProbabilityGrid>;
}

impl<T: InferenceBackend + ?Sized> InferenceBackend for Arc<T> {
    fn infer(&self, tensor: NormalizedTensor) -> anyhow::Result<ProbabilityGrid> {
        (**self).infer(tensor)
    }
}

impl<T: InferenceBackend + ?Sized> InferenceBackend for Box<T> {
    fn infer(&self, tensor: NormalizedTensor) -> anyhow::Result<ProbabilityGrid> {
        (**self).infer(tensor)
    }
}

/// Wrap a plain function or closure as a backend.
pub struct FnBackend<F>(F);

impl<F> FnBackend<F>
where
    F: Fn(NormalizedTensor) -> anyhow::Result<ProbabilityGrid> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> InferenceBackend for FnBackend<F>
where
    F: Fn(NormalizedTensor) -> anyhow::Result<ProbabilityGrid> + Send + Sync,
{
    fn infer(&self, tensor: NormalizedTensor) -> anyhow::Result<ProbabilityGrid> {
        (self.0)(tensor)
    }
}
