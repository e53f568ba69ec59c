//! Per-sample image transforms.

use expdata_core::{Float, Tensor, TensorError, TensorResult};

/// A sample-level transform applied when a dataset item is fetched.
pub trait Transform<T: Float>: Send + Sync {
    fn apply(&self, input: Tensor<T>) -> TensorResult<Tensor<T>>;
}

/// Converts raw 8-bit pixels to a dense `[C, H, W]` tensor in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToTensor;

impl ToTensor {
    pub fn convert<T: Float>(
        pixels: &[u8],
        channels: usize,
        height: usize,
        width: usize,
    ) -> TensorResult<Tensor<T>> {
        let scale = T::from_f64(255.0);
        let data = pixels.iter().map(|&p| T::from_u8(p) / scale).collect();
        Tensor::new(data, vec![channels, height, width])
    }
}

/// Per-channel `(x - mean) / std` over a `[C, H, W]` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalize {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl Normalize {
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> TensorResult<Self> {
        if mean.is_empty() || mean.len() != std.len() {
            return Err(TensorError::DimensionMismatch(format!(
                "Normalize needs one mean and one std per channel, got {} and {}",
                mean.len(),
                std.len()
            )));
        }
        if std.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(TensorError::InvalidOperation(
                "Normalize std must be finite and non-zero".to_string(),
            ));
        }
        Ok(Normalize { mean, std })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }
}

impl<T: Float> Transform<T> for Normalize {
    fn apply(&self, mut input: Tensor<T>) -> TensorResult<Tensor<T>> {
        let channels = input.shape().dim(0)?;
        if channels != self.mean.len() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.mean.len()],
                got: vec![channels],
            });
        }
        let plane = input.numel() / channels.max(1);
        for (c, chunk) in input.data_mut().chunks_mut(plane.max(1)).enumerate() {
            let m = T::from_f64(self.mean[c]);
            let s = T::from_f64(self.std[c]);
            for v in chunk {
                *v = (*v - m) / s;
            }
        }
        Ok(input)
    }
}

/// Applies transforms in order.
pub struct Compose<T: Float> {
    steps: Vec<Box<dyn Transform<T>>>,
}

impl<T: Float> Compose<T> {
    pub fn new(steps: Vec<Box<dyn Transform<T>>>) -> Self {
        Compose { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<T: Float> Transform<T> for Compose<T> {
    fn apply(&self, input: Tensor<T>) -> TensorResult<Tensor<T>> {
        self.steps.iter().try_fold(input, |x, step| step.apply(x))
    }
}
