use expdata_core::{Float, Tensor, TensorError, TensorResult};

/// Random-access collection of `(input, target)` samples.
pub trait Dataset: Send + Sync {
    type Elem: Float;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample `idx` as `(input, target)`.
    fn get(&self, idx: usize) -> TensorResult<(Tensor<Self::Elem>, Tensor<Self::Elem>)>;
}

/// A dataset wrapping a feature matrix and its label vector.
#[derive(Debug, Clone)]
pub struct TensorDataset<T: Float = f64> {
    features: Tensor<T>,
    labels: Tensor<T>,
}

impl<T: Float> TensorDataset<T> {
    /// `features` must be `[n, d]` and `labels` `[n]`.
    pub fn new(features: Tensor<T>, labels: Tensor<T>) -> TensorResult<Self> {
        let n = features.nrows()?;
        if labels.shape_vec() != vec![n] {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: labels.shape_vec(),
            });
        }
        Ok(TensorDataset { features, labels })
    }

    pub fn features(&self) -> &Tensor<T> {
        &self.features
    }

    pub fn labels(&self) -> &Tensor<T> {
        &self.labels
    }

    pub fn into_parts(self) -> (Tensor<T>, Tensor<T>) {
        (self.features, self.labels)
    }
}

impl<T: Float> Dataset for TensorDataset<T> {
    type Elem = T;

    fn len(&self) -> usize {
        self.labels.numel()
    }

    fn get(&self, idx: usize) -> TensorResult<(Tensor<T>, Tensor<T>)> {
        let row = Tensor::from_slice(self.features.row(idx)?);
        let label = Tensor::scalar(self.labels.data()[idx]);
        Ok((row, label))
    }
}
