use crate::dtype::Float;
use crate::error::{TensorError, TensorResult};
use crate::shape::Shape;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// N-dimensional array backing every feature matrix, label vector and image batch.
///
/// Stores data in a flat contiguous `Vec<T>` with row-major (C-order) layout,
/// so row `i` of a matrix is `data[i * cols..(i + 1) * cols]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Tensor<T: Float> {
    data: Vec<T>,
    shape: Shape,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    /// Create a tensor from raw data and shape.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> TensorResult<Self> {
        let s = Shape::new(shape);
        if data.len() != s.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: s.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape: s })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![T::ZERO; s.numel()],
            shape: s,
        }
    }

    /// Create a scalar tensor (0-d).
    pub fn scalar(value: T) -> Self {
        Tensor {
            data: vec![value],
            shape: Shape::new(vec![]),
        }
    }

    /// Create a 1-D tensor from a slice.
    pub fn from_slice(data: &[T]) -> Self {
        Tensor {
            data: data.to_vec(),
            shape: Shape::new(vec![data.len()]),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Number of rows of a 2-D tensor.
    pub fn nrows(&self) -> TensorResult<usize> {
        Ok(self.shape.matrix()?.0)
    }

    /// Number of columns of a 2-D tensor.
    pub fn ncols(&self) -> TensorResult<usize> {
        Ok(self.shape.matrix()?.1)
    }

    /// Multi-dimensional indexing.
    pub fn get(&self, indices: &[usize]) -> TensorResult<T> {
        let strides = self.shape.strides();
        if indices.len() != self.ndim() {
            return Err(TensorError::DimensionMismatch(format!(
                "Expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }
        let mut offset = 0;
        for (i, &idx) in indices.iter().enumerate() {
            let dim_size = self.shape.dim(i)?;
            if idx >= dim_size {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    axis: i,
                    size: dim_size,
                });
            }
            offset += idx * strides[i];
        }
        Ok(self.data[offset])
    }

    /// Borrow row `i` of a 2-D tensor.
    pub fn row(&self, i: usize) -> TensorResult<&[T]> {
        let (rows, cols) = self.shape.matrix()?;
        if i >= rows {
            return Err(TensorError::IndexOutOfBounds {
                index: i,
                axis: 0,
                size: rows,
            });
        }
        Ok(&self.data[i * cols..(i + 1) * cols])
    }

    /// Extract a column from a 2-D tensor.
    pub fn col(&self, j: usize) -> TensorResult<Tensor<T>> {
        let (rows, cols) = self.shape.matrix()?;
        if j >= cols {
            return Err(TensorError::IndexOutOfBounds {
                index: j,
                axis: 1,
                size: cols,
            });
        }
        let data: Vec<T> = (0..rows).map(|i| self.data[i * cols + j]).collect();
        Ok(Tensor {
            data,
            shape: Shape::new(vec![rows]),
        })
    }

    /// Slice along the leading axis: samples `start..end` of any-rank tensor.
    pub fn slice_samples(&self, start: usize, end: usize) -> TensorResult<Tensor<T>> {
        let n = self.shape.dim(0)?;
        if start > end || end > n {
            return Err(TensorError::IndexOutOfBounds {
                index: end,
                axis: 0,
                size: n,
            });
        }
        let stride = self.shape.sample_dims().iter().product::<usize>();
        let data = self.data[start * stride..end * stride].to_vec();
        Ok(Tensor {
            data,
            shape: Shape::batched(end - start, self.shape.sample_dims()),
        })
    }

    /// Gather samples along the leading axis, in the given order.
    pub fn select_samples(&self, indices: &[usize]) -> TensorResult<Tensor<T>> {
        let n = self.shape.dim(0)?;
        let stride = self.shape.sample_dims().iter().product::<usize>();
        let mut data = Vec::with_capacity(indices.len() * stride);
        for &i in indices {
            if i >= n {
                return Err(TensorError::IndexOutOfBounds {
                    index: i,
                    axis: 0,
                    size: n,
                });
            }
            data.extend_from_slice(&self.data[i * stride..(i + 1) * stride]);
        }
        Ok(Tensor {
            data,
            shape: Shape::batched(indices.len(), self.shape.sample_dims()),
        })
    }

    /// Slice columns `start..end` from a 2-D tensor.
    pub fn slice_cols(&self, start: usize, end: usize) -> TensorResult<Tensor<T>> {
        let (rows, cols) = self.shape.matrix()?;
        if start > end || end > cols {
            return Err(TensorError::IndexOutOfBounds {
                index: end,
                axis: 1,
                size: cols,
            });
        }
        let new_cols = end - start;
        let mut data = Vec::with_capacity(rows * new_cols);
        for i in 0..rows {
            data.extend_from_slice(&self.data[i * cols + start..i * cols + end]);
        }
        Tensor::new(data, vec![rows, new_cols])
    }

    /// Gather columns of a 2-D tensor, in the given order.
    pub fn select_cols(&self, indices: &[usize]) -> TensorResult<Tensor<T>> {
        let (rows, cols) = self.shape.matrix()?;
        if let Some(&bad) = indices.iter().find(|&&j| j >= cols) {
            return Err(TensorError::IndexOutOfBounds {
                index: bad,
                axis: 1,
                size: cols,
            });
        }
        let mut data = Vec::with_capacity(rows * indices.len());
        for i in 0..rows {
            let row = &self.data[i * cols..(i + 1) * cols];
            data.extend(indices.iter().map(|&j| row[j]));
        }
        Tensor::new(data, vec![rows, indices.len()])
    }

    // ─── Batching ───────────────────────────────────────────────────────────

    /// Stack equally-shaped sample slices into a batch `[n, ..sample]`.
    pub fn stack_samples(samples: &[Tensor<T>]) -> TensorResult<Tensor<T>> {
        let first = samples.first().ok_or(TensorError::EmptyTensor)?;
        let sample_shape = first.shape.clone();
        let mut data = Vec::with_capacity(samples.len() * first.numel());
        for s in samples {
            if s.shape != sample_shape {
                return Err(TensorError::ShapeMismatch {
                    expected: sample_shape.to_vec(),
                    got: s.shape_vec(),
                });
            }
            data.extend_from_slice(&s.data);
        }
        Ok(Tensor {
            data,
            shape: Shape::batched(samples.len(), sample_shape.dims()),
        })
    }

    // ─── Reductions ─────────────────────────────────────────────────────────

    /// Max of all elements.
    pub fn max_all(&self) -> TensorResult<T> {
        self.data
            .iter()
            .copied()
            .reduce(T::max)
            .ok_or(TensorError::EmptyTensor)
    }

    /// Min of all elements.
    pub fn min_all(&self) -> TensorResult<T> {
        self.data
            .iter()
            .copied()
            .reduce(T::min)
            .ok_or(TensorError::EmptyTensor)
    }

    // ─── Matrix Multiply ────────────────────────────────────────────────────

    /// 2-D matrix product, parallel over output rows.
    pub fn matmul(&self, other: &Tensor<T>) -> TensorResult<Tensor<T>> {
        let (m, k) = self.shape.matrix()?;
        let (k2, n) = other.shape.matrix()?;
        if k != k2 {
            return Err(TensorError::DimensionMismatch(format!(
                "matmul: inner dimensions must match, got {} and {}",
                k, k2
            )));
        }
        if m == 0 || n == 0 {
            return Ok(Tensor::zeros(vec![m, n]));
        }

        let mut data = vec![T::ZERO; m * n];
        data.par_chunks_mut(n).enumerate().for_each(|(i, out)| {
            let a_row = &self.data[i * k..(i + 1) * k];
            for (p, &a) in a_row.iter().enumerate() {
                let b_row = &other.data[p * n..(p + 1) * n];
                for (o, &b) in out.iter_mut().zip(b_row) {
                    *o += a * b;
                }
            }
        });
        Tensor::new(data, vec![m, n])
    }
}

impl<T: Float> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Tensor<f64> {
        Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap()
    }

    #[test]
    fn test_creation() {
        let t: Tensor<f64> = Tensor::zeros(vec![3, 4]);
        assert_eq!(t.shape_vec(), vec![3, 4]);
        assert_eq!(t.numel(), 12);
        assert!(Tensor::<f64>::new(vec![1.0; 5], vec![2, 3]).is_err());
    }

    #[test]
    fn test_row_col() {
        let t = grid();
        assert_eq!(t.row(1).unwrap(), &[4.0, 5.0, 6.0]);
        assert_eq!(t.col(2).unwrap().data(), &[3.0, 6.0]);
        assert!(t.row(2).is_err());
        assert_eq!(t.nrows().unwrap(), 2);
        assert_eq!(t.ncols().unwrap(), 3);
    }

    #[test]
    fn test_slice_and_select_cols() {
        let t = grid();
        let s = t.slice_cols(0, 1).unwrap();
        assert_eq!(s.shape_vec(), vec![2, 1]);
        assert_eq!(s.data(), &[1.0, 4.0]);

        let empty = t.slice_cols(1, 1).unwrap();
        assert_eq!(empty.shape_vec(), vec![2, 0]);

        let p = t.select_cols(&[2, 0]).unwrap();
        assert_eq!(p.data(), &[3.0, 1.0, 6.0, 4.0]);
        assert!(t.select_cols(&[3]).is_err());
    }

    #[test]
    fn test_select_samples() {
        let t = grid();
        let s = t.select_samples(&[1, 1, 0]).unwrap();
        assert_eq!(s.shape_vec(), vec![3, 3]);
        assert_eq!(s.row(0).unwrap(), &[4.0, 5.0, 6.0]);
        assert_eq!(s.row(2).unwrap(), &[1.0, 2.0, 3.0]);

        let pixels = (0..8).map(|v| v as f32).collect();
        let images: Tensor<f32> = Tensor::new(pixels, vec![2, 1, 2, 2]).unwrap();
        let one = images.select_samples(&[1]).unwrap();
        assert_eq!(one.shape_vec(), vec![1, 1, 2, 2]);
        assert_eq!(one.data(), &[4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_slice_samples() {
        let y = Tensor::from_slice(&[0.0, 1.0, 1.0, 0.0]);
        let s = y.slice_samples(1, 3).unwrap();
        assert_eq!(s.data(), &[1.0, 1.0]);
        assert!(y.slice_samples(2, 5).is_err());
    }

    #[test]
    fn test_stack_samples() {
        let a: Tensor<f32> = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        let b: Tensor<f32> = Tensor::new(vec![3.0, 4.0], vec![1, 2]).unwrap();
        let s = Tensor::stack_samples(&[a, b]).unwrap();
        assert_eq!(s.shape_vec(), vec![2, 1, 2]);
        assert_eq!(s.data(), &[1.0, 2.0, 3.0, 4.0]);
        assert!(Tensor::<f32>::stack_samples(&[]).is_err());
    }

    #[test]
    fn test_matmul() {
        let a = grid();
        let b: Tensor<f64> =
            Tensor::new(vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0], vec![3, 2]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape_vec(), vec![2, 2]);
        assert_eq!(c.data(), &[58.0, 64.0, 139.0, 154.0]);
        assert!(a.matmul(&a).is_err());
    }

    #[test]
    fn test_min_max() {
        let t: Tensor<f64> = Tensor::new(vec![0.5, -2.5, 2.5, 1.0], vec![2, 2]).unwrap();
        assert_eq!(t.min_all().unwrap(), -2.5);
        assert_eq!(t.max_all().unwrap(), 2.5);
        assert!(Tensor::<f64>::zeros(vec![0]).max_all().is_err());
    }
}
