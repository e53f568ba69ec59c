//! Column slicing and class filtering shared by the loaders.

use expdata_core::Tensor;

use crate::error::DatasetResult;
use crate::LabeledData;

/// Split a raw matrix into `X` and `y`.
///
/// `y` is the last column; `X` is every column before the final `trailing`
/// ones, in original order.
pub fn split_label_column(data: &Tensor<f64>, trailing: usize) -> DatasetResult<LabeledData> {
    let cols = data.ncols()?;
    let x_end = cols.saturating_sub(trailing);
    let x = data.slice_cols(0, x_end)?;
    let y = data.col(cols.saturating_sub(1))?;
    Ok((x, y))
}

/// Keep the rows labelled `negative` or `positive` and relabel them `0` and `1`.
///
/// All other rows are dropped; surviving rows keep their relative order.
pub fn select_binary(
    x: &Tensor<f64>,
    y: &Tensor<f64>,
    negative: f64,
    positive: f64,
) -> DatasetResult<LabeledData> {
    let mut keep = Vec::new();
    let mut labels = Vec::new();
    for (i, &label) in y.data().iter().enumerate() {
        if label == negative {
            keep.push(i);
            labels.push(0.0);
        } else if label == positive {
            keep.push(i);
            labels.push(1.0);
        }
    }
    let x = x.select_samples(&keep)?;
    Ok((x, Tensor::from_slice(&labels)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_label_column() {
        let raw = Tensor::new(vec![1.0, 2.0, 9.0, 0.0, 3.0, 4.0, 8.0, 1.0], vec![2, 4]).unwrap();

        let (x, y) = split_label_column(&raw, 1).unwrap();
        assert_eq!(x.shape_vec(), vec![2, 3]);
        assert_eq!(y.data(), &[0.0, 1.0]);

        let (x, y) = split_label_column(&raw, 2).unwrap();
        assert_eq!(x.data(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(y.data(), &[0.0, 1.0]);
    }

    #[test]
    fn test_select_binary() {
        let x = Tensor::new(vec![10.0, 20.0, 30.0, 40.0, 50.0], vec![5, 1]).unwrap();
        let y = Tensor::from_slice(&[1.0, 2.0, 3.0, 3.0, 1.0]);
        let (bx, by) = select_binary(&x, &y, 1.0, 3.0).unwrap();
        assert_eq!(bx.data(), &[10.0, 30.0, 40.0, 50.0]);
        assert_eq!(by.data(), &[0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_select_binary_none_match() {
        let x = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        let y = Tensor::from_slice(&[5.0]);
        let (bx, by) = select_binary(&x, &y, 0.0, 1.0).unwrap();
        assert_eq!(bx.shape_vec(), vec![0, 2]);
        assert_eq!(by.numel(), 0);
    }
}
