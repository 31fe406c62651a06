//! Temporal mean estimation and centering.

use crate::error::{Result, Stage, TextureError};
use nalgebra::{DMatrix, DVector};

/// Per-pixel average over time, `Ymean[i] = (1/τ) Σ_t Y[i, t]`.
pub fn temporal_mean(y: &DMatrix<f64>) -> Result<DVector<f64>> {
    let tau = y.ncols();
    if tau == 0 {
        return Err(TextureError::EmptySequence { stage: Stage::Mean });
    }
    let divisor = tau as f64;
    Ok(DVector::from_fn(y.nrows(), |i, _| y.row(i).sum() / divisor))
}

/// Subtracts `mean` from every column of `y`.
pub fn center(y: &DMatrix<f64>, mean: &DVector<f64>) -> Result<DMatrix<f64>> {
    if mean.len() != y.nrows() {
        return Err(TextureError::shape_mismatch(
            Stage::Mean,
            "mean vector",
            (y.nrows(), 1),
            (mean.len(), 1),
        ));
    }
    let mut centered = y.clone();
    for mut column in centered.column_iter_mut() {
        column -= mean;
    }
    Ok(centered)
}

/// Computes the temporal mean and the centered matrix in one pass.
pub fn mean_center(y: &DMatrix<f64>) -> Result<(DVector<f64>, DMatrix<f64>)> {
    let mean = temporal_mean(y)?;
    let centered = center(y, &mean)?;
    Ok((mean, centered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_rows() {
        let y = DMatrix::from_row_slice(2, 4, &[1.0, 2.0, 3.0, 4.0, 10.0, 10.0, 10.0, 10.0]);
        let mean = temporal_mean(&y).unwrap();

        assert!((mean[0] - 2.5).abs() < 1e-12);
        assert!((mean[1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_centered_rows_sum_to_zero() {
        let y = DMatrix::from_fn(5, 7, |i, j| (i * 3 + j * j) as f64);
        let (_, centered) = mean_center(&y).unwrap();

        for row in centered.row_iter() {
            assert!(row.sum().abs() < 1e-10);
        }
    }

    #[test]
    fn test_centering_idempotent() {
        let y = DMatrix::from_fn(6, 5, |i, j| ((i + 1) * (j + 2)) as f64 * 0.37);
        let (_, centered) = mean_center(&y).unwrap();
        let (second_mean, recentered) = mean_center(&centered).unwrap();

        assert!(second_mean.iter().all(|m| m.abs() < 1e-10));
        assert!((recentered - centered).abs().max() < 1e-10);
    }

    #[test]
    fn test_empty_rejected() {
        let y = DMatrix::<f64>::zeros(4, 0);
        assert!(matches!(
            temporal_mean(&y),
            Err(TextureError::EmptySequence { stage: Stage::Mean })
        ));
    }

    #[test]
    fn test_center_shape_checked() {
        let y = DMatrix::<f64>::zeros(4, 3);
        let mean = DVector::<f64>::zeros(3);
        assert!(center(&y, &mean).is_err());
    }
}
