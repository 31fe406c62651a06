//! Dense linear algebra used by the identification stages.
//!
//! Thin layer over `nalgebra` so that both SVDs and the pseudo-inverse
//! go through one place with one ordering and one tolerance rule.

use crate::error::{Result, Stage, TextureError};
use nalgebra::{DMatrix, DVector, SVD};

/// Iteration cap handed to the SVD solver.
const MAX_SVD_ITERATIONS: usize = 10_000;

/// Rank-truncated singular value decomposition `U·diag(s)·Vᵗ`.
///
/// Singular values are non-increasing. `u` has orthonormal columns.
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    /// Leading left singular vectors, `rows x rank`.
    pub u: DMatrix<f64>,
    /// Leading singular values, descending.
    pub singular_values: DVector<f64>,
    /// Leading right singular vectors as rows, `rank x cols`.
    pub v_t: DMatrix<f64>,
    /// Sum of squares of all singular values before truncation.
    pub total_energy: f64,
}

impl TruncatedSvd {
    /// Number of retained components.
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// Zeroes every singular value at or below `threshold`.
    ///
    /// Returns the number of values left strictly positive.
    pub fn zero_below(&mut self, threshold: f64) -> usize {
        let mut effective = 0;
        for s in self.singular_values.iter_mut() {
            if *s <= threshold {
                *s = 0.0;
            } else {
                effective += 1;
            }
        }
        effective
    }

    /// Fraction of the total energy held by the retained values.
    pub fn retained_energy(&self) -> f64 {
        if self.total_energy == 0.0 {
            return 1.0;
        }
        self.singular_values.iter().map(|s| s * s).sum::<f64>() / self.total_energy
    }
}

/// Rank threshold for a matrix of the given shape.
///
/// Relative part follows the usual `max(rows, cols)·ε·σ_max` rule;
/// `floor` is an absolute lower bound in sample units.
pub fn rank_threshold(rows: usize, cols: usize, sigma_max: f64, floor: f64) -> f64 {
    let relative = rows.max(cols) as f64 * f64::EPSILON * sigma_max;
    relative.max(floor)
}

fn ensure_finite(matrix: &DMatrix<f64>, stage: Stage) -> Result<()> {
    if matrix.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(TextureError::NumericalInstability {
            stage,
            detail: "matrix contains non-finite values",
        })
    }
}

/// Computes the SVD of `matrix` truncated to its leading `rank` components.
///
/// Fails with `InsufficientRank` when `rank` exceeds `min(rows, cols)` and
/// with `NumericalInstability` when the solver does not converge.
pub fn truncated_svd(matrix: &DMatrix<f64>, rank: usize, stage: Stage) -> Result<TruncatedSvd> {
    let (rows, cols) = matrix.shape();
    let available = rows.min(cols);
    if rank == 0 || rank > available {
        return Err(TextureError::InsufficientRank {
            stage,
            requested: rank,
            available,
        });
    }
    ensure_finite(matrix, stage)?;

    let svd = SVD::try_new(matrix.clone(), true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
        .ok_or(TextureError::NumericalInstability {
            stage,
            detail: "SVD did not converge",
        })?;
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => {
            return Err(TextureError::NumericalInstability {
                stage,
                detail: "SVD returned no singular vectors",
            })
        }
    };
    let sigma = svd.singular_values;

    // Solver output order is not guaranteed; sort descending ourselves.
    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));
    order.truncate(rank);

    Ok(TruncatedSvd {
        u: DMatrix::from_fn(rows, rank, |i, j| u[(i, order[j])]),
        singular_values: DVector::from_fn(rank, |j, _| sigma[order[j]].max(0.0)),
        v_t: DMatrix::from_fn(rank, cols, |i, j| v_t[(order[i], j)]),
        total_energy: sigma.iter().map(|s| s * s).sum(),
    })
}

/// Moore-Penrose pseudo-inverse via SVD.
///
/// Singular values at or below `rank_threshold(.., floor)` are treated
/// as zero, so a (near-)singular input yields the minimum-norm solution.
pub fn pseudo_inverse(matrix: &DMatrix<f64>, floor: f64, stage: Stage) -> Result<DMatrix<f64>> {
    let (rows, cols) = matrix.shape();
    let full = truncated_svd(matrix, rows.min(cols), stage)?;
    let sigma_max = full.singular_values.get(0).copied().unwrap_or(0.0);
    let threshold = rank_threshold(rows, cols, sigma_max, floor);

    let inverted = full
        .singular_values
        .map(|s| if s > threshold { 1.0 / s } else { 0.0 });

    // pinv = V · diag(1/s) · Uᵗ
    let scaled_v = DMatrix::from_fn(cols, inverted.len(), |i, j| full.v_t[(j, i)] * inverted[j]);
    Ok(scaled_v * full.u.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_singular_values_descending() {
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 3.0]);
        let svd = truncated_svd(&m, 3, Stage::Subspace).unwrap();

        assert!((svd.singular_values[0] - 5.0).abs() < 1e-12);
        assert!((svd.singular_values[1] - 3.0).abs() < 1e-12);
        assert!((svd.singular_values[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_truncation_reconstructs_rank_one() {
        let m = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let svd = truncated_svd(&m, 1, Stage::Subspace).unwrap();
        let rebuilt = &svd.u * DMatrix::from_diagonal(&svd.singular_values) * &svd.v_t;

        assert_close(&rebuilt, &m, 1e-10);
        assert!((svd.retained_energy() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_beyond_shape_rejected() {
        let m = DMatrix::<f64>::zeros(4, 2);
        assert!(matches!(
            truncated_svd(&m, 3, Stage::Dynamics),
            Err(TextureError::InsufficientRank {
                requested: 3,
                available: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.0, 1.0]);
        assert!(matches!(
            truncated_svd(&m, 1, Stage::Subspace),
            Err(TextureError::NumericalInstability { .. })
        ));
    }

    #[test]
    fn test_pseudo_inverse_of_invertible_matrix() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let pinv = pseudo_inverse(&m, 0.0, Stage::Dynamics).unwrap();

        assert_close(&(&m * &pinv), &DMatrix::identity(2, 2), 1e-10);
    }

    #[test]
    fn test_pseudo_inverse_of_zero_matrix_is_zero() {
        let m = DMatrix::<f64>::zeros(2, 5);
        let pinv = pseudo_inverse(&m, 1e-9, Stage::Dynamics).unwrap();

        assert_eq!(pinv.shape(), (5, 2));
        assert!(pinv.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pseudo_inverse_rank_deficient() {
        // Rank one: pinv(m) = m / ‖m‖²_F for an outer product.
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let pinv = pseudo_inverse(&m, 1e-9, Stage::Dynamics).unwrap();

        assert_close(&pinv, &(&m / 4.0), 1e-10);
    }
}
