//! State-transition and noise-input estimation.
//!
//! Given a state trajectory `Xhat` (`n x τ`) with predecessor block
//! `X0 = Xhat[:, 0..τ-1]` and successor block `X1 = Xhat[:, 1..τ]`:
//!
//! - `Ahat = I + (X1 - X0) · pinv(X0)`, the least-squares transition
//!   closest to the identity. With `X0` of full row rank this is exactly
//!   `X1 · pinv(X0)`; directions `X0` never excites persist unchanged.
//! - `Vhat = X1 - Ahat · X0`, the one-step residual.
//! - `Bhat = Uv[:, ..nv] · diag(σv[..nv]) / sqrt(τ - 1)` from the SVD of `Vhat`.

use crate::error::{Result, Stage, TextureError};
use crate::linalg;
use nalgebra::{DMatrix, DVector};

/// Fitted linear dynamics of a state trajectory.
#[derive(Debug, Clone)]
pub struct Dynamics {
    /// State-transition matrix `Ahat`, `n x n`.
    pub ahat: DMatrix<f64>,
    /// Noise-input matrix `Bhat`, `n x nv`.
    pub bhat: DMatrix<f64>,
    /// One-step prediction residual `Vhat`, `n x (τ-1)`.
    pub residual: DMatrix<f64>,
    /// Leading singular values of the residual, non-increasing.
    pub noise_singular_values: DVector<f64>,
}

/// Fits `Ahat` and `Bhat` to `xhat` with noise order `noise_order`.
///
/// Fails with `DegenerateSequence` for fewer than two time steps and with
/// `InsufficientRank` when `noise_order` exceeds `min(n, τ-1)`.
pub fn estimate_dynamics(xhat: &DMatrix<f64>, noise_order: usize, rank_tolerance: f64) -> Result<Dynamics> {
    let (n, tau) = xhat.shape();
    if tau < 2 {
        return Err(TextureError::DegenerateSequence {
            stage: Stage::Dynamics,
            frames: tau,
            required: 2,
        });
    }
    if noise_order == 0 || noise_order > n {
        return Err(TextureError::InsufficientRank {
            stage: Stage::Dynamics,
            requested: noise_order,
            available: n,
        });
    }

    let transitions = tau - 1;
    let x0 = xhat.columns(0, transitions).into_owned();
    let x1 = xhat.columns(1, transitions).into_owned();

    let pinv = linalg::pseudo_inverse(&x0, rank_tolerance, Stage::Dynamics)?;
    let ahat = DMatrix::<f64>::identity(n, n) + (&x1 - &x0) * pinv;
    let residual = &x1 - &ahat * &x0;

    let mut noise = linalg::truncated_svd(&residual, noise_order, Stage::Dynamics)?;
    let sigma_max = noise.singular_values[0];
    noise.zero_below(linalg::rank_threshold(n, transitions, sigma_max, rank_tolerance));

    let normalizer = (transitions as f64).sqrt();
    let bhat = DMatrix::from_fn(n, noise_order, |i, j| {
        noise.u[(i, j)] * noise.singular_values[j] / normalizer
    });

    tracing::debug!(n, noise_order, transitions, "Dynamics estimated");

    Ok(Dynamics {
        ahat,
        bhat,
        residual,
        noise_singular_values: noise.singular_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_known_transition() {
        // x_{t+1} = A x_t exactly, with a rotation-and-decay A.
        let a = DMatrix::from_row_slice(2, 2, &[0.9, -0.3, 0.3, 0.9]);
        let mut xhat = DMatrix::zeros(2, 12);
        xhat.set_column(0, &DVector::from_vec(vec![1.0, 0.5]));
        for t in 1..12 {
            let next = &a * xhat.column(t - 1);
            xhat.set_column(t, &next);
        }

        let dynamics = estimate_dynamics(&xhat, 1, 1e-12).unwrap();

        assert!((&dynamics.ahat - &a).abs().max() < 1e-8);
        assert!(dynamics.residual.abs().max() < 1e-8);
        assert!(dynamics.bhat.abs().max() < 1e-8);
    }

    #[test]
    fn test_shapes() {
        let xhat = DMatrix::from_fn(3, 9, |i, j| ((i * 7 + j * j) % 5) as f64 - 2.0);
        let dynamics = estimate_dynamics(&xhat, 2, 1e-9).unwrap();

        assert_eq!(dynamics.ahat.shape(), (3, 3));
        assert_eq!(dynamics.bhat.shape(), (3, 2));
        assert_eq!(dynamics.residual.shape(), (3, 8));
    }

    #[test]
    fn test_bhat_reproduces_residual_covariance() {
        // With nv = n, Bhat·Bhatᵗ equals the empirical residual covariance.
        let xhat = DMatrix::from_fn(2, 7, |i, j| ((i + 3) * (j * j + 1) % 11) as f64);
        let dynamics = estimate_dynamics(&xhat, 2, 1e-12).unwrap();

        let covariance = &dynamics.residual * dynamics.residual.transpose() / 6.0;
        let driven = &dynamics.bhat * dynamics.bhat.transpose();
        assert!((covariance - driven).abs().max() < 1e-8);
    }

    #[test]
    fn test_zero_trajectory_is_identity() {
        let xhat = DMatrix::<f64>::zeros(1, 10);
        let dynamics = estimate_dynamics(&xhat, 1, 1e-9).unwrap();

        assert!((dynamics.ahat[(0, 0)] - 1.0).abs() < 1e-12);
        assert_eq!(dynamics.bhat[(0, 0)], 0.0);
    }

    #[test]
    fn test_single_step_rejected() {
        let xhat = DMatrix::<f64>::zeros(2, 1);
        assert!(matches!(
            estimate_dynamics(&xhat, 1, 1e-9),
            Err(TextureError::DegenerateSequence {
                stage: Stage::Dynamics,
                frames: 1,
                required: 2
            })
        ));
    }

    #[test]
    fn test_noise_order_above_transitions_rejected() {
        // n = 3 but only two transitions available.
        let xhat = DMatrix::from_fn(3, 3, |i, j| (i + j) as f64);
        assert!(matches!(
            estimate_dynamics(&xhat, 3, 1e-9),
            Err(TextureError::InsufficientRank { available: 2, .. })
        ));
    }
}
