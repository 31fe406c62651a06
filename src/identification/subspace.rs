//! Appearance subspace via truncated SVD.
//!
//! `Ycentered ≈ Chat · Xhat` with `Chat = U[:, ..n]` and
//! `Xhat = diag(σ[..n]) · Vᵗ[..n, :]`.

use crate::error::{Result, Stage};
use crate::linalg::{self, TruncatedSvd};
use nalgebra::{DMatrix, DVector};

/// Rank-`n` principal subspace of a centered observation matrix.
#[derive(Debug, Clone)]
pub struct Subspace {
    /// Observation matrix `Chat`, `m x n`, orthonormal columns.
    pub chat: DMatrix<f64>,
    /// Leading singular values, non-increasing.
    pub singular_values: DVector<f64>,
    /// State trajectory `Xhat`, `n x τ`.
    pub xhat: DMatrix<f64>,
    /// Number of strictly positive retained singular values.
    pub effective_rank: usize,
    /// Fraction of the centered energy captured by the `n` components.
    pub retained_energy: f64,
}

impl Subspace {
    /// State at the earliest frame, `Xhat[:, 0]`.
    pub fn x0(&self) -> DVector<f64> {
        self.xhat.column(0).into_owned()
    }

    /// State-space order `n`.
    pub fn order(&self) -> usize {
        self.singular_values.len()
    }
}

/// Decomposes `centered` (`m x τ`) into a rank-`order` subspace.
///
/// Requires `1 <= order <= min(m, τ)`. Singular values below the rank
/// threshold are zeroed rather than rejected; their state rows are zero
/// and the matching basis columns stay orthonormal.
pub fn decompose(centered: &DMatrix<f64>, order: usize, rank_tolerance: f64) -> Result<Subspace> {
    let (m, tau) = centered.shape();
    let mut svd: TruncatedSvd = linalg::truncated_svd(centered, order, Stage::Subspace)?;

    let sigma_max = svd.singular_values[0];
    let threshold = linalg::rank_threshold(m, tau, sigma_max, rank_tolerance);
    let effective_rank = svd.zero_below(threshold);
    if effective_rank < order {
        tracing::warn!(
            requested = order,
            effective_rank,
            "Observation matrix is rank deficient, zero-padding state directions"
        );
    }

    let retained_energy = svd.retained_energy();
    let xhat = DMatrix::from_diagonal(&svd.singular_values) * &svd.v_t;

    tracing::debug!(m, tau, order, effective_rank, retained_energy, "Subspace decomposed");

    Ok(Subspace {
        chat: svd.u,
        singular_values: svd.singular_values,
        xhat,
        effective_rank,
        retained_energy,
    })
}
