//! Driving-noise generation for stochastic synthesis.
//!
//! Samples come from a ChaCha20 stream so that a fixed seed reproduces
//! the same texture exactly.

use nalgebra::DVector;
use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Source of independent noise samples, standard normal by default.
pub struct NoiseSource<D = StandardNormal> {
    rng: ChaCha20Rng,
    distribution: D,
    /// Seed the stream was created from, if reproducible.
    seed: Option<u64>,
}

impl NoiseSource<StandardNormal> {
    /// Creates a standard normal source seeded from the OS entropy source.
    pub fn from_os_entropy() -> Self {
        Self::with_distribution(None, StandardNormal)
    }

    /// Creates a reproducible standard normal source.
    pub fn from_seed(seed: u64) -> Self {
        Self::with_distribution(Some(seed), StandardNormal)
    }
}

impl<D: Distribution<f64>> NoiseSource<D> {
    /// Creates a source drawing from `distribution`.
    ///
    /// `None` seeds the stream from the OS.
    pub fn with_distribution(seed: Option<u64>, distribution: D) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => {
                let mut seed_material = [0u8; 32];
                rand_core::OsRng.fill_bytes(&mut seed_material);
                ChaCha20Rng::from_seed(seed_material)
            }
        };
        Self {
            rng,
            distribution,
            seed,
        }
    }

    /// Draws a vector of `len` independent samples.
    pub fn sample_vector(&mut self, len: usize) -> DVector<f64> {
        let (rng, distribution) = (&mut self.rng, &self.distribution);
        DVector::from_fn(len, |_, _| distribution.sample(rng))
    }

    /// Draws one `len`-sample vector per channel.
    pub fn sample_inputs(&mut self, channels: usize, len: usize) -> Vec<DVector<f64>> {
        (0..channels).map(|_| self.sample_vector(len)).collect()
    }

    /// Returns the seed, or `None` for OS-seeded streams.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl<D> std::fmt::Debug for NoiseSource<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseSource")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
