//! Fit quality and stability diagnostics.
//!
//! These summarize a fitted model; they never change it.

use crate::capture::FrameSequence;
use crate::error::Result;
use crate::identification::{ChannelModel, TextureModel};

/// Diagnostics for one channel model.
#[derive(Debug, Clone)]
pub struct ChannelDiagnostics {
    /// Largest eigenvalue modulus of `Ahat`.
    pub spectral_radius: f64,
    /// Fraction of centered energy captured by the subspace.
    pub retained_energy: f64,
    /// State directions with non-zero energy.
    pub effective_rank: usize,
    /// Driving-noise power, `‖Bhat‖²_F`.
    pub noise_power: f64,
}

impl ChannelDiagnostics {
    /// Computes diagnostics for a channel model.
    pub fn analyze(channel: &ChannelModel) -> Self {
        let spectral_radius = channel
            .ahat()
            .complex_eigenvalues()
            .iter()
            .map(|lambda| lambda.norm())
            .fold(0.0, f64::max);

        Self {
            spectral_radius,
            retained_energy: channel.retained_energy(),
            effective_rank: channel.effective_rank(),
            noise_power: channel.bhat().norm_squared(),
        }
    }

    /// Returns true if noise-free playback cannot grow without bound.
    ///
    /// `tolerance` allows for marginally stable (periodic) textures
    /// whose eigenvalues sit on the unit circle up to estimation error.
    pub fn is_stable(&self, tolerance: f64) -> bool {
        self.spectral_radius <= 1.0 + tolerance
    }
}

/// Diagnostics for a whole texture model.
#[derive(Debug, Clone)]
pub struct ModelDiagnostics {
    /// Per-channel diagnostics, in channel order.
    pub channels: Vec<ChannelDiagnostics>,
    /// RMS sample error of the subspace reconstruction, if measured.
    pub reconstruction_rmse: Option<f64>,
}

impl ModelDiagnostics {
    /// Computes model-only diagnostics.
    pub fn analyze(model: &TextureModel) -> Self {
        Self {
            channels: model.channels().iter().map(ChannelDiagnostics::analyze).collect(),
            reconstruction_rmse: None,
        }
    }

    /// Computes diagnostics including reconstruction error against `sequence`.
    pub fn with_reconstruction(model: &TextureModel, sequence: &FrameSequence) -> Result<Self> {
        let mut diagnostics = Self::analyze(model);
        diagnostics.reconstruction_rmse = Some(model.reconstruction_rmse(sequence)?);
        Ok(diagnostics)
    }

    /// Largest spectral radius over all channels.
    pub fn max_spectral_radius(&self) -> f64 {
        self.channels
            .iter()
            .map(|c| c.spectral_radius)
            .fold(0.0, f64::max)
    }

    /// Returns true if every channel is stable within `tolerance`.
    pub fn is_stable(&self, tolerance: f64) -> bool {
        self.channels.iter().all(|c| c.is_stable(tolerance))
    }

    /// Smallest retained energy fraction over all channels.
    pub fn min_retained_energy(&self) -> f64 {
        self.channels
            .iter()
            .map(|c| c.retained_energy)
            .fold(1.0, f64::min)
    }
}
