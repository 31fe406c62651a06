//! Dynamic texture identification.
//!
//! Turns an ordered frame sequence into a [`TextureModel`]:
//!
//! ```text
//! vectorize → mean/center → subspace (SVD) → dynamics (pinv + SVD)
//! ```
//!
//! Every color channel runs through the same stages independently.

mod dynamics;
mod mean;
mod model;
mod subspace;
mod vectorize;

pub use dynamics::{estimate_dynamics, Dynamics};
pub use mean::{center, mean_center, temporal_mean};
pub use model::{ChannelModel, TextureModel, TextureState};
pub use subspace::{decompose, Subspace};
pub use vectorize::{devectorize, frame_from_columns, vectorize, ObservationSet};

use crate::capture::FrameSequence;
use crate::config::FitConfig;
use crate::error::{Result, Stage, TextureError};
use nalgebra::DMatrix;

/// Fits dynamic texture models with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct TextureLearner {
    config: FitConfig,
}

impl TextureLearner {
    /// Creates a learner. The scale and tolerance are checked on each fit;
    /// the orders are checked against the sequence shape.
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    /// Returns the fitting configuration.
    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Learns a model from `sequence`.
    ///
    /// No partial model is returned: any channel failing fails the fit.
    pub fn fit(&self, sequence: &FrameSequence) -> Result<TextureModel> {
        let FitConfig {
            state_order,
            noise_order,
            sample_scale,
            rank_tolerance,
        } = self.config;

        if !(rank_tolerance.is_finite() && rank_tolerance >= 0.0) {
            return Err(TextureError::InvalidParameter {
                stage: Stage::Subspace,
                name: "rank tolerance",
                value: rank_tolerance,
                requirement: "must be finite and non-negative",
            });
        }
        let observations = vectorize(sequence, sample_scale)?;
        let tau = observations.frame_count();
        if tau < 2 {
            return Err(TextureError::DegenerateSequence {
                stage: Stage::Dynamics,
                frames: tau,
                required: 2,
            });
        }

        let pixels = observations.width() * observations.height();
        let available = pixels.min(tau);
        if state_order > available {
            return Err(TextureError::InsufficientRank {
                stage: Stage::Subspace,
                requested: state_order,
                available,
            });
        }

        let (width, height) = (observations.width(), observations.height());
        let channels = observations
            .into_channels()
            .iter()
            .enumerate()
            .map(|(index, y)| {
                let _span = tracing::debug_span!("channel", index).entered();
                fit_channel(y, state_order, noise_order, rank_tolerance)
            })
            .collect::<Result<Vec<_>>>()?;

        for (index, channel) in channels.iter().enumerate() {
            tracing::info!(
                channel = index,
                effective_rank = channel.effective_rank,
                retained_energy = channel.retained_energy,
                "Channel model fitted"
            );
        }

        Ok(TextureModel {
            width,
            height,
            scale: sample_scale,
            state_order,
            noise_order,
            channels,
        })
    }
}

/// Runs mean, subspace and dynamics estimation for one channel.
fn fit_channel(
    y: &DMatrix<f64>,
    state_order: usize,
    noise_order: usize,
    rank_tolerance: f64,
) -> Result<ChannelModel> {
    let (mean, centered) = mean_center(y)?;
    let subspace = decompose(&centered, state_order, rank_tolerance)?;
    let x0 = subspace.x0();
    let dynamics = estimate_dynamics(&subspace.xhat, noise_order, rank_tolerance)?;

    Ok(ChannelModel {
        x0,
        mean,
        ahat: dynamics.ahat,
        bhat: dynamics.bhat,
        chat: subspace.chat,
        singular_values: subspace.singular_values,
        noise_singular_values: dynamics.noise_singular_values,
        effective_rank: subspace.effective_rank,
        retained_energy: subspace.retained_energy,
    })
}
