//! The learned dynamic texture model.

use super::vectorize::{self, ObservationSet};
use crate::capture::{Frame, FrameSequence};
use crate::error::{Result, Stage, TextureError};
use nalgebra::{DMatrix, DVector};

/// Linear dynamical system learned for one color channel.
///
/// `x[t+1] = Ahat·x[t] + Bhat·v[t]`, `y[t] = Chat·x[t] + Ymean`.
#[derive(Debug, Clone)]
pub struct ChannelModel {
    pub(crate) x0: DVector<f64>,
    pub(crate) mean: DVector<f64>,
    pub(crate) ahat: DMatrix<f64>,
    pub(crate) bhat: DMatrix<f64>,
    pub(crate) chat: DMatrix<f64>,
    pub(crate) singular_values: DVector<f64>,
    pub(crate) noise_singular_values: DVector<f64>,
    pub(crate) effective_rank: usize,
    pub(crate) retained_energy: f64,
}

impl ChannelModel {
    /// Initial state, `n x 1`.
    pub fn x0(&self) -> &DVector<f64> {
        &self.x0
    }

    /// Temporal mean `Ymean`, `m x 1`.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// State-transition matrix `Ahat`, `n x n`.
    pub fn ahat(&self) -> &DMatrix<f64> {
        &self.ahat
    }

    /// Noise-input matrix `Bhat`, `n x nv`.
    pub fn bhat(&self) -> &DMatrix<f64> {
        &self.bhat
    }

    /// Observation matrix `Chat`, `m x n`, orthonormal columns.
    pub fn chat(&self) -> &DMatrix<f64> {
        &self.chat
    }

    /// Singular values of the appearance subspace, non-increasing.
    pub fn singular_values(&self) -> &DVector<f64> {
        &self.singular_values
    }

    /// Singular values of the driving noise, non-increasing.
    pub fn noise_singular_values(&self) -> &DVector<f64> {
        &self.noise_singular_values
    }

    /// Number of state directions with non-zero energy.
    pub fn effective_rank(&self) -> usize {
        self.effective_rank
    }

    /// Fraction of the centered signal energy captured by `Chat`.
    pub fn retained_energy(&self) -> f64 {
        self.retained_energy
    }

    /// Maps a state to an observation column, `Chat·x + Ymean`.
    pub fn observe(&self, state: &DVector<f64>) -> Result<DVector<f64>> {
        if state.len() != self.chat.ncols() {
            return Err(TextureError::shape_mismatch(
                Stage::Synthesis,
                "state",
                (self.chat.ncols(), 1),
                (state.len(), 1),
            ));
        }
        Ok(&self.chat * state + &self.mean)
    }

    /// Least-squares state of an observation column, `Chatᵗ·(y - Ymean)`.
    pub fn project(&self, observation: &DVector<f64>) -> Result<DVector<f64>> {
        if observation.len() != self.mean.len() {
            return Err(TextureError::shape_mismatch(
                Stage::Synthesis,
                "observation",
                (self.mean.len(), 1),
                (observation.len(), 1),
            ));
        }
        Ok(self.chat.tr_mul(&(observation - &self.mean)))
    }
}

/// A learned dynamic texture: one [`ChannelModel`] per color channel.
///
/// Immutable once fitted; synthesis only reads from it.
#[derive(Debug, Clone)]
pub struct TextureModel {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) scale: f64,
    pub(crate) state_order: usize,
    pub(crate) noise_order: usize,
    pub(crate) channels: Vec<ChannelModel>,
}

/// Per-channel model state, `n x 1` for each channel.
pub type TextureState = Vec<DVector<f64>>;

impl TextureModel {
    /// Frame width the model synthesizes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height the model synthesizes.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample scale used when the model was fitted.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// State-space order `n`.
    pub fn state_order(&self) -> usize {
        self.state_order
    }

    /// Noise-subspace order `nv`.
    pub fn noise_order(&self) -> usize {
        self.noise_order
    }

    /// Number of pixels per frame, `m`.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Per-channel models.
    pub fn channels(&self) -> &[ChannelModel] {
        &self.channels
    }

    /// Initial state of every channel.
    pub fn initial_state(&self) -> TextureState {
        self.channels.iter().map(|c| c.x0.clone()).collect()
    }

    /// Renders the frame for `state`.
    pub fn render(&self, state: &[DVector<f64>], sequence: u64) -> Result<Frame> {
        self.check_channels(state.len())?;
        let columns = self
            .channels
            .iter()
            .zip(state)
            .map(|(channel, x)| channel.observe(x))
            .collect::<Result<Vec<_>>>()?;
        vectorize::frame_from_columns(&columns, self.width, self.height, self.scale, sequence)
    }

    /// Estimates the state that best explains `frame`.
    pub fn project(&self, frame: &Frame) -> Result<TextureState> {
        let expected = (self.height, self.width, self.channels.len());
        if frame.dims() != expected {
            return Err(TextureError::DimensionMismatch {
                stage: Stage::Synthesis,
                what: "frame",
                expected: format!("{}x{}x{}", expected.0, expected.1, expected.2),
                found: format!("{}x{}x{}", frame.height(), frame.width(), frame.channels()),
            });
        }
        let observations = vectorize::vectorize(&FrameSequence::from(vec![frame.clone()]), self.scale)?;
        self.channels
            .iter()
            .zip(observations.channels())
            .map(|(channel, y)| channel.project(&y.column(0).into_owned()))
            .collect()
    }

    /// Projects every frame onto the model subspace and renders it back.
    ///
    /// The result is the rank-`n` appearance approximation of `sequence`.
    pub fn reconstruct(&self, sequence: &FrameSequence) -> Result<FrameSequence> {
        sequence
            .iter()
            .map(|frame| {
                let state = self.project(frame)?;
                self.render(&state, frame.sequence())
            })
            .collect()
    }

    /// Root-mean-square sample error of [`reconstruct`](Self::reconstruct)
    /// against `sequence`, in sample units.
    pub fn reconstruction_rmse(&self, sequence: &FrameSequence) -> Result<f64> {
        let observed = self.observations_of(sequence)?;
        let mut squared = 0.0;
        let mut count = 0usize;
        for (channel, y) in self.channels.iter().zip(observed.channels()) {
            for column in y.column_iter() {
                let column = column.into_owned();
                let rebuilt = channel.observe(&channel.project(&column)?)?;
                squared += (rebuilt - column).norm_squared();
                count += self.pixel_count();
            }
        }
        if count == 0 {
            return Err(TextureError::EmptySequence { stage: Stage::Synthesis });
        }
        Ok((squared / count as f64).sqrt() / self.scale)
    }

    fn observations_of(&self, sequence: &FrameSequence) -> Result<ObservationSet> {
        let observed = vectorize::vectorize(sequence, self.scale)?;
        if (observed.height(), observed.width()) != (self.height, self.width) {
            return Err(TextureError::shape_mismatch(
                Stage::Synthesis,
                "frame",
                (self.height, self.width),
                (observed.height(), observed.width()),
            ));
        }
        self.check_channels(observed.channels().len())?;
        Ok(observed)
    }

    pub(crate) fn check_channels(&self, found: usize) -> Result<()> {
        if found != self.channels.len() {
            return Err(TextureError::DimensionMismatch {
                stage: Stage::Synthesis,
                what: "channel count",
                expected: self.channels.len().to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FitConfig;
    use crate::identification::TextureLearner;

    fn ramp_sequence(frames: usize) -> FrameSequence {
        (0..frames)
            .map(|t| {
                let samples = (0..16)
                    .map(|i| ((i * i * 7 + t * t * 13 + i * t * 5) % 251) as f32)
                    .collect();
                Frame::new(samples, 4, 4, 1, t as u64)
            })
            .collect()
    }

    #[test]
    fn test_reconstruct_keeps_frame_count_and_numbering() {
        let seq = ramp_sequence(6);
        let model = TextureLearner::new(FitConfig::with_orders(2, 1)).fit(&seq).unwrap();
        let rebuilt = model.reconstruct(&seq).unwrap();

        assert_eq!(rebuilt.len(), 6);
        for (t, frame) in rebuilt.iter().enumerate() {
            assert_eq!(frame.sequence(), t as u64);
            assert_eq!(frame.dims(), (4, 4, 1));
        }
    }

    #[test]
    fn test_full_rank_reconstruct_reproduces_input() {
        // Six centered frames span at most five directions.
        let seq = ramp_sequence(6);
        let model = TextureLearner::new(FitConfig::with_orders(5, 1)).fit(&seq).unwrap();
        let rebuilt = model.reconstruct(&seq).unwrap();

        for (original, frame) in seq.iter().zip(rebuilt.iter()) {
            for (a, b) in original.samples().iter().zip(frame.samples()) {
                assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
            }
        }
        assert!(model.reconstruction_rmse(&seq).unwrap() < 1e-3);
    }

    #[test]
    fn test_reconstruct_rejects_wrong_frame_size() {
        let model = TextureLearner::new(FitConfig::with_orders(2, 1))
            .fit(&ramp_sequence(6))
            .unwrap();
        let other: FrameSequence = vec![Frame::filled(0.0, 3, 4, 1, 0)].into();

        assert!(matches!(
            model.reconstruct(&other),
            Err(TextureError::DimensionMismatch { .. })
        ));
    }
}
