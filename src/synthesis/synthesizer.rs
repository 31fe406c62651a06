//! Frame synthesis from a learned model.
//!
//! [`synthesize_step`] is the pure step function; [`SynthesisSession`]
//! owns a running state and advances it one frame at a time.

use super::noise::NoiseSource;
use crate::capture::Frame;
use crate::error::{Result, Stage, TextureError};
use crate::identification::{TextureModel, TextureState};
use nalgebra::DVector;
use rand_distr::{Distribution, StandardNormal};

fn check_lengths(vectors: &[DVector<f64>], expected: usize, what: &'static str) -> Result<()> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(TextureError::shape_mismatch(
            Stage::Synthesis,
            what,
            (expected, 1),
            (bad.len(), 1),
        )),
        None => Ok(()),
    }
}

/// Emits the frame for `state` and returns it with the advanced state.
///
/// Without `noise` the state advances as `x ← Ahat·x`; with noise
/// (one `nv x 1` vector per channel) as `x ← Ahat·x + Bhat·v`.
pub fn synthesize_step(
    model: &TextureModel,
    state: &[DVector<f64>],
    noise: Option<&[DVector<f64>]>,
    sequence: u64,
) -> Result<(Frame, TextureState)> {
    model.check_channels(state.len())?;
    check_lengths(state, model.state_order(), "state")?;
    if let Some(noise) = noise {
        model.check_channels(noise.len())?;
        check_lengths(noise, model.noise_order(), "noise input")?;
    }

    let frame = model.render(state, sequence)?;

    let next = model
        .channels()
        .iter()
        .zip(state)
        .enumerate()
        .map(|(k, (channel, x))| {
            let advanced = channel.ahat() * x;
            match noise {
                Some(noise) => advanced + channel.bhat() * &noise[k],
                None => advanced,
            }
        })
        .collect();

    Ok((frame, next))
}

/// Phase of a synthesis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Holding the starting state; nothing emitted yet.
    Initialized,
    /// At least one frame emitted.
    Advancing,
}

/// A running synthesis over a borrowed, immutable model.
///
/// Each call to [`next_frame`](Self::next_frame) emits the frame for the
/// current state and then advances it. There is no terminal state; the
/// session also works as an endless iterator.
#[derive(Debug)]
pub struct SynthesisSession<'m, D = StandardNormal> {
    model: &'m TextureModel,
    state: TextureState,
    noise: Option<NoiseSource<D>>,
    emitted: u64,
}

impl<'m> SynthesisSession<'m, StandardNormal> {
    /// Noise-free playback starting from the model's initial state.
    pub fn deterministic(model: &'m TextureModel) -> Self {
        Self {
            model,
            state: model.initial_state(),
            noise: None,
            emitted: 0,
        }
    }
}

impl<'m, D: Distribution<f64>> SynthesisSession<'m, D> {
    /// Noise-driven synthesis starting from the model's initial state.
    pub fn stochastic(model: &'m TextureModel, noise: NoiseSource<D>) -> Self {
        Self {
            model,
            state: model.initial_state(),
            noise: Some(noise),
            emitted: 0,
        }
    }

    /// Starts from an arbitrary state, e.g. one from [`TextureModel::project`].
    pub fn from_state(
        model: &'m TextureModel,
        state: TextureState,
        noise: Option<NoiseSource<D>>,
    ) -> Result<Self> {
        model.check_channels(state.len())?;
        check_lengths(&state, model.state_order(), "state")?;
        Ok(Self {
            model,
            state,
            noise,
            emitted: 0,
        })
    }

    /// Emits the next frame and advances the state.
    pub fn next_frame(&mut self) -> Result<Frame> {
        let inputs = self
            .noise
            .as_mut()
            .map(|noise| noise.sample_inputs(self.model.channels().len(), self.model.noise_order()));

        let (frame, next) = synthesize_step(self.model, &self.state, inputs.as_deref(), self.emitted)?;
        self.state = next;
        self.emitted += 1;

        tracing::trace!(
            frame = frame.sequence(),
            mean_intensity = frame.mean_intensity(),
            "Synthesized frame"
        );
        Ok(frame)
    }

    /// Current phase of the session.
    pub fn phase(&self) -> SessionPhase {
        if self.emitted == 0 {
            SessionPhase::Initialized
        } else {
            SessionPhase::Advancing
        }
    }

    /// State the next frame will be rendered from.
    pub fn state(&self) -> &[DVector<f64>] {
        &self.state
    }

    /// Number of frames emitted so far.
    pub fn frames_emitted(&self) -> u64 {
        self.emitted
    }

    /// Returns true if the state is driven by noise.
    pub fn is_stochastic(&self) -> bool {
        self.noise.is_some()
    }
}

impl<D: Distribution<f64>> Iterator for SynthesisSession<'_, D> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FrameSequence;
    use crate::config::FitConfig;
    use crate::identification::TextureLearner;
    use std::f64::consts::TAU;

    fn constant_model() -> TextureModel {
        let seq: FrameSequence = (0..10).map(|t| Frame::filled(128.0, 4, 4, 1, t)).collect();
        TextureLearner::new(FitConfig::with_orders(1, 1)).fit(&seq).unwrap()
    }

    fn wave_model(channels: usize) -> (TextureModel, FrameSequence) {
        let period = 8.0;
        let seq: FrameSequence = (0..24u64)
            .map(|t| {
                let samples = (0..9 * channels)
                    .map(|i| {
                        let phase = TAU * (i as f64) / 9.0;
                        (100.0 + 40.0 * (TAU * t as f64 / period + phase).sin()) as f32
                    })
                    .collect();
                Frame::new(samples, 3, 3, channels, t)
            })
            .collect();
        let model = TextureLearner::new(FitConfig::with_orders(2, 2)).fit(&seq).unwrap();
        (model, seq)
    }

    #[test]
    fn test_constant_texture_replays_constant_frame() {
        let model = constant_model();
        let mut session = SynthesisSession::deterministic(&model);

        for frame in session.by_ref().take(20) {
            let frame = frame.unwrap();
            assert!(frame.samples().iter().all(|&s| (s - 128.0).abs() < 1e-4));
        }
        assert_eq!(session.frames_emitted(), 20);
    }

    #[test]
    fn test_deterministic_playback_follows_sequence() {
        let (model, seq) = wave_model(1);
        let session = SynthesisSession::deterministic(&model);

        for (synthesized, original) in session.take(24).zip(seq.iter()) {
            let synthesized = synthesized.unwrap();
            for (a, b) in synthesized.samples().iter().zip(original.samples()) {
                assert!((a - b).abs() < 0.05, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_deterministic_extrapolates_past_sequence() {
        let (model, seq) = wave_model(1);
        let frames: Vec<Frame> = SynthesisSession::deterministic(&model)
            .take(40)
            .collect::<Result<_>>()
            .unwrap();

        // Period 8: frame 32 looks like frame 0.
        for (a, b) in frames[32].samples().iter().zip(seq.frames()[0].samples()) {
            assert!((a - b).abs() < 0.1);
        }
    }

    #[test]
    fn test_phase_transitions() {
        let model = constant_model();
        let mut session = SynthesisSession::deterministic(&model);

        assert_eq!(session.phase(), SessionPhase::Initialized);
        session.next_frame().unwrap();
        assert_eq!(session.phase(), SessionPhase::Advancing);
        assert!(!session.is_stochastic());
    }

    #[test]
    fn test_state_tracks_transition() {
        let (model, _) = wave_model(1);
        let mut session = SynthesisSession::deterministic(&model);
        let channel = &model.channels()[0];

        assert_eq!(session.state()[0], *channel.x0());
        session.next_frame().unwrap();
        let expected = channel.ahat() * channel.x0();
        assert!((&session.state()[0] - expected).abs().max() < 1e-12);
    }

    #[test]
    fn test_seeded_stochastic_sessions_match() {
        let (model, _) = wave_model(2);
        let a: Vec<Frame> = SynthesisSession::stochastic(&model, NoiseSource::from_seed(11))
            .take(5)
            .collect::<Result<_>>()
            .unwrap();
        let b: Vec<Frame> = SynthesisSession::stochastic(&model, NoiseSource::from_seed(11))
            .take(5)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_step_is_pure() {
        let (model, _) = wave_model(1);
        let state = model.initial_state();
        let noise = vec![DVector::from_vec(vec![0.5, -1.0])];

        let (frame_a, next_a) = synthesize_step(&model, &state, Some(&noise), 0).unwrap();
        let (frame_b, next_b) = synthesize_step(&model, &state, Some(&noise), 0).unwrap();

        assert_eq!(frame_a, frame_b);
        assert_eq!(next_a, next_b);

        let channel = &model.channels()[0];
        let expected = channel.ahat() * &state[0] + channel.bhat() * &noise[0];
        assert!((&next_a[0] - expected).abs().max() < 1e-12);
    }

    #[test]
    fn test_wrong_state_length_rejected() {
        let model = constant_model();
        let state = vec![DVector::zeros(3)];

        assert!(matches!(
            synthesize_step(&model, &state, None, 0),
            Err(TextureError::DimensionMismatch {
                stage: Stage::Synthesis,
                ..
            })
        ));
    }

    #[test]
    fn test_wrong_channel_count_rejected() {
        let model = constant_model();
        let state = vec![DVector::zeros(1), DVector::zeros(1)];
        assert!(synthesize_step(&model, &state, None, 0).is_err());
    }

    #[test]
    fn test_wrong_noise_length_rejected() {
        let model = constant_model();
        let state = model.initial_state();
        let noise = vec![DVector::zeros(2)];
        assert!(synthesize_step(&model, &state, Some(&noise), 0).is_err());
    }

    #[test]
    fn test_session_from_projected_state() {
        let (model, seq) = wave_model(1);
        let state = model.project(&seq.frames()[5]).unwrap();
        let mut session =
            SynthesisSession::<StandardNormal>::from_state(&model, state, None).unwrap();

        let frame = session.next_frame().unwrap();
        for (a, b) in frame.samples().iter().zip(seq.frames()[5].samples()) {
            assert!((a - b).abs() < 0.05);
        }
        assert!(SynthesisSession::<StandardNormal>::from_state(
            &model,
            vec![DVector::from_element(1, 0.0)],
            None
        )
        .is_err());
    }

    #[test]
    fn test_stochastic_synthesis_stays_bounded() {
        let (model, _) = wave_model(1);
        let frames: Vec<Frame> = SynthesisSession::stochastic(&model, NoiseSource::from_seed(5))
            .take(200)
            .collect::<Result<_>>()
            .unwrap();

        assert!(frames.iter().all(|f| f.samples().iter().all(|s| s.is_finite())));
    }
}
