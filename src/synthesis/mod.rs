//! Frame synthesis from learned dynamic texture models.
//!
//! A model is shared read-only; every session owns its own state, so any
//! number of sessions may run over the same model.

mod noise;
mod synthesizer;

pub use noise::NoiseSource;
pub use synthesizer::{synthesize_step, SessionPhase, SynthesisSession};

use crate::capture::FrameSequence;
use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::identification::TextureModel;

/// Generates `config.frame_count` frames starting from the model's initial state.
pub fn synthesize(model: &TextureModel, config: &SynthesisConfig) -> Result<FrameSequence> {
    let frames = if config.stochastic {
        let noise = match config.seed {
            Some(seed) => NoiseSource::from_seed(seed),
            None => NoiseSource::from_os_entropy(),
        };
        SynthesisSession::stochastic(model, noise)
            .take(config.frame_count)
            .collect::<Result<FrameSequence>>()?
    } else {
        SynthesisSession::deterministic(model)
            .take(config.frame_count)
            .collect::<Result<FrameSequence>>()?
    };

    tracing::info!(
        frames = frames.len(),
        stochastic = config.stochastic,
        "Synthesis complete"
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Frame;
    use crate::config::FitConfig;
    use crate::identification::TextureLearner;

    #[test]
    fn test_synthesize_frame_count_and_shape() {
        let seq: FrameSequence = (0..6)
            .map(|t| Frame::new((0..12).map(|i| ((i * t) % 17) as f32).collect(), 2, 2, 3, t as u64))
            .collect();
        let model = TextureLearner::new(FitConfig::with_orders(2, 1)).fit(&seq).unwrap();

        let config = SynthesisConfig {
            frame_count: 7,
            stochastic: true,
            seed: Some(9),
        };
        let frames = synthesize(&model, &config).unwrap();

        assert_eq!(frames.len(), 7);
        assert!(frames.iter().all(|f| f.dims() == (2, 2, 3)));
        assert_eq!(frames.frames()[6].sequence(), 6);
    }
}
