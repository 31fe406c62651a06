//! Frame source abstraction.
//!
//! Decoding real video is left to the integrating application; it only
//! has to implement [`FrameSource`]. [`SyntheticSource`] produces a
//! deterministic travelling-wave texture for demos and tests.

use super::{Frame, FrameSequence};
use crate::config::SourceConfig;
use std::f64::consts::TAU;
use thiserror::Error;

/// Errors that can occur while reading frames.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The configuration was rejected on open.
    #[error("failed to open source: {0}")]
    OpenFailed(String),
    /// A frame was requested before [`FrameSource::open`].
    #[error("source not initialized")]
    NotInitialized,
}

/// Trait for anything that yields frames in temporal order.
pub trait FrameSource {
    /// Opens and initializes the source with the given configuration.
    fn open(&mut self, config: &SourceConfig) -> Result<(), SourceError>;

    /// Reads the next frame.
    fn next_frame(&mut self) -> Result<Frame, SourceError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases resources.
    fn close(&mut self);

    /// Reads `count` consecutive frames into a sequence.
    fn read_sequence(&mut self, count: usize) -> Result<FrameSequence, SourceError> {
        (0..count).map(|_| self.next_frame()).collect()
    }
}

/// Synthetic source emitting a sinusoidal wave drifting across the frame.
///
/// Every sample oscillates with the configured temporal period, each
/// pixel and channel at its own phase, so each channel is exactly the
/// output of a two-state marginally stable linear system.
#[derive(Debug, Default)]
pub struct SyntheticSource {
    config: Option<SourceConfig>,
    sequence: u64,
}

impl SyntheticSource {
    /// Mean intensity of the generated samples.
    pub const BASE_LEVEL: f64 = 128.0;
    /// Peak deviation from the mean.
    pub const AMPLITUDE: f64 = 64.0;

    /// Creates a closed source; call [`FrameSource::open`] before reading.
    pub fn new() -> Self {
        Self::default()
    }

    fn sample(config: &SourceConfig, row: usize, col: usize, channel: usize, t: u64) -> f32 {
        let phase = TAU * (col as f64 / config.width as f64 + row as f64 / (2.0 * config.height as f64))
            + 0.7 * channel as f64;
        let angle = TAU * t as f64 / config.period + phase;
        (Self::BASE_LEVEL + Self::AMPLITUDE * angle.sin()) as f32
    }
}

impl FrameSource for SyntheticSource {
    fn open(&mut self, config: &SourceConfig) -> Result<(), SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::OpenFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!("SyntheticSource opened with config: {:?}", config);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let config = self.config.as_ref().ok_or(SourceError::NotInitialized)?;

        let mut samples = Vec::with_capacity(config.width * config.height * config.channels);
        for row in 0..config.height {
            for col in 0..config.width {
                for channel in 0..config.channels {
                    samples.push(Self::sample(config, row, col, channel, self.sequence));
                }
            }
        }

        let frame = Frame::new(samples, config.width, config.height, config.channels, self.sequence);
        self.sequence += 1;
        Ok(frame)
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("SyntheticSource closed");
    }
}
