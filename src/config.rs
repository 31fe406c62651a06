//! Fitting, synthesis and source configuration.
//!
//! Every section can be loaded from a TOML file; missing sections and
//! fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for model identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// State-space order `n`.
    pub state_order: usize,
    /// Noise-subspace order `nv` (at most `state_order`).
    pub noise_order: usize,
    /// Multiplier applied to samples when converting them to observations.
    pub sample_scale: f64,
    /// Absolute floor below which singular values count as zero.
    pub rank_tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            state_order: 8,
            noise_order: 4,
            sample_scale: 1.0,
            rank_tolerance: 1e-9,
        }
    }
}

impl FitConfig {
    /// Creates a configuration with the given orders.
    pub fn with_orders(state_order: usize, noise_order: usize) -> Self {
        Self {
            state_order,
            noise_order,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state_order == 0 {
            return Err(ConfigError::InvalidStateOrder);
        }
        if self.noise_order == 0 || self.noise_order > self.state_order {
            return Err(ConfigError::InvalidNoiseOrder {
                noise_order: self.noise_order,
                state_order: self.state_order,
            });
        }
        if !self.sample_scale.is_finite() || self.sample_scale <= 0.0 {
            return Err(ConfigError::InvalidScale);
        }
        if !self.rank_tolerance.is_finite() || self.rank_tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance);
        }
        Ok(())
    }
}

/// Parameters for frame synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Number of frames to generate.
    pub frame_count: usize,
    /// Drive the state with noise (true) or play back deterministically.
    pub stochastic: bool,
    /// Noise seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            frame_count: 60,
            stochastic: true,
            seed: None,
        }
    }
}

impl SynthesisConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_count == 0 {
            return Err(ConfigError::InvalidFrameCount);
        }
        Ok(())
    }
}

/// Parameters for the synthetic frame source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Color channels per pixel.
    pub channels: usize,
    /// Number of frames to capture for fitting.
    pub frame_count: usize,
    /// Temporal period of the generated wave, in frames.
    pub period: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 24,
            channels: 3,
            frame_count: 48,
            period: 12.0,
        }
    }
}

impl SourceConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.channels == 0 {
            return Err(ConfigError::InvalidChannels);
        }
        if self.frame_count == 0 {
            return Err(ConfigError::InvalidFrameCount);
        }
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(ConfigError::InvalidPeriod);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// `state_order` is zero.
    #[error("state order must be at least 1")]
    InvalidStateOrder,
    /// `noise_order` is zero or above `state_order`.
    #[error("noise order {noise_order} must be in 1..={state_order}")]
    InvalidNoiseOrder {
        /// Requested noise order.
        noise_order: usize,
        /// Configured state order.
        state_order: usize,
    },
    /// `sample_scale` is not finite and positive.
    #[error("sample scale must be finite and positive")]
    InvalidScale,
    /// `rank_tolerance` is negative or not finite.
    #[error("rank tolerance must be finite and non-negative")]
    InvalidTolerance,
    /// Zero frame width or height.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Zero channels.
    #[error("channel count must be at least 1")]
    InvalidChannels,
    /// Zero frames requested.
    #[error("frame count must be at least 1")]
    InvalidFrameCount,
    /// Wave period is not finite and positive.
    #[error("period must be finite and positive")]
    InvalidPeriod,
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Frame source settings.
    #[serde(default)]
    pub source: SourceConfig,
    /// Model fitting settings.
    #[serde(default)]
    pub fit: FitConfig,
    /// Synthesis settings.
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.source.validate()?;
        self.fit.validate()?;
        self.synthesis.validate()
    }
}
