//! Error taxonomy for model identification and synthesis.
//!
//! Every failure names the pipeline stage it came from together with
//! the dimensions involved. Nothing is retried internally.

use std::fmt;
use thiserror::Error;

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Frame sequence to observation matrices.
    Vectorize,
    /// Observation matrices back to frames.
    Devectorize,
    /// Temporal mean and centering.
    Mean,
    /// First SVD (appearance subspace).
    Subspace,
    /// Transition fit and second SVD (noise subspace).
    Dynamics,
    /// Frame synthesis from a model.
    Synthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Vectorize => "vectorize",
            Stage::Devectorize => "devectorize",
            Stage::Mean => "mean",
            Stage::Subspace => "subspace",
            Stage::Dynamics => "dynamics",
            Stage::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

/// Errors raised while fitting or running a dynamic texture model.
///
/// Every variant carries the [`Stage`] it was raised in.
#[derive(Debug, Clone, Error)]
pub enum TextureError {
    /// Frames or matrices passed between stages disagree on shape.
    #[error("{stage}: {what} dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Stage that detected the mismatch.
        stage: Stage,
        /// The object whose shape is wrong.
        what: &'static str,
        /// Shape the stage required.
        expected: String,
        /// Shape it was given.
        found: String,
    },

    /// No frames at all.
    #[error("{stage}: empty frame sequence")]
    EmptySequence {
        /// Stage that received the empty input.
        stage: Stage,
    },

    /// Too few frames to fit any transition.
    #[error("{stage}: {frames} frame(s) given, at least {required} required")]
    DegenerateSequence {
        /// Stage that rejected the sequence.
        stage: Stage,
        /// Frames supplied.
        frames: usize,
        /// Minimum frames the stage needs.
        required: usize,
    },

    /// A state or noise order larger than the matrix shape admits.
    #[error("{stage}: requested order {requested} exceeds available rank {available}")]
    InsufficientRank {
        /// Stage whose decomposition was too small.
        stage: Stage,
        /// Order asked for (`n` or `nv`).
        requested: usize,
        /// Largest order the matrix shape allows.
        available: usize,
    },

    /// A solver failed or its input was not finite.
    #[error("{stage}: numerical instability: {detail}")]
    NumericalInstability {
        /// Stage running the solver.
        stage: Stage,
        /// What went wrong.
        detail: &'static str,
    },

    /// A numeric parameter outside its valid range.
    #[error("{stage}: invalid {name} {value}: {requirement}")]
    InvalidParameter {
        /// Stage that received the parameter.
        stage: Stage,
        /// Parameter name.
        name: &'static str,
        /// Value supplied.
        value: f64,
        /// Range the value must lie in.
        requirement: &'static str,
    },
}

impl TextureError {
    /// Builds a dimension mismatch from two `rows x cols` shapes.
    pub(crate) fn shape_mismatch(
        stage: Stage,
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    ) -> Self {
        TextureError::DimensionMismatch {
            stage,
            what,
            expected: format!("{}x{}", expected.0, expected.1),
            found: format!("{}x{}", found.0, found.1),
        }
    }

    /// Rejects a sample scale that is not finite and positive.
    pub(crate) fn check_scale(scale: f64, stage: Stage) -> Result<()> {
        if scale.is_finite() && scale > 0.0 {
            Ok(())
        } else {
            Err(TextureError::InvalidParameter {
                stage,
                name: "sample scale",
                value: scale,
                requirement: "must be finite and positive",
            })
        }
    }

    /// Returns the stage the error originated from.
    pub fn stage(&self) -> Stage {
        match self {
            TextureError::DimensionMismatch { stage, .. }
            | TextureError::EmptySequence { stage }
            | TextureError::DegenerateSequence { stage, .. }
            | TextureError::InsufficientRank { stage, .. }
            | TextureError::NumericalInstability { stage, .. }
            | TextureError::InvalidParameter { stage, .. } => *stage,
        }
    }
}

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, TextureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_stage_and_shapes() {
        let err = TextureError::shape_mismatch(Stage::Synthesis, "state", (3, 1), (2, 1));
        assert_eq!(
            err.to_string(),
            "synthesis: state dimension mismatch: expected 3x1, found 2x1"
        );
        assert_eq!(err.stage(), Stage::Synthesis);
    }

    #[test]
    fn test_scale_check() {
        assert!(TextureError::check_scale(0.5, Stage::Vectorize).is_ok());
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                TextureError::check_scale(bad, Stage::Vectorize),
                Err(TextureError::InvalidParameter { name: "sample scale", .. })
            ));
        }
    }

    #[test]
    fn test_rank_error_message() {
        let err = TextureError::InsufficientRank {
            stage: Stage::Subspace,
            requested: 5,
            available: 4,
        };
        assert!(err.to_string().contains("requested order 5"));
    }
}
