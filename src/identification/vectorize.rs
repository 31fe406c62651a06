//! Conversion between frame sequences and observation matrices.
//!
//! Pixel `(r, c)` maps to row `r * width + c`; frame `t` maps to
//! column `t`. The same mapping is used in both directions.

use crate::capture::{Frame, FrameSequence};
use crate::error::{Result, Stage, TextureError};
use nalgebra::{DMatrix, DVector};

/// Per-channel observation matrices of a frame sequence.
///
/// Each matrix is `(height * width) x τ`, samples multiplied by `scale`.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    width: usize,
    height: usize,
    scale: f64,
    channels: Vec<DMatrix<f64>>,
}

impl ObservationSet {
    /// Frame width the matrices were built from.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height the matrices were built from.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Sample scale applied during vectorization.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// One observation matrix per channel.
    pub fn channels(&self) -> &[DMatrix<f64>] {
        &self.channels
    }

    /// Number of time steps τ.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, |y| y.ncols())
    }

    /// Consumes the set, returning the matrices.
    pub fn into_channels(self) -> Vec<DMatrix<f64>> {
        self.channels
    }
}

fn dims_string((h, w, k): (usize, usize, usize)) -> String {
    format!("{}x{}x{}", h, w, k)
}

/// Flattens a frame sequence into one observation matrix per channel.
///
/// `scale` must be finite and positive.
pub fn vectorize(sequence: &FrameSequence, scale: f64) -> Result<ObservationSet> {
    TextureError::check_scale(scale, Stage::Vectorize)?;
    let first = sequence.first().ok_or(TextureError::EmptySequence {
        stage: Stage::Vectorize,
    })?;
    let dims = first.dims();
    let (height, width, channel_count) = dims;

    for frame in sequence {
        if frame.dims() != dims {
            return Err(TextureError::DimensionMismatch {
                stage: Stage::Vectorize,
                what: "frame",
                expected: dims_string(dims),
                found: dims_string(frame.dims()),
            });
        }
        if !frame.is_valid() {
            return Err(TextureError::DimensionMismatch {
                stage: Stage::Vectorize,
                what: "frame buffer",
                expected: (frame.pixel_count() * frame.channels()).to_string(),
                found: frame.samples().len().to_string(),
            });
        }
    }

    let pixels = width * height;
    let tau = sequence.len();
    let channels = (0..channel_count)
        .map(|k| {
            let mut y = DMatrix::zeros(pixels, tau);
            for (t, frame) in sequence.iter().enumerate() {
                let samples = frame.samples();
                for (row, value) in y.column_mut(t).iter_mut().enumerate() {
                    *value = f64::from(samples[row * channel_count + k]) * scale;
                }
            }
            y
        })
        .collect();

    tracing::debug!(width, height, channels = channel_count, tau, "Vectorized frame sequence");

    Ok(ObservationSet {
        width,
        height,
        scale,
        channels,
    })
}

fn assemble(
    width: usize,
    height: usize,
    channel_count: usize,
    scale: f64,
    sequence: u64,
    value: impl Fn(usize, usize) -> f64,
) -> Frame {
    let pixels = width * height;
    let mut samples = Vec::with_capacity(pixels * channel_count);
    for row in 0..pixels {
        for k in 0..channel_count {
            samples.push((value(k, row) / scale) as f32);
        }
    }
    Frame::new(samples, width, height, channel_count, sequence)
}

/// Builds a single frame from one observation column per channel.
pub fn frame_from_columns(
    columns: &[DVector<f64>],
    width: usize,
    height: usize,
    scale: f64,
    sequence: u64,
) -> Result<Frame> {
    TextureError::check_scale(scale, Stage::Devectorize)?;
    if columns.is_empty() {
        return Err(TextureError::DimensionMismatch {
            stage: Stage::Devectorize,
            what: "channel count",
            expected: "at least 1".to_string(),
            found: "0".to_string(),
        });
    }
    let pixels = width * height;
    if let Some(bad) = columns.iter().find(|c| c.len() != pixels) {
        return Err(TextureError::shape_mismatch(
            Stage::Devectorize,
            "observation column",
            (pixels, 1),
            (bad.len(), 1),
        ));
    }

    Ok(assemble(width, height, columns.len(), scale, sequence, |k, row| {
        columns[k][row]
    }))
}

/// Rebuilds a frame sequence from per-channel observation matrices.
///
/// Left inverse of [`vectorize`] when given the same `scale`.
pub fn devectorize(
    observations: &[DMatrix<f64>],
    width: usize,
    height: usize,
    scale: f64,
) -> Result<FrameSequence> {
    TextureError::check_scale(scale, Stage::Devectorize)?;
    let first = observations.first().ok_or(TextureError::DimensionMismatch {
        stage: Stage::Devectorize,
        what: "channel count",
        expected: "at least 1".to_string(),
        found: "0".to_string(),
    })?;
    let expected = (width * height, first.ncols());
    if let Some(bad) = observations.iter().find(|y| y.shape() != expected) {
        return Err(TextureError::shape_mismatch(
            Stage::Devectorize,
            "observation matrix",
            expected,
            bad.shape(),
        ));
    }

    Ok((0..expected.1)
        .map(|t| {
            assemble(width, height, observations.len(), scale, t as u64, |k, row| {
                observations[k][(row, t)]
            })
        })
        .collect())
}
