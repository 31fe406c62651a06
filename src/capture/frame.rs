//! Raster frame and ordered frame sequence types.

/// A single raster frame, `height x width x channels`.
///
/// Samples are stored interleaved in row-major order, so sample
/// `(row, col, channel)` lives at `(row * width + col) * channels + channel`.
#[derive(Clone, PartialEq)]
pub struct Frame {
    /// Interleaved sample data.
    samples: Vec<f32>,
    /// Frame width in pixels.
    width: usize,
    /// Frame height in pixels.
    height: usize,
    /// Color channels per pixel.
    channels: usize,
    /// Position in the source stream.
    sequence: u64,
}

impl Frame {
    /// Creates a frame from floating-point samples.
    pub fn new(samples: Vec<f32>, width: usize, height: usize, channels: usize, sequence: u64) -> Self {
        Self {
            samples,
            width,
            height,
            channels,
            sequence,
        }
    }

    /// Creates a frame from 8-bit samples (e.g. a decoded video frame).
    pub fn from_u8(pixels: &[u8], width: usize, height: usize, channels: usize, sequence: u64) -> Self {
        let samples = pixels.iter().map(|&p| f32::from(p)).collect();
        Self::new(samples, width, height, channels, sequence)
    }

    /// Creates a frame with every sample set to `value`.
    pub fn filled(value: f32, width: usize, height: usize, channels: usize, sequence: u64) -> Self {
        Self::new(vec![value; width * height * channels], width, height, channels, sequence)
    }

    /// Returns the interleaved sample data.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of color channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns `(height, width, channels)`.
    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns one sample. Panics if out of range.
    #[inline]
    pub fn sample(&self, row: usize, col: usize, channel: usize) -> f32 {
        self.samples[(row * self.width + col) * self.channels + channel]
    }

    /// Validates that the sample buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.channels > 0 && self.samples.len() == self.pixel_count() * self.channels
    }

    /// Mean intensity over all samples.
    pub fn mean_intensity(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|&s| f64::from(s)).sum::<f64>() / self.samples.len() as f64
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("sequence", &self.sequence)
            .field("samples", &self.samples.len())
            .finish()
    }
}

/// An ordered sequence of frames; index 0 is the earliest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a frame at the end (latest in time).
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Number of frames, τ.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the sequence holds no frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the frames in temporal order.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the earliest frame.
    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// Iterates frames in temporal order.
    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}

impl From<Vec<Frame>> for FrameSequence {
    fn from(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

impl FromIterator<Frame> for FrameSequence {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
