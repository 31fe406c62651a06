//! Frame input and sequence handling.
//!
//! This module provides the raster frame types the pipeline consumes and
//! an abstraction over where frames come from. Decoding real video is
//! the caller's business; the pipeline only sees ordered frames.

mod frame;
mod source;

pub use frame::{Frame, FrameSequence};
pub use source::{FrameSource, SourceError, SyntheticSource};
