//! Dynamic Texture Library
//!
//! Learns a low-order stochastic linear dynamical system from a sequence
//! of video frames and resynthesizes frames from it:
//!
//! ```text
//! x[t+1] = A·x[t] + B·v[t]      v ~ N(0, I)
//! y[t]   = C·x[t] + ymean
//! ```
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! capture → identification → synthesis
//!                  ↓
//!              analysis
//! ```
//!
//! Identification runs, per color channel: vectorize → mean/center →
//! subspace (SVD) → dynamics (pseudo-inverse + SVD).
//!
//! # Rank policy
//!
//! Asking for more state or noise directions than the matrix shape allows
//! fails with [`TextureError::InsufficientRank`]. Numerically rank-deficient
//! input within that bound (e.g. a near-static sequence) is zero-padded:
//! the missing directions get zero singular values and persist unchanged
//! under `A`.
//!
//! # Example
//!
//! ```no_run
//! use dyntex::{
//!     capture::{FrameSource, SyntheticSource},
//!     config::{FitConfig, SourceConfig},
//!     identification::TextureLearner,
//!     synthesis::{NoiseSource, SynthesisSession},
//! };
//!
//! let mut source = SyntheticSource::new();
//! source.open(&SourceConfig::default()).unwrap();
//! let frames = source.read_sequence(48).unwrap();
//!
//! let model = TextureLearner::new(FitConfig::with_orders(8, 4))
//!     .fit(&frames)
//!     .unwrap();
//!
//! let session = SynthesisSession::stochastic(&model, NoiseSource::from_seed(7));
//! for frame in session.take(100) {
//!     let frame = frame.unwrap();
//!     println!("frame {} mean {:.1}", frame.sequence(), frame.mean_intensity());
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod identification;
pub mod linalg;
pub mod synthesis;

// Re-export commonly used types at crate root
pub use analysis::ModelDiagnostics;
pub use capture::{Frame, FrameSequence, FrameSource, SyntheticSource};
pub use config::{FileConfig, FitConfig, SynthesisConfig};
pub use error::{Stage, TextureError};
pub use identification::{ChannelModel, TextureLearner, TextureModel};
pub use synthesis::{synthesize, NoiseSource, SynthesisSession};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
