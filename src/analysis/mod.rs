//! Model diagnostics.
//!
//! Summaries of how well a fitted model explains its input and whether
//! its dynamics are stable. These are reporting aids, not part of fitting.

mod diagnostics;

pub use diagnostics::{ChannelDiagnostics, ModelDiagnostics};
