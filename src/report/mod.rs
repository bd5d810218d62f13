//! Report module - session statistics, summary text, per-frame CSV
//!
//! Re-exports only. All logic in submodules.

mod frame_log;
mod reporter;
mod stats;

pub use frame_log::FrameLog;
pub use reporter::SessionReporter;
pub use stats::{ErrorTally, SessionStats};
