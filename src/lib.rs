//! Posture Web - real-time exercise form feedback
//!
//! Entry point for the WASM module and the native library. Only contains:
//! - Module declarations and re-exports
//! - wasm_bindgen entry points that delegate to submodules
//!
//! Per frame: raw landmarks -> smoothing (`physics`) -> posture analysis
//! (`analysis`) -> per-rep statistics (`report`), wired together by
//! `session::FormSession`.

pub mod analysis;
pub mod bridge;
pub mod error;
pub mod physics;
pub mod pose;
pub mod report;
pub mod session;
pub mod time;

use wasm_bindgen::prelude::*;

pub use analysis::{ExerciseConfig, FrameAnalysis, PostureAnalyzer, Severity};
pub use bridge::WorkoutSession;
pub use error::{ConfigError, ReportError};
pub use pose::Landmark;
pub use report::{SessionReporter, SessionStats};
pub use session::FormSession;

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Called automatically when WASM module loads
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Route `log` output to the browser console.
///
/// `level` is one of "trace", "debug", "info", "warn", "error"; anything
/// else means "info". Safe to call more than once.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: &str) {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => log::Level::Trace,
        "debug" => log::Level::Debug,
        "warn" => log::Level::Warn,
        "error" => log::Level::Error,
        _ => log::Level::Info,
    };
    wasm_logger::init(wasm_logger::Config::new(log_level));
    log::info!("Posture analysis initialized with log level: {}", log_level);
}
