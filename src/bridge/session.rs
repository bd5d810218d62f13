//! `WorkoutSession` - the JS-facing wrapper around `FormSession`
//!
//! Frames arrive as a flat `Float32Array` of `[x, y, z, visibility] * 33`
//! (empty when MediaPipe found nobody). Results go back as plain JS objects.

use log::warn;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::clock::PerformanceClock;
use crate::analysis::ExerciseConfig;
use crate::error::{ConfigError, ReportError};
use crate::pose::{Landmark, FLAT_STRIDE, LANDMARK_COUNT};
use crate::report::FrameLog;
use crate::session::FormSession;

impl From<ConfigError> for JsValue {
    fn from(err: ConfigError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<ReportError> for JsValue {
    fn from(err: ReportError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Maps become plain JS objects, not `Map`s
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

#[wasm_bindgen]
pub struct WorkoutSession {
    inner: FormSession<PerformanceClock>,
}

#[wasm_bindgen]
impl WorkoutSession {
    /// Build a session from an exercise config JSON string.
    ///
    /// Throws on malformed JSON or unknown joint/angle names.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WorkoutSession, JsValue> {
        let config = ExerciseConfig::from_json(config_json)?;
        Ok(Self {
            inner: FormSession::new(&config, PerformanceClock::new())?,
        })
    }

    /// Analyse one frame. Returns `{angles, feedback, feedback_severity,
    /// rep_count, movement_phase, active_side, completed_rep}`.
    #[wasm_bindgen(js_name = processFrame)]
    pub fn process_frame(&mut self, data: &[f32]) -> Result<JsValue, JsValue> {
        let landmarks = Landmark::from_flat(data).ok_or_else(|| {
            warn!("Rejected landmark buffer of {} floats", data.len());
            JsValue::from_str(&format!(
                "expected 0 or {} floats, got {}",
                LANDMARK_COUNT * FLAT_STRIDE,
                data.len()
            ))
        })?;
        to_js(&self.inner.process_frame(&landmarks))
    }

    /// Human-readable session summary
    pub fn summary(&self) -> String {
        self.inner.summary()
    }

    /// `{total_reps, ok_reps, invalid_reps, errors}`
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.stats())
    }

    #[wasm_bindgen(js_name = repCount)]
    pub fn rep_count(&self) -> u32 {
        self.inner.analyzer().rep_count()
    }

    /// Swap exercises mid-session; returns the closed exercise's stats
    #[wasm_bindgen(js_name = switchExercise)]
    pub fn switch_exercise(&mut self, config_json: &str) -> Result<JsValue, JsValue> {
        let config = ExerciseConfig::from_json(config_json)?;
        let closed = self.inner.switch_exercise(&config)?;
        to_js(&closed)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Start recording every frame for `frameLogCsv()`
    #[wasm_bindgen(js_name = enableFrameLog)]
    pub fn enable_frame_log(&mut self) {
        self.inner.enable_frame_log();
    }

    /// Per-frame log as CSV text, empty if logging was never enabled
    #[wasm_bindgen(js_name = frameLogCsv)]
    pub fn frame_log_csv(&self) -> Result<String, JsValue> {
        let Some(log) = self.inner.frame_log() else {
            return Ok(String::new());
        };
        frame_log_text(log).map_err(JsValue::from)
    }
}

fn frame_log_text(log: &FrameLog) -> Result<String, ReportError> {
    let mut out = Vec::new();
    log.write_to(&mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}
