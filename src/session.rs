//! One user's workout session: smoother -> analyzer -> reporter
//!
//! Each session owns all of its state. Independent sessions never share
//! anything, so running several side by side just means building several.

use log::info;

use crate::analysis::{ExerciseConfig, FrameAnalysis, PostureAnalyzer};
use crate::error::ConfigError;
use crate::physics::LandmarkFilter;
use crate::pose::Landmark;
use crate::report::{FrameLog, SessionReporter, SessionStats};
use crate::time::{Clock, SystemClock};

pub struct FormSession<C: Clock = SystemClock> {
    clock: C,
    filter: LandmarkFilter,
    analyzer: PostureAnalyzer,
    reporter: SessionReporter,
    frame_log: Option<FrameLog>,
}

impl<C: Clock> FormSession<C> {
    pub fn new(config: &ExerciseConfig, clock: C) -> Result<Self, ConfigError> {
        let exercise = config.compile()?;
        let reporter = SessionReporter::new(&exercise);
        Ok(Self {
            clock,
            filter: LandmarkFilter::new(&config.smoothing, config.kalman_filter_params),
            analyzer: PostureAnalyzer::from_compiled(exercise),
            reporter,
            frame_log: None,
        })
    }

    /// Also keep a per-frame CSV log
    pub fn with_frame_log(mut self) -> Self {
        self.enable_frame_log();
        self
    }

    /// Start logging frames; an existing log is kept
    pub fn enable_frame_log(&mut self) {
        self.frame_log.get_or_insert_with(FrameLog::new);
    }

    /// Run one detector frame through the pipeline. An empty slice means
    /// nobody is in view.
    pub fn process_frame(&mut self, raw: &[Landmark]) -> FrameAnalysis {
        let now = self.clock.now();
        let smoothed = if raw.is_empty() {
            Vec::new()
        } else {
            self.filter.smooth(now.as_secs_f64(), raw)
        };

        let frame = self.analyzer.analyze(&smoothed, now);
        if let Some(rep) = &frame.completed_rep {
            self.reporter.record_repetition(rep.ok, &rep.errors);
        }
        if let Some(log) = &mut self.frame_log {
            log.record(now, &self.analyzer.exercise().name, &frame);
        }
        frame
    }

    pub fn summary(&self) -> String {
        self.reporter.summarize()
    }

    pub fn stats(&self) -> &SessionStats {
        self.reporter.stats()
    }

    pub fn reporter(&self) -> &SessionReporter {
        &self.reporter
    }

    pub fn analyzer(&self) -> &PostureAnalyzer {
        &self.analyzer
    }

    pub fn frame_log(&self) -> Option<&FrameLog> {
        self.frame_log.as_ref()
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Close the current exercise and start another. Returns the stats of
    /// the one just closed. On a config error the session is left untouched.
    pub fn switch_exercise(&mut self, config: &ExerciseConfig) -> Result<SessionStats, ConfigError> {
        let exercise = config.compile()?;
        let reporter = SessionReporter::new(&exercise);
        let closed = std::mem::replace(&mut self.reporter, reporter);
        self.analyzer = PostureAnalyzer::from_compiled(exercise);
        self.filter = LandmarkFilter::new(&config.smoothing, config.kalman_filter_params);
        info!(
            "Switched from '{}' ({} reps) to '{}'",
            closed.exercise(),
            closed.stats().total_reps,
            config.name
        );
        Ok(closed.stats().clone())
    }

    /// Start the current exercise over; the frame log is kept
    pub fn reset(&mut self) {
        self.filter.reset();
        self.analyzer.reset();
        self.reporter = SessionReporter::new(self.analyzer.exercise());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MovementPhase, NO_PERSON_MESSAGE};
    use crate::time::ManualClock;
    use std::time::Duration;

    const ELBOW_JSON: &str = r#"{
        "name": "Curl",
        "angle_definitions": {
            "right_elbow": ["RIGHT_SHOULDER", "RIGHT_ELBOW", "RIGHT_WRIST"]
        },
        "main_angle": "right_elbow",
        "rules": {"state_change": {"up_angle": 150, "down_angle": 60}}
    }"#;

    fn session() -> FormSession<ManualClock> {
        let config = ExerciseConfig::from_json(ELBOW_JSON).unwrap();
        FormSession::new(&config, ManualClock::default()).unwrap()
    }

    #[test]
    fn test_no_person_frame() {
        let mut session = session().with_frame_log();
        let out = session.process_frame(&[]);
        assert_eq!(out.feedback, NO_PERSON_MESSAGE);
        assert_eq!(out.movement_phase, MovementPhase::Undetermined);
        assert_eq!(session.frame_log().map(FrameLog::len), Some(1));
    }

    #[test]
    fn test_switch_exercise_returns_closed_stats() {
        let mut session = session();
        let squat = ELBOW_JSON.replace("\"Curl\"", "\"Squat\"");
        let closed = session
            .switch_exercise(&ExerciseConfig::from_json(&squat).unwrap())
            .unwrap();
        assert_eq!(closed, SessionStats::default());
        assert_eq!(session.reporter().exercise(), "Squat");
    }

    #[test]
    fn test_bad_switch_keeps_session() {
        let mut session = session();
        let bad = ELBOW_JSON.replace("\"RIGHT_WRIST\"", "\"RIGHT_WRIZT\"");
        assert!(session.switch_exercise(&ExerciseConfig::from_json(&bad).unwrap()).is_err());
        assert_eq!(session.reporter().exercise(), "Curl");
    }

    #[test]
    fn test_clock_drives_timestamps() {
        let mut session = session().with_frame_log();
        session.clock_mut().advance(Duration::from_millis(500));
        session.process_frame(&[]);
        let mut out = Vec::new();
        session.frame_log().unwrap().write_to(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains(",500"));
    }
}
