//! Posture analyzer - one call per smoothed frame
//!
//! measure -> pick side -> classify phase -> check rules -> step the rep
//! counter -> accumulate rep quality -> arbitrate feedback

use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::config::{CompiledExercise, ExerciseConfig};
use super::feedback::{Feedback, FeedbackArbiter, Severity};
use super::phase::{MovementPhase, PhaseClassifier};
use super::repetition::{RepCounter, RepEvent, RepOutcome, RepState};
use super::rules::{first_violation, FrameView};
use crate::error::ConfigError;
use crate::physics::vertex_angle_3d;
use crate::pose::{mean_visibility, Landmark, Side, SymmetricPairMap};

/// Everything the front end needs to draw one frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameAnalysis {
    /// Every configured angle, degrees
    pub angles: BTreeMap<String, f32>,
    pub feedback: String,
    #[serde(rename = "feedback_severity")]
    pub severity: Severity,
    pub rep_count: u32,
    pub movement_phase: MovementPhase,
    pub active_side: Option<Side>,
    /// Set on the frame that finished a repetition
    pub completed_rep: Option<RepOutcome>,
}

pub struct PostureAnalyzer {
    exercise: CompiledExercise,
    pairs: SymmetricPairMap,
    reps: RepCounter,
    arbiter: FeedbackArbiter,
    phase: MovementPhase,
    feedback: Feedback,
    active_side: Option<Side>,
    // Per-frame scratch, indexed like `exercise.angles`
    angles: Vec<f32>,
    visibility: Vec<f32>,
}

impl PostureAnalyzer {
    pub fn new(config: &ExerciseConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_compiled(config.compile()?))
    }

    pub fn from_compiled(exercise: CompiledExercise) -> Self {
        // `compile` rejects unusable windows; a hand-built exercise falls back to none
        let window = exercise.settings.rep_message_window().unwrap_or_default();
        let count = exercise.angles.len();
        info!(
            "Posture analyzer ready for '{}' (phase heuristic: {})",
            exercise.name,
            if exercise.phase.is_phase_aware() { "configured" } else { "rep state" }
        );
        Self {
            reps: RepCounter::new(exercise.state_change),
            arbiter: FeedbackArbiter::new(window),
            pairs: SymmetricPairMap::new(),
            phase: MovementPhase::Undetermined,
            feedback: Feedback::start(),
            active_side: None,
            angles: vec![0.0; count],
            visibility: vec![0.0; count],
            exercise,
        }
    }

    pub fn exercise(&self) -> &CompiledExercise {
        &self.exercise
    }

    pub fn rep_count(&self) -> u32 {
        self.reps.count()
    }

    pub fn rep_state(&self) -> RepState {
        self.reps.state()
    }

    pub fn movement_phase(&self) -> MovementPhase {
        self.phase
    }

    /// Feedback shown for the last analysed frame
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn active_side(&self) -> Option<Side> {
        self.active_side
    }

    /// Back to the state of a freshly built analyzer
    pub fn reset(&mut self) {
        self.reps.reset();
        self.arbiter.reset();
        self.phase = MovementPhase::Undetermined;
        self.feedback = Feedback::start();
        self.active_side = None;
        debug!("Posture analyzer reset for '{}'", self.exercise.name);
    }

    /// Analyse one frame of smoothed landmarks. An empty slice means no
    /// person was detected.
    pub fn analyze(&mut self, landmarks: &[Landmark], now: Duration) -> FrameAnalysis {
        if landmarks.is_empty() {
            self.phase = MovementPhase::Undetermined;
            self.feedback = Feedback::no_person();
            self.active_side = None;
            return self.snapshot(BTreeMap::new(), None);
        }

        self.measure(landmarks);
        let angles = self.angle_map();

        // Bilateral exercise with neither side in view
        if self.side_unclear() {
            self.phase = MovementPhase::Undetermined;
            self.feedback = Feedback::unclear_side();
            self.active_side = None;
            return self.snapshot(angles, None);
        }

        self.active_side = self.select_side();
        let main = self.resolve_angle(self.exercise.main_angle);
        let main_value = self.angles[main];

        self.phase = self.classify(landmarks);

        let min_visibility = self.exercise.settings.rule_visibility_threshold;
        let view = FrameView {
            landmarks,
            angle_defs: &self.exercise.angles,
            angles: &self.angles,
            angle_visibility: &self.visibility,
            pairs: &self.pairs,
            active_side: self.active_side,
            phase: self.phase,
            min_visibility,
        };
        let verdict = match first_violation(&self.exercise.rules, &view) {
            Some(violation) => Feedback::new(violation.message, violation.severity),
            None => Feedback::posture_ok(),
        };

        let mut completed = None;
        match self.reps.step(main_value) {
            Some(RepEvent::Completed(outcome)) => {
                self.arbiter.announce_rep(outcome.index, now);
                completed = Some(outcome);
            }
            Some(RepEvent::Descended) | None => {}
        }

        if !self.exercise.phase.is_phase_aware() {
            self.phase = self.classify(landmarks);
        }

        // The completing frame never taints the rep it just closed
        if completed.is_none() && self.in_active_phase() && verdict.severity.is_fault() {
            self.reps.mark_failed(&verdict.text);
        }

        self.feedback = self.arbiter.resolve(verdict, now);
        self.snapshot(angles, completed)
    }

    fn measure(&mut self, landmarks: &[Landmark]) {
        let point = |i: usize| landmarks.get(i).map(Landmark::position);
        for (i, def) in self.exercise.angles.iter().enumerate() {
            let [a, b, c] = def.joints;
            self.angles[i] = match (point(a), point(b), point(c)) {
                (Some(p1), Some(p2), Some(p3)) => vertex_angle_3d(p1, p2, p3),
                _ => 0.0,
            };
            self.visibility[i] = mean_visibility(landmarks, &def.joints);
        }
    }

    fn angle_map(&self) -> BTreeMap<String, f32> {
        self.exercise
            .angles
            .iter()
            .zip(&self.angles)
            .map(|(def, &value)| (def.name.clone(), value))
            .collect()
    }

    fn side_unclear(&self) -> bool {
        let main = &self.exercise.angles[self.exercise.main_angle];
        if main.side.is_none() {
            return false;
        }
        let floor = self.exercise.settings.side_visibility_floor;
        let own = self.visibility[self.exercise.main_angle];
        let other = main.mirror.map_or(-1.0, |m| self.visibility[m]);
        own < floor && other < floor
    }

    fn select_side(&self) -> Option<Side> {
        let main_idx = self.exercise.main_angle;
        let main = &self.exercise.angles[main_idx];
        if let (Some(side), Some(mirror)) = (main.side, main.mirror) {
            return Some(if self.visibility[mirror] > self.visibility[main_idx] {
                side.opposite()
            } else {
                side
            });
        }

        let (mut left, mut right, mut paired) = (0.0, 0.0, false);
        for (def, &vis) in self.exercise.angles.iter().zip(&self.visibility) {
            match (def.side, def.mirror) {
                (Some(Side::Left), Some(_)) => left += vis,
                (Some(Side::Right), Some(_)) => right += vis,
                _ => continue,
            }
            paired = true;
        }
        if !paired {
            return main.side;
        }
        if left > right {
            Some(Side::Left)
        } else if right > left {
            Some(Side::Right)
        } else {
            main.side.or(self.active_side)
        }
    }

    fn resolve_angle(&self, angle: usize) -> usize {
        let def = &self.exercise.angles[angle];
        match (self.active_side, def.side, def.mirror) {
            (Some(active), Some(own), Some(mirror)) if active != own => mirror,
            _ => angle,
        }
    }

    fn classify(&self, landmarks: &[Landmark]) -> MovementPhase {
        let knee_angle = match &self.exercise.phase {
            PhaseClassifier::KneeFlexion { angle, .. } => {
                let i = self.resolve_angle(*angle);
                (self.visibility[i] > self.exercise.settings.rule_visibility_threshold)
                    .then(|| self.angles[i])
            }
            _ => None,
        };
        self.exercise.phase.classify(landmarks, knee_angle, self.reps.state())
    }

    fn in_active_phase(&self) -> bool {
        if self.exercise.phase.is_phase_aware() {
            self.phase.is_active()
        } else {
            self.reps.state() == RepState::Down
        }
    }

    fn snapshot(&self, angles: BTreeMap<String, f32>, completed_rep: Option<RepOutcome>) -> FrameAnalysis {
        FrameAnalysis {
            angles,
            feedback: self.feedback.text.clone(),
            severity: self.feedback.severity,
            rep_count: self.reps.count(),
            movement_phase: self.phase,
            active_side: self.active_side,
            completed_rep,
        }
    }
}
