//! Analysis module - exercise config, rules, rep counting, feedback
//!
//! Re-exports only. All logic in submodules.

mod analyzer;
mod config;
mod feedback;
mod phase;
mod repetition;
mod rules;

pub use analyzer::{FrameAnalysis, PostureAnalyzer};
pub use config::{
    AnalysisSettings, AngleDef, AngleRange, CompiledExercise, ExerciseConfig, RuleBook, StateChange,
};
pub use feedback::{
    Feedback, FeedbackArbiter, Severity, NO_PERSON_MESSAGE, POSTURE_OK_MESSAGE, START_MESSAGE,
    UNCLEAR_SIDE_MESSAGE,
};
pub use phase::{body_verticality, MovementPhase, PhaseClassifier, PhaseSpec};
pub use repetition::{RepCounter, RepEvent, RepOutcome, RepState};
pub use rules::{first_violation, FrameView, Rule, RuleSpec, VerticalCondition, Violation, Zones};
