//! Exercise configuration: JSON schema and compilation
//!
//! `ExerciseConfig` mirrors the JSON an exercise template ships as.
//! `compile()` resolves every joint and angle name to an index once, so the
//! per-frame path never touches strings.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::phase::{PhaseClassifier, PhaseSpec};
use super::rules::{Rule, RuleSpec};
use crate::error::ConfigError;
use crate::physics::{KalmanParams, SmoothingConfig};
use crate::pose::{landmark_index, Side};

// ============================================================================
// JSON SCHEMA
// ============================================================================

/// Inclusive range of degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }

    pub(crate) fn validate(&self, context: &str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvalidRange {
                context: context.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Main-angle thresholds driving the repetition counter
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub up_angle: f32,
    pub down_angle: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleBook {
    pub state_change: StateChange,
    /// Evaluated top to bottom, first violation wins
    #[serde(default)]
    pub feedback: Vec<RuleSpec>,
}

/// Analyzer tunables
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Rules only fire when their joints are seen at least this well
    pub rule_visibility_threshold: f32,
    /// Below this on both sides, a bilateral exercise cannot be judged
    pub side_visibility_floor: f32,
    /// How long "Repetition N completed!" stays on screen
    pub rep_message_seconds: f32,
}

impl AnalysisSettings {
    /// `None` for negative, non-finite or out-of-range values
    pub fn rep_message_window(&self) -> Option<Duration> {
        Duration::try_from_secs_f32(self.rep_message_seconds).ok()
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            rule_visibility_threshold: 0.65,
            side_visibility_floor: 0.6,
            rep_message_seconds: 2.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub name: String,
    pub angle_definitions: BTreeMap<String, [String; 3]>,
    pub main_angle: String,
    /// Renderer hint, not read by the analysis
    #[serde(default)]
    pub landmarks_to_hide: Vec<String>,
    #[serde(default)]
    pub kalman_filter_params: KalmanParams,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub phase: Option<PhaseSpec>,
    pub rules: RuleBook,
}

impl ExerciseConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn compile(&self) -> Result<CompiledExercise, ConfigError> {
        CompiledExercise::compile(self)
    }
}

// ============================================================================
// COMPILED FORM
// ============================================================================

/// One configured angle with its joints resolved to landmark indices
#[derive(Clone, Debug, PartialEq)]
pub struct AngleDef {
    pub name: String,
    /// (p1, vertex, p3)
    pub joints: [usize; 3],
    /// Side encoded in the name, for `left_`/`right_` angles
    pub side: Option<Side>,
    /// Index of the opposite-side angle, when both are defined
    pub mirror: Option<usize>,
}

/// Name -> index lookup used while compiling rules
pub(crate) struct AngleTable<'a> {
    angles: &'a [AngleDef],
}

impl<'a> AngleTable<'a> {
    pub(crate) fn resolve(&self, name: &str, context: &str) -> Result<usize, ConfigError> {
        self.angles
            .iter()
            .position(|def| def.name == name)
            .ok_or_else(|| ConfigError::UnknownAngle {
                angle: name.to_string(),
                context: context.to_string(),
            })
    }
}

pub(crate) fn resolve_joint(name: &str, context: &str) -> Result<usize, ConfigError> {
    landmark_index(name).ok_or_else(|| ConfigError::UnknownJoint {
        joint: name.to_string(),
        context: context.to_string(),
    })
}

/// Validated, index-resolved exercise ready for per-frame analysis
#[derive(Clone, Debug)]
pub struct CompiledExercise {
    pub name: String,
    pub angles: Vec<AngleDef>,
    pub main_angle: usize,
    pub state_change: StateChange,
    pub rules: Vec<Rule>,
    pub phase: PhaseClassifier,
    pub settings: AnalysisSettings,
}

impl CompiledExercise {
    fn compile(config: &ExerciseConfig) -> Result<Self, ConfigError> {
        // 1. Angles
        let mut angles = Vec::with_capacity(config.angle_definitions.len());
        for (name, joints) in &config.angle_definitions {
            let context = format!("angle '{}'", name);
            let resolved = [
                resolve_joint(&joints[0], &context)?,
                resolve_joint(&joints[1], &context)?,
                resolve_joint(&joints[2], &context)?,
            ];
            angles.push(AngleDef {
                name: name.clone(),
                joints: resolved,
                side: Side::of_name(name),
                mirror: None,
            });
        }
        for i in 0..angles.len() {
            let mirror = Side::mirror_name(&angles[i].name)
                .and_then(|mirrored| angles.iter().position(|def| def.name == mirrored));
            angles[i].mirror = mirror;
        }

        let table = AngleTable { angles: &angles };
        let main_angle = table
            .resolve(&config.main_angle, "main_angle")
            .map_err(|_| ConfigError::MissingMainAngle(config.main_angle.clone()))?;

        // 2. Repetition thresholds
        let state_change = config.rules.state_change;
        if state_change.down_angle >= state_change.up_angle {
            return Err(ConfigError::InvalidThresholds {
                up: state_change.up_angle,
                down: state_change.down_angle,
            });
        }

        if config.analysis.rep_message_window().is_none() {
            return Err(ConfigError::InvalidDuration {
                setting: "analysis.rep_message_seconds".into(),
                value: config.analysis.rep_message_seconds,
            });
        }

        // 3. Rules, unknown kinds skipped
        let mut rules = Vec::with_capacity(config.rules.feedback.len());
        for (position, spec) in config.rules.feedback.iter().enumerate() {
            match Rule::compile(spec, &table)? {
                Some(rule) => rules.push(rule),
                None => warn!(
                    "Skipping feedback rule #{} of '{}': unknown rule type",
                    position, config.name
                ),
            }
        }

        // 4. Movement phase heuristic
        let phase = match &config.phase {
            Some(spec) => PhaseClassifier::compile(spec, &table)?,
            None => PhaseClassifier::RepState,
        };

        info!(
            "Compiled exercise '{}': {} angles, {} rules, main angle '{}'",
            config.name,
            angles.len(),
            rules.len(),
            config.main_angle
        );

        Ok(Self {
            name: config.name.clone(),
            angles,
            main_angle,
            state_change,
            rules,
            phase,
            settings: config.analysis,
        })
    }

    /// What each feedback message is about, for report annotations
    pub fn message_subjects(&self) -> BTreeMap<String, String> {
        let mut subjects = BTreeMap::new();
        for rule in &self.rules {
            subjects
                .entry(rule.message().to_string())
                .or_insert_with(|| rule.subject(&self.angles));
        }
        subjects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{LEFT_ANKLE, LEFT_HIP, LEFT_KNEE, RIGHT_KNEE};

    const SQUAT_JSON: &str = r#"{
        "name": "Squat",
        "angle_definitions": {
            "left_knee": ["LEFT_HIP", "LEFT_KNEE", "LEFT_ANKLE"],
            "right_knee": ["RIGHT_HIP", "RIGHT_KNEE", "RIGHT_ANKLE"],
            "right_hip": ["RIGHT_SHOULDER", "RIGHT_HIP", "RIGHT_KNEE"]
        },
        "main_angle": "right_knee",
        "landmarks_to_hide": ["LEFT_EYE", "RIGHT_EYE"],
        "kalman_filter_params": {"R": 4.0, "Q": 0.2},
        "rules": {
            "state_change": {"up_angle": 160, "down_angle": 100},
            "feedback": [
                {"type": "zone", "angle": "right_hip", "message": "Keep your chest up",
                 "zones": {"green": {"min": 50, "max": 180}, "yellow": {"min": 35, "max": 50}}},
                {"type": "hologram_check", "message": "from the future"},
                {"type": "vertical_comparison", "joint_a": "RIGHT_KNEE", "joint_b": "RIGHT_FOOT_INDEX",
                 "condition": "is_below_or_level", "message": "Knees too far forward"}
            ]
        }
    }"#;

    #[test]
    fn test_compile_resolves_indices() {
        let config = ExerciseConfig::from_json(SQUAT_JSON).unwrap();
        let compiled = config.compile().unwrap();

        assert_eq!(compiled.name, "Squat");
        assert_eq!(compiled.angles.len(), 3);
        let left = compiled.angles.iter().find(|a| a.name == "left_knee").unwrap();
        assert_eq!(left.joints, [LEFT_HIP, LEFT_KNEE, LEFT_ANKLE]);
        assert_eq!(left.side, Some(Side::Left));

        let main = &compiled.angles[compiled.main_angle];
        assert_eq!(main.name, "right_knee");
        assert_eq!(main.joints[1], RIGHT_KNEE);
        assert_eq!(compiled.angles[main.mirror.unwrap()].name, "left_knee");

        // right_hip has no left twin
        let hip = compiled.angles.iter().find(|a| a.name == "right_hip").unwrap();
        assert_eq!(hip.mirror, None);
        assert_eq!(config.kalman_filter_params.measurement_noise, 4.0);
    }

    #[test]
    fn test_unknown_rule_type_is_skipped() {
        let compiled = ExerciseConfig::from_json(SQUAT_JSON).unwrap().compile().unwrap();
        assert_eq!(compiled.rules.len(), 2);
        assert_eq!(compiled.rules[0].message(), "Keep your chest up");
        assert_eq!(compiled.rules[1].message(), "Knees too far forward");
    }

    #[test]
    fn test_unknown_joint_fails_construction() {
        let json = SQUAT_JSON.replace("\"LEFT_ANKLE\"", "\"LEFT_ANKEL\"");
        let err = ExerciseConfig::from_json(&json).unwrap().compile().unwrap_err();
        match err {
            ConfigError::UnknownJoint { joint, context } => {
                assert_eq!(joint, "LEFT_ANKEL");
                assert!(context.contains("left_knee"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_rule_joint_fails_construction() {
        let json = SQUAT_JSON.replace("\"RIGHT_FOOT_INDEX\"", "\"RIGHT_TOE\"");
        let err = ExerciseConfig::from_json(&json).unwrap().compile().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownJoint { .. }));
    }

    #[test]
    fn test_missing_main_angle() {
        let json = SQUAT_JSON.replace("\"main_angle\": \"right_knee\"", "\"main_angle\": \"elbow\"");
        let err = ExerciseConfig::from_json(&json).unwrap().compile().unwrap_err();
        assert!(matches!(err, ConfigError::MissingMainAngle(name) if name == "elbow"));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let json = SQUAT_JSON.replace("\"up_angle\": 160", "\"up_angle\": 90");
        let err = ExerciseConfig::from_json(&json).unwrap().compile().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholds { .. }));
    }

    #[test]
    fn test_unusable_rep_message_window_rejected() {
        // 1e39 overflows f32 and parses as infinity
        for seconds in ["1e39", "-1.0", "3e19"] {
            let json = SQUAT_JSON.replace(
                "\"rules\": {",
                &format!("\"analysis\": {{\"rep_message_seconds\": {}}},\n        \"rules\": {{", seconds),
            );
            let config = ExerciseConfig::from_json(&json).unwrap();
            let err = config.compile().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidDuration { .. }), "{}", seconds);
            assert!(crate::analysis::PostureAnalyzer::new(&config).is_err());
        }

        let json = SQUAT_JSON.replace(
            "\"rules\": {",
            "\"analysis\": {\"rep_message_seconds\": 0.5},\n        \"rules\": {",
        );
        let config = ExerciseConfig::from_json(&json).unwrap();
        assert_eq!(config.analysis.rep_message_window(), Some(Duration::from_millis(500)));
        assert!(config.compile().is_ok());
    }

    #[test]
    fn test_message_subjects() {
        let compiled = ExerciseConfig::from_json(SQUAT_JSON).unwrap().compile().unwrap();
        let subjects = compiled.message_subjects();
        assert_eq!(
            subjects.get("Keep your chest up").map(String::as_str),
            Some("angle right_hip (RIGHT_SHOULDER, RIGHT_HIP, RIGHT_KNEE)")
        );
        assert_eq!(
            subjects.get("Knees too far forward").map(String::as_str),
            Some("joints RIGHT_KNEE, RIGHT_FOOT_INDEX")
        );
    }

    #[test]
    fn test_defaults_fill_optional_blocks() {
        let config = ExerciseConfig::from_json(SQUAT_JSON).unwrap();
        assert_eq!(config.analysis, AnalysisSettings::default());
        assert_eq!(config.smoothing, SmoothingConfig::default());
        assert!(config.phase.is_none());
        assert_eq!(config.landmarks_to_hide.len(), 2);
    }
}
