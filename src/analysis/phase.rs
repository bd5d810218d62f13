//! Movement phase - coarse exercise state used to gate rules
//!
//! Phase comes from a configurable heuristic: knee flexion for squat-like
//! movements, torso orientation for floor work, or simply the repetition
//! state when nothing is configured.

use serde::{Deserialize, Serialize};

use super::config::AngleTable;
use super::repetition::RepState;
use crate::error::ConfigError;
use crate::pose::{Landmark, LEFT_HIP, LEFT_SHOULDER, RIGHT_HIP, RIGHT_SHOULDER};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementPhase {
    Undetermined,
    Up,
    Down,
    Standing,
    Transition,
    Squatting,
    Vertical,
    Horizontal,
}

impl MovementPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementPhase::Undetermined => "undetermined",
            MovementPhase::Up => "up",
            MovementPhase::Down => "down",
            MovementPhase::Standing => "standing",
            MovementPhase::Transition => "transition",
            MovementPhase::Squatting => "squatting",
            MovementPhase::Vertical => "vertical",
            MovementPhase::Horizontal => "horizontal",
        }
    }

    /// Parse an `apply_when` label (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        let phase = match label.trim().to_ascii_lowercase().as_str() {
            "undetermined" => MovementPhase::Undetermined,
            "up" => MovementPhase::Up,
            "down" => MovementPhase::Down,
            "standing" => MovementPhase::Standing,
            "transition" => MovementPhase::Transition,
            "squatting" => MovementPhase::Squatting,
            "vertical" => MovementPhase::Vertical,
            "horizontal" => MovementPhase::Horizontal,
            _ => return None,
        };
        Some(phase)
    }

    pub(crate) fn parse(label: &str) -> Result<Self, ConfigError> {
        Self::from_label(label).ok_or_else(|| ConfigError::UnknownPhase(label.to_string()))
    }

    /// Phases in which the working part of a rep happens
    pub fn is_active(self) -> bool {
        matches!(
            self,
            MovementPhase::Down | MovementPhase::Squatting | MovementPhase::Horizontal
        )
    }
}

/// `phase` block of an exercise config
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseSpec {
    KneeFlexion {
        angle: String,
        standing_above: f32,
        squatting_below: f32,
    },
    BodyOrientation {
        vertical_ratio: f32,
    },
}

/// Compiled phase heuristic
#[derive(Clone, Debug, PartialEq)]
pub enum PhaseClassifier {
    /// Phase mirrors the repetition counter
    RepState,
    KneeFlexion {
        angle: usize,
        standing_above: f32,
        squatting_below: f32,
    },
    /// |dy| / length of the shoulder-mid -> hip-mid vector
    BodyOrientation { vertical_ratio: f32 },
}

impl PhaseClassifier {
    pub(crate) fn compile(spec: &PhaseSpec, table: &AngleTable) -> Result<Self, ConfigError> {
        match spec {
            PhaseSpec::KneeFlexion { angle, standing_above, squatting_below } => {
                if squatting_below > standing_above {
                    return Err(ConfigError::InvalidRange {
                        context: "phase knee_flexion".to_string(),
                        min: *squatting_below,
                        max: *standing_above,
                    });
                }
                Ok(PhaseClassifier::KneeFlexion {
                    angle: table.resolve(angle, "phase knee_flexion")?,
                    standing_above: *standing_above,
                    squatting_below: *squatting_below,
                })
            }
            PhaseSpec::BodyOrientation { vertical_ratio } => Ok(PhaseClassifier::BodyOrientation {
                vertical_ratio: *vertical_ratio,
            }),
        }
    }

    /// Whether the rule gates and rep quality follow this heuristic rather
    /// than the repetition state
    pub fn is_phase_aware(&self) -> bool {
        !matches!(self, PhaseClassifier::RepState)
    }

    /// Classify the current frame.
    ///
    /// `knee_angle` is the active-side value of the configured angle,
    /// looked up by the caller.
    pub fn classify(
        &self,
        landmarks: &[Landmark],
        knee_angle: Option<f32>,
        rep_state: RepState,
    ) -> MovementPhase {
        match self {
            PhaseClassifier::RepState => match rep_state {
                RepState::Up => MovementPhase::Up,
                RepState::Down => MovementPhase::Down,
            },
            PhaseClassifier::KneeFlexion { standing_above, squatting_below, .. } => {
                match knee_angle {
                    Some(angle) if angle > *standing_above => MovementPhase::Standing,
                    Some(angle) if angle < *squatting_below => MovementPhase::Squatting,
                    Some(_) => MovementPhase::Transition,
                    None => MovementPhase::Undetermined,
                }
            }
            PhaseClassifier::BodyOrientation { vertical_ratio } => {
                body_verticality(landmarks).map_or(MovementPhase::Undetermined, |ratio| {
                    if ratio >= *vertical_ratio {
                        MovementPhase::Vertical
                    } else {
                        MovementPhase::Horizontal
                    }
                })
            }
        }
    }
}

/// How upright the torso is: 1.0 = shoulders straight above hips, 0.0 = lying flat
pub fn body_verticality(landmarks: &[Landmark]) -> Option<f32> {
    let point = |i: usize| landmarks.get(i).map(Landmark::xy);
    let (ls, rs) = (point(LEFT_SHOULDER)?, point(RIGHT_SHOULDER)?);
    let (lh, rh) = (point(LEFT_HIP)?, point(RIGHT_HIP)?);

    let shoulder_mid = ((ls.0 + rs.0) / 2.0, (ls.1 + rs.1) / 2.0);
    let hip_mid = ((lh.0 + rh.0) / 2.0, (lh.1 + rh.1) / 2.0);
    let dx = hip_mid.0 - shoulder_mid.0;
    let dy = hip_mid.1 - shoulder_mid.1;

    let length = (dx * dx + dy * dy).sqrt();
    if length <= f32::EPSILON {
        return None;
    }
    Some(dy.abs() / length)
}
