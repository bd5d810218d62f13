//! Feedback rules
//!
//! `RuleSpec` is the JSON form (tagged by `"type"`), `Rule` the compiled
//! form carrying indices only. Evaluation is an exhaustive match: a new rule
//! kind is a new variant, checked by the compiler.

use serde::{Deserialize, Serialize};

use super::config::{resolve_joint, AngleDef, AngleRange, AngleTable};
use super::feedback::Severity;
use super::phase::MovementPhase;
use crate::error::ConfigError;
use crate::physics::{parallelism_difference, segment_angle_horizontal};
use crate::pose::{landmark_name, mean_visibility, Landmark, Side, SymmetricPairMap};

// ============================================================================
// JSON FORM
// ============================================================================

/// Green = ideal, yellow = caution, outside both = critical
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zones {
    #[serde(alias = "verde")]
    pub green: AngleRange,
    #[serde(default, alias = "amarela")]
    pub yellow: Option<AngleRange>,
}

/// Vertical relation between two joints. Image y grows downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalCondition {
    IsBelow,
    IsBelowOrLevel,
    IsAbove,
    IsAboveOrLevel,
}

impl VerticalCondition {
    /// Does joint A (at `ya`) satisfy the condition relative to joint B?
    ///
    /// `tolerance` only widens the `*_or_level` conditions. `IsBelow` and
    /// `IsAbove` stay strict.
    pub fn holds(self, ya: f32, yb: f32, tolerance: f32) -> bool {
        match self {
            VerticalCondition::IsBelow => ya > yb,
            VerticalCondition::IsBelowOrLevel => ya >= yb - tolerance,
            VerticalCondition::IsAbove => ya < yb,
            VerticalCondition::IsAboveOrLevel => ya <= yb + tolerance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleSpec {
    Zone {
        angle: String,
        zones: Zones,
        message: String,
        #[serde(default)]
        apply_when: Option<String>,
    },
    SegmentParallelism {
        segment_a: [String; 2],
        segment_b: [String; 2],
        max_difference: f32,
        message: String,
        #[serde(default)]
        apply_when: Option<String>,
    },
    VerticalComparison {
        joint_a: String,
        joint_b: String,
        condition: VerticalCondition,
        #[serde(default)]
        tolerance: f32,
        message: String,
        #[serde(default)]
        apply_when: Option<String>,
    },
    AngleOffset {
        base_angle: String,
        offset_angle: String,
        expected: AngleRange,
        message: String,
        #[serde(default)]
        apply_when: Option<String>,
    },
    /// Rule kinds this build does not know; skipped at compile time
    #[serde(other)]
    Unknown,
}

// ============================================================================
// COMPILED FORM
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Zone {
        angle: usize,
        zones: Zones,
        message: String,
        apply_when: Option<MovementPhase>,
    },
    SegmentParallelism {
        segment_a: [usize; 2],
        segment_b: [usize; 2],
        max_difference: f32,
        message: String,
        apply_when: Option<MovementPhase>,
    },
    VerticalComparison {
        joint_a: usize,
        joint_b: usize,
        condition: VerticalCondition,
        tolerance: f32,
        message: String,
        apply_when: Option<MovementPhase>,
    },
    AngleOffset {
        base_angle: usize,
        offset_angle: usize,
        expected: AngleRange,
        message: String,
        apply_when: Option<MovementPhase>,
    },
}

/// A rule that fired this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Violation<'r> {
    pub severity: Severity,
    pub message: &'r str,
}

/// Everything a rule may look at for one frame
pub struct FrameView<'a> {
    pub landmarks: &'a [Landmark],
    pub angle_defs: &'a [AngleDef],
    /// Indexed like `angle_defs`
    pub angles: &'a [f32],
    /// Mean joint visibility per angle, indexed like `angle_defs`
    pub angle_visibility: &'a [f32],
    pub pairs: &'a SymmetricPairMap,
    pub active_side: Option<Side>,
    pub phase: MovementPhase,
    pub min_visibility: f32,
}

impl<'a> FrameView<'a> {
    /// Swap a bilateral angle for its active-side twin, when one exists
    pub fn resolve_angle(&self, angle: usize) -> usize {
        let def = &self.angle_defs[angle];
        match (self.active_side, def.side, def.mirror) {
            (Some(active), Some(own), Some(mirror)) if active != own => mirror,
            _ => angle,
        }
    }

    /// Swap a bilateral joint for its active-side twin
    pub fn resolve_joint(&self, joint: usize) -> usize {
        match self.active_side {
            Some(side) => self.pairs.on_side(joint, side),
            None => joint,
        }
    }

    fn angle(&self, angle: usize) -> Option<(f32, f32)> {
        let i = self.resolve_angle(angle);
        Some((*self.angles.get(i)?, *self.angle_visibility.get(i)?))
    }

    fn joints_visible(&self, joints: &[usize]) -> bool {
        mean_visibility(self.landmarks, joints) > self.min_visibility
    }

    fn xy(&self, joint: usize) -> Option<(f32, f32)> {
        self.landmarks.get(joint).map(Landmark::xy)
    }
}

fn compile_phase(apply_when: &Option<String>) -> Result<Option<MovementPhase>, ConfigError> {
    apply_when.as_deref().map(MovementPhase::parse).transpose()
}

impl Rule {
    /// Resolve names to indices. `Ok(None)` for unknown rule kinds.
    pub(crate) fn compile(spec: &RuleSpec, table: &AngleTable) -> Result<Option<Self>, ConfigError> {
        let rule = match spec {
            RuleSpec::Zone { angle, zones, message, apply_when } => {
                let context = format!("zone rule '{}'", message);
                zones.green.validate(&context)?;
                if let Some(yellow) = &zones.yellow {
                    yellow.validate(&context)?;
                }
                Rule::Zone {
                    angle: table.resolve(angle, &context)?,
                    zones: *zones,
                    message: message.clone(),
                    apply_when: compile_phase(apply_when)?,
                }
            }
            RuleSpec::SegmentParallelism { segment_a, segment_b, max_difference, message, apply_when } => {
                let context = format!("segment_parallelism rule '{}'", message);
                Rule::SegmentParallelism {
                    segment_a: [
                        resolve_joint(&segment_a[0], &context)?,
                        resolve_joint(&segment_a[1], &context)?,
                    ],
                    segment_b: [
                        resolve_joint(&segment_b[0], &context)?,
                        resolve_joint(&segment_b[1], &context)?,
                    ],
                    max_difference: *max_difference,
                    message: message.clone(),
                    apply_when: compile_phase(apply_when)?,
                }
            }
            RuleSpec::VerticalComparison { joint_a, joint_b, condition, tolerance, message, apply_when } => {
                let context = format!("vertical_comparison rule '{}'", message);
                Rule::VerticalComparison {
                    joint_a: resolve_joint(joint_a, &context)?,
                    joint_b: resolve_joint(joint_b, &context)?,
                    condition: *condition,
                    tolerance: *tolerance,
                    message: message.clone(),
                    apply_when: compile_phase(apply_when)?,
                }
            }
            RuleSpec::AngleOffset { base_angle, offset_angle, expected, message, apply_when } => {
                let context = format!("angle_offset rule '{}'", message);
                expected.validate(&context)?;
                Rule::AngleOffset {
                    base_angle: table.resolve(base_angle, &context)?,
                    offset_angle: table.resolve(offset_angle, &context)?,
                    expected: *expected,
                    message: message.clone(),
                    apply_when: compile_phase(apply_when)?,
                }
            }
            RuleSpec::Unknown => return Ok(None),
        };
        Ok(Some(rule))
    }

    pub fn message(&self) -> &str {
        match self {
            Rule::Zone { message, .. }
            | Rule::SegmentParallelism { message, .. }
            | Rule::VerticalComparison { message, .. }
            | Rule::AngleOffset { message, .. } => message,
        }
    }

    pub fn apply_when(&self) -> Option<MovementPhase> {
        match self {
            Rule::Zone { apply_when, .. }
            | Rule::SegmentParallelism { apply_when, .. }
            | Rule::VerticalComparison { apply_when, .. }
            | Rule::AngleOffset { apply_when, .. } => *apply_when,
        }
    }

    /// Human-readable description of what the rule measures
    pub fn subject(&self, angles: &[AngleDef]) -> String {
        let joint = |i: usize| landmark_name(i).unwrap_or("?");
        let angle = |i: usize| {
            let def = &angles[i];
            format!(
                "{} ({}, {}, {})",
                def.name,
                joint(def.joints[0]),
                joint(def.joints[1]),
                joint(def.joints[2])
            )
        };
        match self {
            Rule::Zone { angle: a, .. } => format!("angle {}", angle(*a)),
            Rule::SegmentParallelism { segment_a, segment_b, .. } => format!(
                "segments {}-{} and {}-{}",
                joint(segment_a[0]),
                joint(segment_a[1]),
                joint(segment_b[0]),
                joint(segment_b[1])
            ),
            Rule::VerticalComparison { joint_a, joint_b, .. } => {
                format!("joints {}, {}", joint(*joint_a), joint(*joint_b))
            }
            Rule::AngleOffset { base_angle, offset_angle, .. } => format!(
                "angles {} and {}",
                angles[*base_angle].name, angles[*offset_angle].name
            ),
        }
    }

    /// Check the rule against one frame.
    ///
    /// `None` when the rule passes or is skipped (phase gate closed, joints
    /// not visible enough, landmarks missing).
    pub fn evaluate(&self, view: &FrameView) -> Option<Violation<'_>> {
        if let Some(gate) = self.apply_when() {
            if gate != view.phase {
                return None;
            }
        }

        let severity = match self {
            Rule::Zone { angle, zones, .. } => {
                let (value, visibility) = view.angle(*angle)?;
                if visibility <= view.min_visibility || zones.green.contains(value) {
                    return None;
                }
                match &zones.yellow {
                    Some(yellow) if yellow.contains(value) => Severity::Warning,
                    _ => Severity::Critical,
                }
            }
            Rule::SegmentParallelism { segment_a, segment_b, max_difference, .. } => {
                let a = [view.resolve_joint(segment_a[0]), view.resolve_joint(segment_a[1])];
                let b = [view.resolve_joint(segment_b[0]), view.resolve_joint(segment_b[1])];
                if !view.joints_visible(&[a[0], a[1], b[0], b[1]]) {
                    return None;
                }
                let angle_a = segment_angle_horizontal(view.xy(a[0])?, view.xy(a[1])?);
                let angle_b = segment_angle_horizontal(view.xy(b[0])?, view.xy(b[1])?);
                if parallelism_difference(angle_a, angle_b) <= *max_difference {
                    return None;
                }
                Severity::Warning
            }
            Rule::VerticalComparison { joint_a, joint_b, condition, tolerance, .. } => {
                let a = view.resolve_joint(*joint_a);
                let b = view.resolve_joint(*joint_b);
                if !view.joints_visible(&[a, b]) {
                    return None;
                }
                let (ya, yb) = (view.xy(a)?.1, view.xy(b)?.1);
                if condition.holds(ya, yb, *tolerance) {
                    return None;
                }
                Severity::Warning
            }
            Rule::AngleOffset { base_angle, offset_angle, expected, .. } => {
                let (base, base_vis) = view.angle(*base_angle)?;
                let (offset, offset_vis) = view.angle(*offset_angle)?;
                if base_vis <= view.min_visibility || offset_vis <= view.min_visibility {
                    return None;
                }
                if expected.contains(base - offset) {
                    return None;
                }
                Severity::Warning
            }
        };

        Some(Violation {
            severity,
            message: self.message(),
        })
    }
}

/// First violated rule, in configured order
pub fn first_violation<'r>(rules: &'r [Rule], view: &FrameView) -> Option<Violation<'r>> {
    rules.iter().find_map(|rule| rule.evaluate(view))
}
