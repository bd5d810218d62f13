//! Repetition counter - two-state machine on the main angle
//!
//! up --(angle < down_angle)--> down --(angle > up_angle)--> up (+1)
//!
//! The gap between the two thresholds is the hysteresis band that keeps
//! measurement noise from double counting.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::config::StateChange;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepState {
    #[default]
    Up,
    Down,
}

/// Result of one finished repetition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepOutcome {
    /// 1-based repetition number
    pub index: u32,
    pub ok: bool,
    pub errors: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepEvent {
    /// up -> down; quality tracking restarted
    Descended,
    /// down -> up; counter incremented
    Completed(RepOutcome),
}

#[derive(Clone, Debug)]
pub struct RepCounter {
    thresholds: StateChange,
    state: RepState,
    count: u32,
    quality: bool,
    errors: BTreeSet<String>,
}

impl RepCounter {
    pub fn new(thresholds: StateChange) -> Self {
        Self {
            thresholds,
            state: RepState::Up,
            count: 0,
            quality: true,
            errors: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    /// Completed repetitions. Never decreases short of `reset()`.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Quality of the repetition in progress
    pub fn current_quality(&self) -> bool {
        self.quality
    }

    pub fn current_errors(&self) -> &BTreeSet<String> {
        &self.errors
    }

    /// Feed the active main angle for this frame
    pub fn step(&mut self, main_angle: f32) -> Option<RepEvent> {
        match self.state {
            RepState::Up if main_angle < self.thresholds.down_angle => {
                self.state = RepState::Down;
                self.quality = true;
                self.errors.clear();
                debug!("Rep {} descending at {:.1}°", self.count + 1, main_angle);
                Some(RepEvent::Descended)
            }
            RepState::Down if main_angle > self.thresholds.up_angle => {
                self.state = RepState::Up;
                self.count += 1;
                let outcome = RepOutcome {
                    index: self.count,
                    ok: self.quality,
                    errors: std::mem::take(&mut self.errors),
                };
                self.quality = true;
                info!(
                    "Rep {} completed ({})",
                    outcome.index,
                    if outcome.ok { "ok" } else { "invalid" }
                );
                Some(RepEvent::Completed(outcome))
            }
            _ => None,
        }
    }

    /// Flag the repetition in progress as failed because of `message`
    pub fn mark_failed(&mut self, message: &str) {
        self.quality = false;
        if !self.errors.contains(message) {
            self.errors.insert(message.to_string());
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.thresholds);
    }
}
