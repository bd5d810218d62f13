//! Session statistics, fed once per completed repetition

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How often one feedback message failed a repetition
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTally {
    pub count: u32,
    /// 1-based indices of the repetitions it failed
    pub reps: Vec<u32>,
}

/// Invariant: `total_reps == ok_reps + invalid_reps`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_reps: u32,
    pub ok_reps: u32,
    pub invalid_reps: u32,
    pub errors: BTreeMap<String, ErrorTally>,
}

impl SessionStats {
    pub fn record(&mut self, ok: bool, errors: &BTreeSet<String>) {
        self.total_reps += 1;
        if ok {
            self.ok_reps += 1;
            return;
        }
        self.invalid_reps += 1;
        let rep = self.total_reps;
        for message in errors {
            let tally = self.errors.entry(message.clone()).or_default();
            tally.count += 1;
            tally.reps.push(rep);
        }
    }

    /// Percentage of valid repetitions, 0 when nothing was recorded
    pub fn success_rate(&self) -> f32 {
        if self.total_reps == 0 {
            return 0.0;
        }
        self.ok_reps as f32 * 100.0 / self.total_reps as f32
    }

    /// Messages by descending count, ties by message text
    pub fn ranked_errors(&self) -> Vec<(&str, &ErrorTally)> {
        let mut ranked: Vec<_> = self.errors.iter().map(|(m, t)| (m.as_str(), t)).collect();
        ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}
