//! Session reporter - accumulates repetition outcomes, renders the summary
//!
//! `summarize()` is a pure function of the recorded state, so calling it
//! repeatedly gives the same text.

use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::stats::SessionStats;
use crate::analysis::CompiledExercise;
use crate::error::ReportError;

#[derive(Clone, Debug)]
pub struct SessionReporter {
    exercise: String,
    /// message -> joints/angle the rule looks at
    subjects: BTreeMap<String, String>,
    stats: SessionStats,
}

impl SessionReporter {
    pub fn new(exercise: &CompiledExercise) -> Self {
        Self {
            exercise: exercise.name.clone(),
            subjects: exercise.message_subjects(),
            stats: SessionStats::default(),
        }
    }

    pub fn exercise(&self) -> &str {
        &self.exercise
    }

    pub fn record_repetition(&mut self, ok: bool, errors: &BTreeSet<String>) {
        self.stats.record(ok, errors);
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn summarize(&self) -> String {
        let stats = &self.stats;
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out, "Session summary: {}", self.exercise);
        let _ = writeln!(out, "Total repetitions: {}", stats.total_reps);
        let _ = writeln!(out, "Valid repetitions: {}", stats.ok_reps);
        let _ = writeln!(out, "Invalid repetitions: {}", stats.invalid_reps);
        let _ = writeln!(out, "Success rate: {:.1}%", stats.success_rate());

        let ranked = stats.ranked_errors();
        if ranked.is_empty() {
            let _ = writeln!(out, "No posture errors recorded.");
            return out;
        }

        let _ = writeln!(out, "Most frequent errors:");
        for (position, (message, tally)) in ranked.into_iter().enumerate() {
            let reps = tally
                .reps
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(
                out,
                "{}. {} - {}x (reps {})",
                position + 1,
                message,
                tally.count,
                reps
            );
            match self.subjects.get(message) {
                Some(subject) => {
                    let _ = writeln!(out, " [{}]", subject);
                }
                None => out.push('\n'),
            }
        }
        out
    }

    pub fn write_summary(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        fs::write(path, self.summarize())?;
        info!("Session summary written to {}", path.display());
        Ok(())
    }

    pub fn write_stats_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(&self.stats)?)?;
        info!("Session stats written to {}", path.display());
        Ok(())
    }

    /// Write `session_<stamp>.txt` into `dir`, creating it if needed
    pub fn save_to_dir(&self, dir: impl AsRef<Path>, stamp: &str) -> Result<PathBuf, ReportError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("session_{}.txt", stamp));
        self.write_summary(&path)?;
        Ok(path)
    }
}
