//! Per-frame CSV log
//!
//! One row per analysed frame. Angle columns can differ between exercises
//! within a session, so the header is the sorted union of every row's keys.

use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::analysis::FrameAnalysis;
use crate::error::ReportError;

type Row = BTreeMap<String, String>;

#[derive(Clone, Debug, Default)]
pub struct FrameLog {
    rows: Vec<Row>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record(&mut self, now: Duration, exercise: &str, frame: &FrameAnalysis) {
        let mut row = Row::new();
        row.insert("timestamp_ms".into(), now.as_millis().to_string());
        row.insert("exercise".into(), exercise.to_string());
        row.insert("severity".into(), frame.severity.as_str().to_string());
        row.insert("feedback".into(), frame.feedback.clone());
        for (name, value) in &frame.angles {
            row.insert(name.clone(), format!("{:.2}", value));
        }
        self.rows.push(row);
    }

    fn header(&self) -> Vec<&str> {
        let keys: BTreeSet<&str> = self
            .rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        keys.into_iter().collect()
    }

    /// Write every row as CSV; cells a row lacks stay empty
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), ReportError> {
        let header = self.header();
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&header)?;
        for row in &self.rows {
            csv.write_record(
                header
                    .iter()
                    .map(|key| row.get(*key).map_or("", String::as_str)),
            )?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Returns `false` without touching the filesystem when nothing was logged
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<bool, ReportError> {
        let path = path.as_ref();
        if self.rows.is_empty() {
            warn!("Frame log is empty, not writing {}", path.display());
            return Ok(false);
        }
        let file = std::fs::File::create(path)?;
        self.write_to(file)?;
        info!("Frame log ({} rows) written to {}", self.rows.len(), path.display());
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MovementPhase, Severity};

    fn frame(angles: &[(&str, f32)], feedback: &str, severity: Severity) -> FrameAnalysis {
        FrameAnalysis {
            angles: angles.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            feedback: feedback.to_string(),
            severity,
            rep_count: 0,
            movement_phase: MovementPhase::Up,
            active_side: None,
            completed_rep: None,
        }
    }

    #[test]
    fn test_header_is_sorted_union() {
        let mut log = FrameLog::new();
        log.record(Duration::from_millis(0), "Squat", &frame(&[("right_knee", 170.0)], "Correct posture!", Severity::Ok));
        log.record(
            Duration::from_millis(33),
            "Push-up",
            &frame(&[("right_elbow", 91.256)], "Keep your hips in line", Severity::Warning),
        );

        let mut out = Vec::new();
        log.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "exercise,feedback,right_elbow,right_knee,severity,timestamp_ms");
        assert_eq!(lines[1], "Squat,Correct posture!,,170.00,ok,0");
        assert_eq!(lines[2], "Push-up,Keep your hips in line,91.26,,warning,33");
    }

    #[test]
    fn test_empty_log_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.csv");
        assert!(!FrameLog::new().write_csv(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_csv_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.csv");
        let mut log = FrameLog::new();
        log.record(Duration::from_secs(1), "Squat", &frame(&[], "No person detected.", Severity::Critical));
        assert!(log.write_csv(&path).unwrap());

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "Squat");
        assert_eq!(&rows[0][3], "1000");
    }
}
