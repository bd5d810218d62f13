//! Feedback text and severity, plus the transient rep-completed window
//!
//! While "Repetition N completed!" is on screen it wins over the posture
//! verdict; once it expires the verdict shows again.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const START_MESSAGE: &str = "Start the exercise.";
pub const NO_PERSON_MESSAGE: &str = "No person detected.";
pub const POSTURE_OK_MESSAGE: &str = "Correct posture!";
pub const UNCLEAR_SIDE_MESSAGE: &str = "Position unclear. Turn sideways to the camera.";

/// Ordered from least to most severe
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Ok,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Ok => "ok",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Warning or worse: taints the repetition in progress
    pub fn is_fault(self) -> bool {
        self >= Severity::Warning
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
    pub severity: Severity,
}

impl Feedback {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }

    pub fn start() -> Self {
        Self::new(START_MESSAGE, Severity::Info)
    }

    pub fn no_person() -> Self {
        Self::new(NO_PERSON_MESSAGE, Severity::Critical)
    }

    pub fn posture_ok() -> Self {
        Self::new(POSTURE_OK_MESSAGE, Severity::Ok)
    }

    pub fn unclear_side() -> Self {
        Self::new(UNCLEAR_SIDE_MESSAGE, Severity::Critical)
    }

    pub fn rep_completed(count: u32) -> Self {
        Self::new(format!("Repetition {} completed!", count), Severity::Ok)
    }
}

/// Chooses between the transient rep message and the posture verdict
#[derive(Clone, Debug)]
pub struct FeedbackArbiter {
    window: Duration,
    transient: Option<(Feedback, Duration)>,
}

impl FeedbackArbiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            transient: None,
        }
    }

    /// Start the rep-completed window at `now`
    pub fn announce_rep(&mut self, count: u32, now: Duration) {
        self.transient = Some((Feedback::rep_completed(count), now + self.window));
    }

    pub fn is_transient_active(&self, now: Duration) -> bool {
        matches!(&self.transient, Some((_, expiry)) if now < *expiry)
    }

    /// Feedback to display this frame
    pub fn resolve(&mut self, verdict: Feedback, now: Duration) -> Feedback {
        match &self.transient {
            Some((message, expiry)) if now < *expiry => message.clone(),
            Some(_) => {
                self.transient = None;
                verdict
            }
            None => verdict,
        }
    }

    pub fn reset(&mut self) {
        self.transient = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning.is_fault());
        assert!(Severity::Critical.is_fault());
        assert!(!Severity::Ok.is_fault());
        assert!(!Severity::Info.is_fault());
    }

    #[test]
    fn test_transient_window() {
        let mut arbiter = FeedbackArbiter::new(Duration::from_secs(2));
        let warning = Feedback::new("Keep your back straight", Severity::Warning);

        assert_eq!(arbiter.resolve(warning.clone(), Duration::ZERO), warning);

        arbiter.announce_rep(3, Duration::from_millis(1000));
        let shown = arbiter.resolve(warning.clone(), Duration::from_millis(2500));
        assert_eq!(shown.text, "Repetition 3 completed!");
        assert_eq!(shown.severity, Severity::Ok);
        assert!(arbiter.is_transient_active(Duration::from_millis(2999)));

        assert_eq!(arbiter.resolve(warning.clone(), Duration::from_millis(3000)), warning);
        assert!(!arbiter.is_transient_active(Duration::from_millis(3000)));
    }

    #[test]
    fn test_new_rep_restarts_window() {
        let mut arbiter = FeedbackArbiter::new(Duration::from_secs(2));
        arbiter.announce_rep(1, Duration::from_secs(0));
        arbiter.announce_rep(2, Duration::from_secs(1));
        let shown = arbiter.resolve(Feedback::posture_ok(), Duration::from_millis(2500));
        assert_eq!(shown.text, "Repetition 2 completed!");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
    }
}
