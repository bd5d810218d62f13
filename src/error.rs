use thiserror::Error;

/// Errors raised while turning an exercise config into a runnable analyzer.
///
/// Construction fails fast on the first problem; nothing is partially built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown joint '{joint}' in {context}")]
    UnknownJoint { joint: String, context: String },

    #[error("Unknown angle '{angle}' referenced by {context}")]
    UnknownAngle { angle: String, context: String },

    #[error("Unknown movement phase '{0}'")]
    UnknownPhase(String),

    #[error("Main angle '{0}' is not among the angle definitions")]
    MissingMainAngle(String),

    #[error("Invalid state change thresholds: down_angle {down} must be below up_angle {up}")]
    InvalidThresholds { up: f32, down: f32 },

    #[error("Invalid range in {context}: min {min} is above max {max}")]
    InvalidRange { context: String, min: f32, max: f32 },

    #[error("Invalid {setting}: {value} is not a usable duration in seconds")]
    InvalidDuration { setting: String, value: f32 },

    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while persisting session reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
