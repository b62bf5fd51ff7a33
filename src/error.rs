//! Error types for sleepcalc

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid stage configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid sleep goal: {0}")]
    InvalidGoal(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Failed to parse sleep entry: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
