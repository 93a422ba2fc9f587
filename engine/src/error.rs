//! Structured error types for the arena engine.
//!
//! Only integration and configuration problems surface as errors. Scoring
//! failures are contained inside the engine and never reach the caller.

use std::path::PathBuf;

/// Errors raised by the engine to its caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Caller passed a cluster id that is not one of the six fixed clusters.
    #[error("Unknown cluster id: {0:?}")]
    InvalidClusterId(String),

    /// Caller-supplied state holds a confidence above 100.
    #[error("Confidence {value} for {cluster} is outside 0-100")]
    ConfidenceOutOfRange { cluster: String, value: u8 },

    /// Caller passed a trigger tag the detector does not know.
    #[error("Unknown trigger tag: {0:?}")]
    InvalidTrigger(String),

    /// A catalog pattern failed to compile.
    #[error("Invalid pattern for point {point}: {source}")]
    InvalidPattern {
        point: String,
        source: regex::Error,
    },

    /// Scoring a message failed. Contained by the engine; only seen by
    /// callers that invoke a scorer directly.
    #[error("Analysis failed for {cluster}: {reason}")]
    AnalysisFailure { cluster: String, reason: String },

    /// Configuration value out of range or otherwise unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failed to read a configuration or catalog file.
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
