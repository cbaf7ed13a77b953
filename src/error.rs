// Error types for the translator
//
// CommandError is local to a single input line and never stops the process.
// RuntimeError is fatal and travels up to main.

use std::path::PathBuf;

/// A rejected input line
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unsupported command \"{0}\"")]
    Unsupported(String),

    #[error("invalid velocity {0} (expected 0..=1)")]
    InvalidVelocity(f32),

    #[error("invalid direction {0} (expected -180..=180)")]
    InvalidDirection(f32),

    #[error("line longer than {0} bytes")]
    TooLong(usize),
}

/// Configuration could not be loaded or is unusable
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Unrecoverable failure of the translator
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("input stream closed")]
    InputClosed,

    #[error("input error: {0}")]
    Input(std::io::Error),

    #[error("output error: {0}")]
    Output(std::io::Error),

    #[error("signal handler error: {0}")]
    Signal(std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
