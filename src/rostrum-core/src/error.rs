//! Error types for the debate engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown debate format: {0}")]
    UnknownFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Voice error: {0}")]
    Voice(String),

    #[error("{0} is not available on this device")]
    CapabilityUnavailable(&'static str),
}

pub type Result<T> = std::result::Result<T, DebateError>;
