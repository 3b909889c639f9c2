//! Shared error type for the film workspace

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilmCommonError>;

#[derive(Error, Debug)]
pub enum FilmCommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),
}
