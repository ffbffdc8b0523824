//! Error types for mflix

use thiserror::Error;

/// Main error type for mflix
#[derive(Error, Debug)]
pub enum MflixError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Missing dependency: {0}. Please install it.")]
    MissingDependency(String),

    #[error("No playable stream for \"{0}\"")]
    NoStream(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MflixError>;

/// Failure of a durable key/value backend.
///
/// Stores never return these; they are handed to a
/// [`FailureSink`](crate::storage::document::FailureSink) and swallowed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
