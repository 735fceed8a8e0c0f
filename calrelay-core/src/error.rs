//! Error types for calrelay.

use thiserror::Error;

/// Errors that can occur while relaying calendar events.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event source error: {0}")]
    Source(String),

    #[error("Notifier error: {0}")]
    Notify(String),

    #[error("Replica target error: {0}")]
    Replica(String),

    #[error("Dedup store error: {0}")]
    Store(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Time parse error: {0}")]
    TimeParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for RelayError {
    fn from(e: rusqlite::Error) -> Self {
        RelayError::Store(e.to_string())
    }
}

/// Result type alias for calrelay operations.
pub type RelayResult<T> = Result<T, RelayError>;
