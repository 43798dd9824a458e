//! Error types for DroneWatch.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Rejected at the gateway before any envelope exists.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Handler error in {agent}: {reason}")]
    Handler { agent: String, reason: String },

    #[error("Web error: {0}")]
    Web(String),

    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}
