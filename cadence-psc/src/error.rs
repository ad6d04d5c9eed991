//! Error types for cadence-psc
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Out-of-range volume and seek values are clamped by the controller and
//! never show up here.

use thiserror::Error;

use crate::engine::EngineError;

/// Main error type for the playback session coordinator
#[derive(Error, Debug)]
pub enum Error {
    /// Playback command issued with no track loaded
    #[error("No active track: load a play order first")]
    NoActiveTrack,

    /// Referenced track id is not in the current play order
    #[error("Track not found in play order: {0}")]
    TrackNotFound(String),

    /// Audio engine absent or repeatedly failing; control was still applied
    #[error("Audio engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Malformed command payload
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the shared library
    #[error(transparent)]
    Common(#[from] cadence_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable kind for API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NoActiveTrack => "no_active_track",
            Error::TrackNotFound(_) => "not_found",
            Error::EngineUnavailable(_) => "engine_unavailable",
            Error::InvalidInput(_) => "invalid_input",
            Error::Config(_) => "config",
            Error::Http(_) => "http",
            Error::Io(_) => "io",
            Error::Common(_) => "common",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Error::EngineUnavailable(e.to_string())
    }
}

/// Convenience Result type using cadence-psc Error
pub type Result<T> = std::result::Result<T, Error>;
