//! Audio engine capability
//!
//! The coordinator never decodes or outputs audio itself. It drives an
//! `AudioEngine` through this narrow interface and treats every call as
//! fallible: a failure degrades the session to "control accepted, audio
//! silent" instead of rejecting the command.

mod silent;

pub use silent::SilentEngine;

use cadence_common::TrackRef;
use thiserror::Error;

/// Errors reported by an audio engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No engine attached, or the output device went away
    #[error("audio engine not available")]
    Unavailable,

    /// The engine rejected or failed the call
    #[error("audio engine call failed: {0}")]
    Failed(String),
}

/// Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Playback capability consumed by the controller and the spectrum sampler
///
/// Implementations must be cheap to call from inside the controller's
/// command lock: no call may block for longer than the engine needs to
/// accept the request.
pub trait AudioEngine: Send + Sync {
    fn load(&self, track: &TrackRef) -> EngineResult<()>;

    fn play(&self) -> EngineResult<()>;

    fn pause(&self) -> EngineResult<()>;

    fn stop(&self) -> EngineResult<()>;

    fn seek(&self, position_seconds: f64) -> EngineResult<()>;

    /// Volume on the 0-100 user scale
    fn set_volume(&self, level: u8) -> EngineResult<()>;

    /// Raw magnitudes of arbitrary length, or None when no analysis is available
    fn get_raw_spectrum(&self) -> Option<Vec<f32>>;
}
