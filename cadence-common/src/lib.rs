//! # Cadence Common Library
//!
//! Shared code for the Cadence playback services and their clients:
//! - Wire types (PlaybackState snapshot, SpectrumFrame, tracks)
//! - Push-channel envelopes (SessionEvent outbound, SessionCommand inbound)
//! - Bootstrap configuration loading
//! - Injectable clock
//! - SSE framing helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::{
    PlaybackState, PlayerPhase, RepeatMode, SessionCommand, SessionEvent, SpectrumFrame, TrackId,
    TrackRef,
};
pub use time::{Clock, SystemClock};
