//! # Cadence Playback Session Coordinator (cadence-psc)
//!
//! Serialized playback session state machine with real-time state and
//! spectrum broadcasting.
//!
//! **Purpose:** Own current-track/position/volume/shuffle/repeat state for a
//! networked player, resolve shuffle and repeat sequencing, and push state
//! and spectrum events to any number of viewers without letting a slow
//! viewer delay playback control.
//!
//! **Architecture:** one `PlaybackSession` per player. Commands go through
//! a single async mutex in `PlaybackController`; `SpectrumSampler` ticks on
//! its own task; both publish through `Broadcaster`, which keeps a bounded
//! queue per subscriber. The audio engine is an injected `AudioEngine`.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod playback;
pub mod session;

pub use error::{Error, Result};
pub use session::{PlaybackSession, SessionOptions};
