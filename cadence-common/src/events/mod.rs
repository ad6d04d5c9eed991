//! Event types for the Cadence push channel
//!
//! Provides the outbound `SessionEvent` envelope and the inbound
//! `SessionCommand` envelope shared by the coordinator and its viewers.

// Sub-modules (supporting types)
mod command_types;
mod playback_types;
mod spectrum_types;

pub use command_types::{CommandReply, SessionCommand};
pub use playback_types::{PlaybackState, PlayerPhase, RepeatMode, TrackId, TrackRef};
pub use spectrum_types::{FrameSource, SpectrumFrame};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outbound push-channel events
///
/// Serialized with an internal `type` tag, e.g.
/// `{"type":"state_update","state":{...},"timestamp":"..."}`.
///
/// State updates always carry the full snapshot so a viewer that missed
/// intermediate updates converges on the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Playback state changed (full snapshot)
    ///
    /// Triggers:
    /// - Viewers: replace local state wholesale
    StateUpdate {
        state: PlaybackState,
        timestamp: DateTime<Utc>,
    },

    /// New spectrum frame
    ///
    /// Lossy: under backpressure older frames are discarded.
    SpectrumUpdate { frame: SpectrumFrame },

    /// Keepalive sent on the heartbeat interval
    Heartbeat { timestamp: DateTime<Utc> },
}

impl SessionEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::StateUpdate { .. } => "state_update",
            SessionEvent::SpectrumUpdate { .. } => "spectrum_update",
            SessionEvent::Heartbeat { .. } => "heartbeat",
        }
    }

    pub fn is_spectrum(&self) -> bool {
        matches!(self, SessionEvent::SpectrumUpdate { .. })
    }

    pub fn is_state(&self) -> bool {
        matches!(self, SessionEvent::StateUpdate { .. })
    }

    /// Snapshot carried by a state update
    pub fn state(&self) -> Option<&PlaybackState> {
        match self {
            SessionEvent::StateUpdate { state, .. } => Some(state),
            _ => None,
        }
    }

    /// Frame carried by a spectrum update
    pub fn frame(&self) -> Option<&SpectrumFrame> {
        match self {
            SessionEvent::SpectrumUpdate { frame } => Some(frame),
            _ => None,
        }
    }
}
