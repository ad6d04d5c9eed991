//! Inbound push-channel requests and their replies
//!
//! Remote viewers may drive the session over the push channel instead of
//! plain HTTP requests. Each inbound message is one `SessionCommand`; the
//! coordinator answers with one `CommandReply`.

use serde::{Deserialize, Serialize};

use super::playback_types::{PlaybackState, TrackId, TrackRef};

/// Inbound request envelope, tagged by `type`
///
/// ```
/// use cadence_common::SessionCommand;
///
/// let cmd: SessionCommand = serde_json::from_str(r#"{"type":"set_volume","level":40}"#).unwrap();
/// assert_eq!(cmd, SessionCommand::SetVolume { level: 40 });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    Load { tracks: Vec<TrackRef> },
    Play,
    Pause,
    TogglePlay,
    Stop,
    Seek { position: f64 },
    SetVolume { level: i64 },
    ToggleShuffle,
    CycleRepeat,
    Next,
    Previous,
    PlayTrack { id: TrackId },
    /// Engine host: the current track played to its end
    TrackFinished,
    /// Engine host: playback progress in seconds
    ReportPosition { position: f64 },
    GetSnapshot,
    /// Re-send a full snapshot on this connection
    Resync,
    /// Client keepalive; answered with a heartbeat, never forwarded to the controller
    Heartbeat,
}

impl SessionCommand {
    /// Stable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::Load { .. } => "load",
            SessionCommand::Play => "play",
            SessionCommand::Pause => "pause",
            SessionCommand::TogglePlay => "toggle_play",
            SessionCommand::Stop => "stop",
            SessionCommand::Seek { .. } => "seek",
            SessionCommand::SetVolume { .. } => "set_volume",
            SessionCommand::ToggleShuffle => "toggle_shuffle",
            SessionCommand::CycleRepeat => "cycle_repeat",
            SessionCommand::Next => "next",
            SessionCommand::Previous => "previous",
            SessionCommand::PlayTrack { .. } => "play_track",
            SessionCommand::TrackFinished => "track_finished",
            SessionCommand::ReportPosition { .. } => "report_position",
            SessionCommand::GetSnapshot => "get_snapshot",
            SessionCommand::Resync => "resync",
            SessionCommand::Heartbeat => "heartbeat",
        }
    }
}

/// Reply to one inbound command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandReply {
    /// Command applied; carries the resulting snapshot
    CommandResult {
        command: String,
        state: PlaybackState,
    },
    /// Command rejected or payload malformed
    CommandError {
        command: Option<String>,
        error: String,
        message: String,
    },
}
