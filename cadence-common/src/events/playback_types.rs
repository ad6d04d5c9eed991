//! Playback-related type definitions
//!
//! Track references, repeat/phase enumerations and the authoritative
//! `PlaybackState` snapshot pushed to every viewer.

use serde::{Deserialize, Serialize};

/// Opaque track identifier
///
/// Serialized as a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A track as loaded into a session: identifier plus duration.
///
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: TrackId,
    /// Track length in seconds
    pub duration_seconds: f64,
}

impl TrackRef {
    pub fn new(id: impl Into<TrackId>, duration_seconds: f64) -> Self {
        Self {
            id: id.into(),
            duration_seconds,
        }
    }
}

/// Repeat mode enumeration
///
/// Cycles `none -> one -> all -> none`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    None,
    One,
    All,
}

impl RepeatMode {
    /// Next mode in the repeat cycle
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::None,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatMode::None => write!(f, "none"),
            RepeatMode::One => write!(f, "one"),
            RepeatMode::All => write!(f, "all"),
        }
    }
}

/// Controller lifecycle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerPhase {
    /// No play order loaded
    #[default]
    Idle,
    /// Track selected, not playing
    Loaded,
    Playing,
    Paused,
    /// End of play order reached with repeat off
    Stopped,
}

impl std::fmt::Display for PlayerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerPhase::Idle => write!(f, "idle"),
            PlayerPhase::Loaded => write!(f, "loaded"),
            PlayerPhase::Playing => write!(f, "playing"),
            PlayerPhase::Paused => write!(f, "paused"),
            PlayerPhase::Stopped => write!(f, "stopped"),
        }
    }
}

/// Authoritative playback snapshot
///
/// Invariants maintained by the controller:
/// - `0 <= position_seconds <= duration_seconds`
/// - `volume <= 100`
/// - `current_track_id`, if present, is a member of the loaded play order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_track_id: Option<TrackId>,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    /// 0-100 user-facing scale
    pub volume: u8,
    pub is_playing: bool,
    pub shuffle_enabled: bool,
    pub repeat_mode: RepeatMode,
    /// Index of the current track within the base play order
    pub sequence_index: Option<usize>,
    pub phase: PlayerPhase,
    /// Set when the last audio engine call failed; control was still applied
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub engine_error: Option<String>,
    /// Monotonic snapshot counter, incremented on every published change
    pub revision: u64,
}

impl PlaybackState {
    /// Fresh session state: no track, shuffle off, repeat none
    pub fn initial(volume: u8) -> Self {
        Self {
            current_track_id: None,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            volume: volume.min(100),
            is_playing: false,
            shuffle_enabled: false,
            repeat_mode: RepeatMode::None,
            sequence_index: None,
            phase: PlayerPhase::Idle,
            engine_error: None,
            revision: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_mode_cycle() {
        assert_eq!(RepeatMode::None.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::None);
    }

    #[test]
    fn test_repeat_mode_serializes_lowercase() {
        let json = serde_json::to_string(&RepeatMode::All).unwrap();
        assert_eq!(json, "\"all\"");
        let parsed: RepeatMode = serde_json::from_str("\"one\"").unwrap();
        assert_eq!(parsed, RepeatMode::One);
    }

    #[test]
    fn test_track_id_is_transparent() {
        let track = TrackRef::new("42", 180.0);
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["duration_seconds"], 180.0);
    }

    #[test]
    fn test_initial_state_clamps_volume() {
        let state = PlaybackState::initial(250);
        assert_eq!(state.volume, 100);
        assert_eq!(state.phase, PlayerPhase::Idle);
        assert!(state.current_track_id.is_none());
        assert!(!state.shuffle_enabled);
        assert_eq!(state.repeat_mode, RepeatMode::None);
    }

    #[test]
    fn test_engine_error_omitted_when_absent() {
        let json = serde_json::to_value(PlaybackState::initial(70)).unwrap();
        assert!(json.get("engine_error").is_none());
        assert_eq!(json["phase"], "idle");
    }
}
