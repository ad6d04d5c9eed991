//! Engine that accepts every control call and produces no audio
//!
//! Used when the coordinator runs without an output device attached
//! (headless deployments, development). Spectrum data is never available,
//! so viewers see the synthetic fallback frames.

use std::sync::Mutex;

use cadence_common::{TrackId, TrackRef};
use tracing::debug;

use super::{AudioEngine, EngineResult};

#[derive(Debug, Default)]
struct SilentState {
    track: Option<TrackId>,
    playing: bool,
    position_seconds: f64,
    volume: u8,
}

/// No-output engine that records what it was asked to do
#[derive(Debug, Default)]
pub struct SilentEngine {
    state: Mutex<SilentState>,
}

impl SilentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently loaded track, if any
    pub fn loaded_track(&self) -> Option<TrackId> {
        self.lock().track.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn position_seconds(&self) -> f64 {
        self.lock().position_seconds
    }

    pub fn volume(&self) -> u8 {
        self.lock().volume
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SilentState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AudioEngine for SilentEngine {
    fn load(&self, track: &TrackRef) -> EngineResult<()> {
        debug!("SilentEngine: load {}", track.id);
        let mut state = self.lock();
        state.track = Some(track.id.clone());
        state.playing = false;
        state.position_seconds = 0.0;
        Ok(())
    }

    fn play(&self) -> EngineResult<()> {
        self.lock().playing = true;
        Ok(())
    }

    fn pause(&self) -> EngineResult<()> {
        self.lock().playing = false;
        Ok(())
    }

    fn stop(&self) -> EngineResult<()> {
        let mut state = self.lock();
        state.playing = false;
        state.position_seconds = 0.0;
        Ok(())
    }

    fn seek(&self, position_seconds: f64) -> EngineResult<()> {
        self.lock().position_seconds = position_seconds;
        Ok(())
    }

    fn set_volume(&self, level: u8) -> EngineResult<()> {
        self.lock().volume = level;
        Ok(())
    }

    fn get_raw_spectrum(&self) -> Option<Vec<f32>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_engine_tracks_commands() {
        let engine = SilentEngine::new();
        engine.load(&TrackRef::new("a", 10.0)).unwrap();
        assert_eq!(engine.loaded_track(), Some(TrackId::from("a")));
        assert!(!engine.is_playing());

        engine.play().unwrap();
        assert!(engine.is_playing());
        engine.stop().unwrap();
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_silent_engine_has_no_spectrum() {
        let engine = SilentEngine::new();
        engine.play().unwrap();
        assert!(engine.get_raw_spectrum().is_none());
    }
}
