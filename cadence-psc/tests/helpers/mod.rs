//! Shared test helpers for cadence-psc integration tests
//!
//! - `MockEngine`: scripted audio engine with call log and failure injection
//! - Session builders with a fixed seed and a manual clock

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cadence_common::time::ManualClock;
use cadence_common::TrackRef;
use cadence_psc::config::{BroadcastConfig, SessionConfig};
use cadence_psc::engine::{AudioEngine, EngineError, EngineResult};
use cadence_psc::{PlaybackSession, SessionOptions};
use chrono::Utc;

/// Seed used by every helper-built session
pub const TEST_SEED: u64 = 0x5EED;

/// One recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(String),
    Play,
    Pause,
    Stop,
    Seek(f64),
    SetVolume(u8),
}

/// Audio engine double
///
/// Records every control call. While `failing` is set, every call is
/// recorded and then rejected.
#[derive(Debug, Default)]
pub struct MockEngine {
    calls: Mutex<Vec<EngineCall>>,
    failing: AtomicBool,
    spectrum: Mutex<Option<Vec<f32>>>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine that fails every call from the start
    pub fn failing() -> Arc<Self> {
        let engine = Self::new();
        engine.set_failing(true);
        engine
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw magnitudes returned by `get_raw_spectrum`
    pub fn set_spectrum(&self, raw: Option<Vec<f32>>) {
        *self.spectrum.lock().unwrap() = raw;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<EngineCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: EngineCall) -> EngineResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EngineError::Failed("injected failure".to_string()));
        }
        Ok(())
    }
}

impl AudioEngine for MockEngine {
    fn load(&self, track: &TrackRef) -> EngineResult<()> {
        self.record(EngineCall::Load(track.id.to_string()))
    }

    fn play(&self) -> EngineResult<()> {
        self.record(EngineCall::Play)
    }

    fn pause(&self) -> EngineResult<()> {
        self.record(EngineCall::Pause)
    }

    fn stop(&self) -> EngineResult<()> {
        self.record(EngineCall::Stop)
    }

    fn seek(&self, position_seconds: f64) -> EngineResult<()> {
        self.record(EngineCall::Seek(position_seconds))
    }

    fn set_volume(&self, level: u8) -> EngineResult<()> {
        self.record(EngineCall::SetVolume(level))
    }

    fn get_raw_spectrum(&self) -> Option<Vec<f32>> {
        self.spectrum.lock().unwrap().clone()
    }
}

/// `n` tracks named "1".."n", 180 seconds each
pub fn tracks(n: usize) -> Vec<TrackRef> {
    (1..=n).map(|i| TrackRef::new(i.to_string(), 180.0)).collect()
}

/// Options with a fixed seed, a manual clock and the given engine
pub fn options_with(engine: Arc<MockEngine>) -> SessionOptions {
    SessionOptions {
        engine: Some(engine),
        clock: Arc::new(ManualClock::new(Utc::now())),
        seed: Some(TEST_SEED),
        session: SessionConfig::default(),
        ..SessionOptions::default()
    }
}

/// Session driving a fresh `MockEngine`
pub fn test_session() -> (PlaybackSession, Arc<MockEngine>) {
    let engine = MockEngine::new();
    let session = PlaybackSession::new(options_with(Arc::clone(&engine)));
    (session, engine)
}

/// Session with small subscriber queues for backpressure tests
pub fn small_queue_session(queue_capacity: usize) -> (PlaybackSession, Arc<MockEngine>) {
    let engine = MockEngine::new();
    let mut options = options_with(Arc::clone(&engine));
    options.broadcast = BroadcastConfig {
        queue_capacity,
        ..BroadcastConfig::default()
    };
    (PlaybackSession::new(options), engine)
}

/// Session with `n` tracks already loaded
pub async fn loaded_session(n: usize) -> (PlaybackSession, Arc<MockEngine>) {
    let (session, engine) = test_session();
    session.load(tracks(n)).await.unwrap();
    (session, engine)
}
