//! Playback controller (session state machine)
//!
//! Owns the authoritative `PlaybackState`, the play order and the shuffle
//! sequencer. Every command runs under one async mutex: validation, state
//! mutation, the engine call and the snapshot publish all complete before
//! the next command starts.
//!
//! # Phases
//!
//! ```text
//! Idle --load--> Loaded --play--> Playing <--pause/play--> Paused
//!                  ^                 |
//!                  +------stop-------+        next at end, repeat off
//!                                    +----------------------------> Stopped
//! ```
//!
//! # Engine failures
//!
//! A failed engine call never rolls state back: the session reflects user
//! intent and the snapshot carries `engine_error`. Once
//! `engine_failure_threshold` consecutive calls have failed, commands that
//! reach the engine also return `Error::EngineUnavailable` (after applying).

use std::sync::Arc;

use cadence_common::{Clock, PlaybackState, PlayerPhase, TrackId, TrackRef};
use rand::rngs::StdRng;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::repeat::{self, NextOutcome, PreviousOutcome, Target, Traversal};
use super::shuffle::ShuffleSequencer;
use crate::broadcast::Broadcaster;
use crate::config::SessionConfig;
use crate::engine::{AudioEngine, EngineError, EngineResult};
use crate::error::{Error, Result};

/// Upper bound of the volume scale
pub const MAX_VOLUME: u8 = 100;

/// Engine outcome of one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineOutcome {
    /// Command did not touch the engine
    Untouched,
    Ok,
    Failed,
}

struct ControllerState {
    state: PlaybackState,
    order: Vec<TrackRef>,
    ids: Vec<TrackId>,
    shuffle: ShuffleSequencer,
    rng: StdRng,
    engine_failures: u32,
}

impl ControllerState {
    fn require_track(&self) -> Result<()> {
        if self.state.current_track_id.is_none() || self.order.is_empty() {
            return Err(Error::NoActiveTrack);
        }
        Ok(())
    }

    fn current_track(&self) -> Option<&TrackRef> {
        self.state.sequence_index.and_then(|i| self.order.get(i))
    }

    /// Make `target` the current track, positioned at its start
    fn select(&mut self, target: &Target) {
        let duration = self.order.get(target.index).map_or(0.0, |t| t.duration_seconds);
        self.state.current_track_id = Some(target.id.clone());
        self.state.sequence_index = Some(target.index);
        self.state.duration_seconds = duration;
        self.state.position_seconds = 0.0;
    }

    fn set_playing(&mut self, playing: bool, phase: PlayerPhase) {
        self.state.is_playing = playing;
        self.state.phase = phase;
    }
}

/// Serialized playback state machine for one session
pub struct PlaybackController {
    inner: Mutex<ControllerState>,
    engine: Option<Arc<dyn AudioEngine>>,
    clock: Arc<dyn Clock>,
    broadcaster: Broadcaster,
    snapshot_tx: watch::Sender<PlaybackState>,
    failure_threshold: u32,
}

impl PlaybackController {
    /// Create a controller in `Idle`
    ///
    /// `broadcaster` should have been seeded with the same initial snapshot
    /// (`PlaybackState::initial(config.default_volume)`).
    pub fn new(
        config: &SessionConfig,
        engine: Option<Arc<dyn AudioEngine>>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
        broadcaster: Broadcaster,
    ) -> Self {
        let initial = PlaybackState::initial(config.default_volume);
        let (snapshot_tx, _) = watch::channel(initial.clone());

        if engine.is_none() {
            warn!("Playback controller running without an audio engine");
        }

        Self {
            inner: Mutex::new(ControllerState {
                state: initial,
                order: Vec::new(),
                ids: Vec::new(),
                shuffle: ShuffleSequencer::new(config.history_depth),
                rng,
                engine_failures: 0,
            }),
            engine,
            clock,
            broadcaster,
            snapshot_tx,
            failure_threshold: config.engine_failure_threshold.max(1),
        }
    }

    /// Latest committed snapshot (never waits for a running command)
    ///
    /// Read from the broadcaster, the same copy a new subscriber is primed with.
    pub fn snapshot(&self) -> PlaybackState {
        self.broadcaster.latest_state()
    }

    /// Watch channel following every committed snapshot
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.snapshot_tx.subscribe()
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Consecutive failed engine calls
    pub async fn engine_failures(&self) -> u32 {
        self.inner.lock().await.engine_failures
    }

    /// Replace the play order and select its first track
    ///
    /// Rejects an empty order, duplicate ids and non-finite or negative
    /// durations. Shuffle and repeat settings carry over; an enabled
    /// shuffle is rebuilt against the new order.
    pub async fn load(&self, tracks: Vec<TrackRef>) -> Result<PlaybackState> {
        validate_order(&tracks)?;

        let mut st = self.inner.lock().await;
        st.ids = tracks.iter().map(|t| t.id.clone()).collect();
        st.order = tracks;

        let first = Target {
            index: 0,
            id: st.ids[0].clone(),
        };
        st.select(&first);
        st.set_playing(false, PlayerPhase::Loaded);

        if st.state.shuffle_enabled {
            let ControllerState { shuffle, ids, rng, .. } = &mut *st;
            shuffle.enable(ids, Some(&first.id), rng);
        }

        info!("Loaded play order of {} tracks, current {}", st.order.len(), first.id);

        let track = st.order[0].clone();
        let outcome = self.call_engine(&mut st, |e| e.load(&track));
        self.commit(&mut st, outcome)
    }

    pub async fn play(&self) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;
        self.play_locked(&mut st)
    }

    pub async fn pause(&self) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;
        self.pause_locked(&mut st)
    }

    /// Play when paused or stopped, pause when playing
    pub async fn toggle_play(&self) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;
        if st.state.is_playing {
            self.pause_locked(&mut st)
        } else {
            self.play_locked(&mut st)
        }
    }

    /// Stop playback, rewind to 0 and return to `Loaded`
    pub async fn stop(&self) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;
        st.require_track()?;

        st.state.position_seconds = 0.0;
        st.set_playing(false, PlayerPhase::Loaded);
        debug!("Playback: stop");

        let outcome = self.call_engine(&mut st, |e| e.stop());
        self.commit(&mut st, outcome)
    }

    /// Seek within the current track; out-of-range positions are clamped
    pub async fn seek(&self, position: f64) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;
        st.require_track()?;

        let clamped = clamp_position(position, st.state.duration_seconds);
        st.state.position_seconds = clamped;
        if st.state.phase == PlayerPhase::Stopped {
            st.state.phase = PlayerPhase::Loaded;
        }
        debug!("Playback: seek {} -> {}", position, clamped);

        let outcome = self.call_engine(&mut st, |e| e.seek(clamped));
        self.commit(&mut st, outcome)
    }

    /// Progress report from the engine host while a track plays
    ///
    /// Clamped into `[0, duration]`. Ignored (nothing published) unless
    /// the session is `Playing`; the engine is not called.
    pub async fn report_position(&self, position: f64) -> Result<PlaybackState> {
        if !position.is_finite() {
            return Err(Error::InvalidInput(format!("position {} is not finite", position)));
        }

        let mut st = self.inner.lock().await;
        if st.state.phase != PlayerPhase::Playing {
            return Ok(st.state.clone());
        }

        st.state.position_seconds = clamp_position(position, st.state.duration_seconds);
        self.commit(&mut st, EngineOutcome::Untouched)
    }

    /// Set volume on the 0-100 scale; out-of-range levels are clamped
    ///
    /// Allowed without a loaded track.
    pub async fn set_volume(&self, level: i64) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;

        let clamped = level.clamp(0, i64::from(MAX_VOLUME)) as u8;
        st.state.volume = clamped;
        debug!("Playback: volume {} -> {}", level, clamped);

        let outcome = self.call_engine(&mut st, |e| e.set_volume(clamped));
        self.commit(&mut st, outcome)
    }

    /// Enable or disable shuffle; the current track is unchanged
    pub async fn toggle_shuffle(&self) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;

        let enabled = !st.state.shuffle_enabled;
        st.state.shuffle_enabled = enabled;
        if enabled {
            let ControllerState {
                state,
                shuffle,
                ids,
                rng,
                ..
            } = &mut *st;
            shuffle.enable(ids, state.current_track_id.as_ref(), rng);
        } else {
            st.shuffle.disable();
        }
        info!("Shuffle {}", if enabled { "enabled" } else { "disabled" });

        self.commit(&mut st, EngineOutcome::Untouched)
    }

    /// Advance repeat mode `none -> one -> all -> none`
    pub async fn cycle_repeat(&self) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;

        st.state.repeat_mode = st.state.repeat_mode.cycle();
        info!("Repeat mode: {}", st.state.repeat_mode);

        self.commit(&mut st, EngineOutcome::Untouched)
    }

    /// Skip forward per the repeat policy
    pub async fn next(&self) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;
        st.require_track()?;

        let outcome = {
            let ControllerState {
                state,
                ids,
                shuffle,
                rng,
                ..
            } = &mut *st;
            let traversal = if state.shuffle_enabled {
                Traversal::Shuffled {
                    sequencer: shuffle,
                    rng,
                }
            } else {
                Traversal::Sequential
            };
            repeat::resolve_next(state.sequence_index, ids, traversal, state.repeat_mode)
        };

        match outcome {
            NextOutcome::SameTrack => {
                debug!("Next: repeating current track");
                st.state.position_seconds = 0.0;
                st.set_playing(true, PlayerPhase::Playing);
                let result = self.call_engine(&mut st, |e| {
                    e.seek(0.0)?;
                    e.play()
                });
                self.commit(&mut st, result)
            }
            NextOutcome::Advance(target) => {
                debug!("Next: advancing to {}", target.id);
                self.start_target(&mut st, &target)
            }
            NextOutcome::Stop => {
                info!("End of play order reached, stopping");
                st.state.position_seconds = st.state.duration_seconds;
                st.set_playing(false, PlayerPhase::Stopped);
                let result = self.call_engine(&mut st, |e| e.stop());
                self.commit(&mut st, result)
            }
        }
    }

    /// Natural end of the current track; resolves exactly like `next()`
    pub async fn track_finished(&self) -> Result<PlaybackState> {
        debug!("Track finished");
        self.next().await
    }

    /// Step back through shuffle history or the base order
    ///
    /// At the start of the session this is a no-op: nothing is published
    /// and the current snapshot is returned.
    pub async fn previous(&self) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;
        st.require_track()?;

        let outcome = {
            let ControllerState {
                state,
                ids,
                shuffle,
                rng,
                ..
            } = &mut *st;
            let traversal = if state.shuffle_enabled {
                Traversal::Shuffled {
                    sequencer: shuffle,
                    rng,
                }
            } else {
                Traversal::Sequential
            };
            repeat::resolve_previous(state.sequence_index, ids, traversal)
        };

        match outcome {
            PreviousOutcome::Retreat(target) => {
                debug!("Previous: back to {}", target.id);
                self.start_target(&mut st, &target)
            }
            PreviousOutcome::NoOp => {
                debug!("Previous: already at start");
                Ok(st.state.clone())
            }
        }
    }

    /// Jump directly to a track of the current play order
    pub async fn play_track(&self, id: TrackId) -> Result<PlaybackState> {
        let mut st = self.inner.lock().await;
        st.require_track()?;

        let index = st
            .ids
            .iter()
            .position(|t| *t == id)
            .ok_or_else(|| Error::TrackNotFound(id.to_string()))?;

        if st.state.shuffle_enabled {
            st.shuffle.record_jump(id.clone());
        }

        info!("Jumping to track {}", id);
        self.start_target(&mut st, &Target { index, id })
    }

    fn play_locked(&self, st: &mut ControllerState) -> Result<PlaybackState> {
        st.require_track()?;

        let restart = st.state.phase == PlayerPhase::Stopped;
        if restart {
            st.state.position_seconds = 0.0;
        }
        st.set_playing(true, PlayerPhase::Playing);
        debug!("Playback: play (restart: {})", restart);

        let outcome = self.call_engine(st, |e| {
            if restart {
                e.seek(0.0)?;
            }
            e.play()
        });
        self.commit(st, outcome)
    }

    fn pause_locked(&self, st: &mut ControllerState) -> Result<PlaybackState> {
        st.require_track()?;

        if st.state.is_playing {
            st.set_playing(false, PlayerPhase::Paused);
        }
        debug!("Playback: pause");

        let outcome = self.call_engine(st, |e| e.pause());
        self.commit(st, outcome)
    }

    /// Select `target` and start it from the beginning
    fn start_target(&self, st: &mut ControllerState, target: &Target) -> Result<PlaybackState> {
        st.select(target);
        st.set_playing(true, PlayerPhase::Playing);

        let track = st.current_track().cloned();
        let outcome = self.call_engine(st, |e| match &track {
            Some(track) => {
                e.load(track)?;
                e.play()
            }
            None => Err(EngineError::Failed("no track selected".to_string())),
        });
        self.commit(st, outcome)
    }

    /// Run `f` against the engine and record the outcome on the snapshot
    fn call_engine<F>(&self, st: &mut ControllerState, f: F) -> EngineOutcome
    where
        F: FnOnce(&dyn AudioEngine) -> EngineResult<()>,
    {
        let result = match &self.engine {
            Some(engine) => f(engine.as_ref()),
            None => Err(EngineError::Unavailable),
        };

        match result {
            Ok(()) => {
                if st.engine_failures > 0 {
                    info!("Audio engine recovered after {} failures", st.engine_failures);
                }
                st.engine_failures = 0;
                st.state.engine_error = None;
                EngineOutcome::Ok
            }
            Err(e) => {
                st.engine_failures = st.engine_failures.saturating_add(1);
                warn!("Audio engine call failed ({} consecutive): {}", st.engine_failures, e);
                st.state.engine_error = Some(e.to_string());
                EngineOutcome::Failed
            }
        }
    }

    /// Publish the mutated state and produce the command result
    fn commit(&self, st: &mut ControllerState, outcome: EngineOutcome) -> Result<PlaybackState> {
        st.state.revision += 1;
        let snapshot = st.state.clone();

        self.broadcaster.publish_state(snapshot.clone(), self.clock.now());
        self.snapshot_tx.send_replace(snapshot.clone());

        if outcome == EngineOutcome::Failed && st.engine_failures >= self.failure_threshold {
            let reason = snapshot
                .engine_error
                .unwrap_or_else(|| EngineError::Unavailable.to_string());
            return Err(Error::EngineUnavailable(reason));
        }
        Ok(snapshot)
    }
}

/// Clamp a seek target into `[0, duration]`; NaN seeks to the start
fn clamp_position(position: f64, duration: f64) -> f64 {
    if position.is_nan() {
        return 0.0;
    }
    position.clamp(0.0, duration.max(0.0))
}

fn validate_order(tracks: &[TrackRef]) -> Result<()> {
    if tracks.is_empty() {
        return Err(Error::InvalidInput("play order is empty".to_string()));
    }

    let mut seen = std::collections::HashSet::with_capacity(tracks.len());
    for track in tracks {
        if !seen.insert(&track.id) {
            return Err(Error::InvalidInput(format!("duplicate track id {}", track.id)));
        }
        if !track.duration_seconds.is_finite() || track.duration_seconds < 0.0 {
            return Err(Error::InvalidInput(format!(
                "track {} has invalid duration {}",
                track.id, track.duration_seconds
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BroadcastConfig;
    use crate::engine::SilentEngine;
    use cadence_common::{RepeatMode, SystemClock};
    use rand::SeedableRng;

    fn controller_with(engine: Option<Arc<dyn AudioEngine>>) -> PlaybackController {
        let config = SessionConfig::default();
        let hub = Broadcaster::new(
            &BroadcastConfig::default(),
            PlaybackState::initial(config.default_volume),
            chrono::Utc::now(),
        );
        PlaybackController::new(
            &config,
            engine,
            Arc::new(SystemClock),
            StdRng::seed_from_u64(99),
            hub,
        )
    }

    fn controller() -> PlaybackController {
        controller_with(Some(Arc::new(SilentEngine::new())))
    }

    fn tracks(n: usize) -> Vec<TrackRef> {
        (1..=n).map(|i| TrackRef::new(i.to_string(), 180.0)).collect()
    }

    #[tokio::test]
    async fn test_idle_playback_commands_rejected() {
        let c = controller();
        assert!(matches!(c.play().await, Err(Error::NoActiveTrack)));
        assert!(matches!(c.next().await, Err(Error::NoActiveTrack)));
        assert!(matches!(c.seek(10.0).await, Err(Error::NoActiveTrack)));
        assert_eq!(c.snapshot().revision, 0);
    }

    #[tokio::test]
    async fn test_volume_allowed_while_idle_and_clamped() {
        let c = controller();
        assert_eq!(c.set_volume(-5).await.unwrap().volume, 0);
        assert_eq!(c.set_volume(999).await.unwrap().volume, 100);
        assert_eq!(c.set_volume(42).await.unwrap().volume, 42);
    }

    #[tokio::test]
    async fn test_load_selects_first_track() {
        let c = controller();
        let state = c.load(tracks(3)).await.unwrap();
        assert_eq!(state.current_track_id, Some(TrackId::from("1")));
        assert_eq!(state.sequence_index, Some(0));
        assert_eq!(state.phase, PlayerPhase::Loaded);
        assert_eq!(state.duration_seconds, 180.0);
        assert!(!state.is_playing);
    }

    #[tokio::test]
    async fn test_load_rejects_bad_orders() {
        let c = controller();
        assert!(matches!(c.load(vec![]).await, Err(Error::InvalidInput(_))));

        let dup = vec![TrackRef::new("a", 1.0), TrackRef::new("a", 2.0)];
        assert!(matches!(c.load(dup).await, Err(Error::InvalidInput(_))));

        let nan = vec![TrackRef::new("a", f64::NAN)];
        assert!(matches!(c.load(nan).await, Err(Error::InvalidInput(_))));
        assert_eq!(c.snapshot().phase, PlayerPhase::Idle);
    }

    #[tokio::test]
    async fn test_seek_clamps() {
        let c = controller();
        c.load(tracks(1)).await.unwrap();
        assert_eq!(c.seek(99999.0).await.unwrap().position_seconds, 180.0);
        assert_eq!(c.seek(-3.0).await.unwrap().position_seconds, 0.0);
        assert_eq!(c.seek(f64::NAN).await.unwrap().position_seconds, 0.0);
    }

    #[tokio::test]
    async fn test_stop_rewinds_to_loaded() {
        let c = controller();
        c.load(tracks(2)).await.unwrap();
        c.play().await.unwrap();
        c.seek(42.0).await.unwrap();

        let state = c.stop().await.unwrap();
        assert_eq!(state.position_seconds, 0.0);
        assert_eq!(state.phase, PlayerPhase::Loaded);
        assert!(!state.is_playing);
    }

    #[tokio::test]
    async fn test_toggle_play() {
        let c = controller();
        c.load(tracks(2)).await.unwrap();
        assert!(c.toggle_play().await.unwrap().is_playing);
        let state = c.toggle_play().await.unwrap();
        assert!(!state.is_playing);
        assert_eq!(state.phase, PlayerPhase::Paused);
    }

    #[tokio::test]
    async fn test_next_at_end_stops_without_repeat() {
        let c = controller();
        c.load(tracks(2)).await.unwrap();
        c.play().await.unwrap();
        c.next().await.unwrap();

        let state = c.next().await.unwrap();
        assert_eq!(state.phase, PlayerPhase::Stopped);
        assert!(!state.is_playing);
        assert_eq!(state.current_track_id, Some(TrackId::from("2")));
        assert_eq!(state.position_seconds, 180.0);

        // Playing again restarts the last track
        let state = c.play().await.unwrap();
        assert_eq!(state.position_seconds, 0.0);
        assert!(state.is_playing);
    }

    #[tokio::test]
    async fn test_repeat_one_replays() {
        let c = controller();
        c.load(tracks(3)).await.unwrap();
        c.cycle_repeat().await.unwrap();
        assert_eq!(c.snapshot().repeat_mode, RepeatMode::One);

        c.seek(50.0).await.unwrap();
        for _ in 0..4 {
            let state = c.next().await.unwrap();
            assert_eq!(state.current_track_id, Some(TrackId::from("1")));
            assert_eq!(state.position_seconds, 0.0);
        }
    }

    #[tokio::test]
    async fn test_previous_at_start_is_noop() {
        let c = controller();
        let loaded = c.load(tracks(3)).await.unwrap();
        let state = c.previous().await.unwrap();
        assert_eq!(state, loaded);
    }

    #[tokio::test]
    async fn test_play_track_unknown_id() {
        let c = controller();
        c.load(tracks(3)).await.unwrap();
        let result = c.play_track(TrackId::from("nope")).await;
        assert!(matches!(result, Err(Error::TrackNotFound(_))));

        let state = c.play_track(TrackId::from("3")).await.unwrap();
        assert_eq!(state.sequence_index, Some(2));
        assert!(state.is_playing);
    }

    #[tokio::test]
    async fn test_toggle_shuffle_keeps_current_track() {
        let c = controller();
        c.load(tracks(5)).await.unwrap();
        c.next().await.unwrap();
        let state = c.toggle_shuffle().await.unwrap();
        assert!(state.shuffle_enabled);
        assert_eq!(state.current_track_id, Some(TrackId::from("2")));
    }

    #[tokio::test]
    async fn test_missing_engine_degrades() {
        let c = controller_with(None);
        let state = c.load(tracks(2)).await.unwrap();
        assert!(state.engine_error.is_some());

        c.play().await.unwrap();
        // Third consecutive failure crosses the default threshold
        let result = c.pause().await;
        assert!(matches!(result, Err(Error::EngineUnavailable(_))));

        // State still reflects the command
        assert_eq!(c.snapshot().phase, PlayerPhase::Paused);
        assert_eq!(c.engine_failures().await, 3);
    }

    #[tokio::test]
    async fn test_revision_increments_per_command() {
        let c = controller();
        let mut rx = c.subscribe_state();
        c.load(tracks(2)).await.unwrap();
        c.play().await.unwrap();
        assert_eq!(c.snapshot().revision, 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().revision, 2);
    }

    #[tokio::test]
    async fn test_report_position_clamps_while_playing() {
        let c = controller();
        c.load(tracks(1)).await.unwrap();
        c.play().await.unwrap();

        let state = c.report_position(12.5).await.unwrap();
        assert_eq!(state.position_seconds, 12.5);
        assert_eq!(state.revision, 3);
        assert_eq!(c.report_position(500.0).await.unwrap().position_seconds, 180.0);
        assert_eq!(c.report_position(-1.0).await.unwrap().position_seconds, 0.0);
        assert!(matches!(c.report_position(f64::NAN).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_report_position_ignored_unless_playing() {
        let c = controller();
        assert_eq!(c.report_position(5.0).await.unwrap().revision, 0);

        c.load(tracks(1)).await.unwrap();
        let state = c.report_position(30.0).await.unwrap();
        assert_eq!(state.position_seconds, 0.0);
        assert_eq!(state.revision, 1);

        c.play().await.unwrap();
        c.report_position(30.0).await.unwrap();
        c.pause().await.unwrap();
        let state = c.report_position(90.0).await.unwrap();
        assert_eq!(state.position_seconds, 30.0);
        assert_eq!(c.snapshot().revision, 4);
    }

    #[tokio::test]
    async fn test_shuffle_previous_returns_to_track_playing_at_enable() {
        let c = controller();
        c.load(tracks(5)).await.unwrap();
        c.toggle_shuffle().await.unwrap();

        let state = c.next().await.unwrap();
        assert_ne!(state.current_track_id, Some(TrackId::from("1")));
        let state = c.previous().await.unwrap();
        assert_eq!(state.current_track_id, Some(TrackId::from("1")));
    }

    #[tokio::test]
    async fn test_snapshot_matches_broadcaster() {
        let c = controller();
        c.load(tracks(2)).await.unwrap();
        c.next().await.unwrap();
        assert_eq!(c.snapshot(), c.broadcaster.latest_state());
        let rx = c.subscribe_state();
        assert_eq!(c.snapshot(), *rx.borrow());
    }
}
