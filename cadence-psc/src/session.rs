//! Playback session: the public boundary of the coordinator
//!
//! Bundles one controller, one broadcaster and one spectrum sampler with
//! their injected engine, clock and RNG. Sessions share nothing, so any
//! number can run side by side in one process.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cadence_common::{Clock, PlaybackState, SessionCommand, SystemClock, TrackId, TrackRef};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::broadcast::{BroadcastStats, Broadcaster, SubscriberId, Subscription};
use crate::config::{BroadcastConfig, SessionConfig, SpectrumConfig, TomlConfig};
use crate::engine::{AudioEngine, SilentEngine};
use crate::error::{Error, Result};
use crate::playback::{PlaybackController, SpectrumSampler};

/// Everything a session is built from
pub struct SessionOptions {
    /// None runs the session without audio (every engine call fails)
    pub engine: Option<Arc<dyn AudioEngine>>,
    pub clock: Arc<dyn Clock>,
    /// Fixed RNG seed for reproducible shuffles; None seeds from entropy
    pub seed: Option<u64>,
    pub session: SessionConfig,
    pub spectrum: SpectrumConfig,
    pub broadcast: BroadcastConfig,
}

impl SessionOptions {
    /// Options from a loaded TOML config, with the silent engine attached
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            session: config.session.clone(),
            spectrum: config.spectrum.clone(),
            broadcast: config.broadcast.clone(),
            ..Self::default()
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            engine: Some(Arc::new(SilentEngine::new())),
            clock: Arc::new(SystemClock),
            seed: None,
            session: SessionConfig::default(),
            spectrum: SpectrumConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}

/// Point-in-time health counters for one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionDiagnostics {
    pub broadcast: BroadcastStats,
    pub engine_attached: bool,
    pub engine_failures: u32,
    pub revision: u64,
    pub spectrum_buckets: usize,
    pub started_at: DateTime<Utc>,
}

/// One player's coordinator
pub struct PlaybackSession {
    controller: PlaybackController,
    broadcaster: Broadcaster,
    sampler: Mutex<Option<SpectrumSampler>>,
    clock: Arc<dyn Clock>,
    spectrum_buckets: usize,
    heartbeat: Duration,
    started_at: DateTime<Utc>,
}

impl PlaybackSession {
    pub fn new(options: SessionOptions) -> Self {
        let SessionOptions {
            engine,
            clock,
            seed,
            session,
            spectrum,
            broadcast,
        } = options;

        let mut master = match seed {
            Some(seed) => {
                info!("Session RNG seeded with {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        let controller_rng = StdRng::seed_from_u64(master.gen());
        let sampler_rng = StdRng::seed_from_u64(master.gen());

        let started_at = clock.now();
        let broadcaster = Broadcaster::new(
            &broadcast,
            PlaybackState::initial(session.default_volume),
            started_at,
        );
        let controller = PlaybackController::new(
            &session,
            engine.clone(),
            Arc::clone(&clock),
            controller_rng,
            broadcaster.clone(),
        );
        let sampler = SpectrumSampler::new(&spectrum, engine, Arc::clone(&clock), sampler_rng);

        Self {
            controller,
            broadcaster,
            spectrum_buckets: sampler.bucket_count(),
            sampler: Mutex::new(Some(sampler)),
            clock,
            heartbeat: Duration::from_secs(broadcast.heartbeat_secs.max(1)),
            started_at,
        }
    }

    /// Start the spectrum sampler task
    ///
    /// Only the first call spawns; later calls return None. The task ends
    /// when the session is dropped.
    pub fn spawn_sampler(&self) -> Option<JoinHandle<()>> {
        let sampler = self.sampler.lock().unwrap_or_else(|e| e.into_inner()).take()?;
        let broadcaster = self.broadcaster.clone();
        let state = self.controller.subscribe_state();
        Some(tokio::spawn(sampler.run(broadcaster, state)))
    }

    // ========================================
    // Commands
    // ========================================

    pub async fn load(&self, tracks: Vec<TrackRef>) -> Result<PlaybackState> {
        self.controller.load(tracks).await
    }

    pub async fn play(&self) -> Result<PlaybackState> {
        self.controller.play().await
    }

    pub async fn pause(&self) -> Result<PlaybackState> {
        self.controller.pause().await
    }

    pub async fn toggle_play(&self) -> Result<PlaybackState> {
        self.controller.toggle_play().await
    }

    pub async fn stop(&self) -> Result<PlaybackState> {
        self.controller.stop().await
    }

    pub async fn seek(&self, position: f64) -> Result<PlaybackState> {
        self.controller.seek(position).await
    }

    pub async fn set_volume(&self, level: i64) -> Result<PlaybackState> {
        self.controller.set_volume(level).await
    }

    pub async fn toggle_shuffle(&self) -> Result<PlaybackState> {
        self.controller.toggle_shuffle().await
    }

    pub async fn cycle_repeat(&self) -> Result<PlaybackState> {
        self.controller.cycle_repeat().await
    }

    pub async fn next(&self) -> Result<PlaybackState> {
        self.controller.next().await
    }

    pub async fn previous(&self) -> Result<PlaybackState> {
        self.controller.previous().await
    }

    pub async fn play_track(&self, id: TrackId) -> Result<PlaybackState> {
        self.controller.play_track(id).await
    }

    pub async fn track_finished(&self) -> Result<PlaybackState> {
        self.controller.track_finished().await
    }

    pub async fn report_position(&self, position: f64) -> Result<PlaybackState> {
        self.controller.report_position(position).await
    }

    /// Dispatch a push-channel command
    ///
    /// `origin` is the subscriber the command arrived on; `resync` needs it
    /// to know where to resend the snapshot.
    pub async fn apply(&self, command: SessionCommand, origin: Option<SubscriberId>) -> Result<PlaybackState> {
        debug!("Applying {} command", command.name());
        match command {
            SessionCommand::Load { tracks } => self.load(tracks).await,
            SessionCommand::Play => self.play().await,
            SessionCommand::Pause => self.pause().await,
            SessionCommand::TogglePlay => self.toggle_play().await,
            SessionCommand::Stop => self.stop().await,
            SessionCommand::Seek { position } => self.seek(position).await,
            SessionCommand::SetVolume { level } => self.set_volume(level).await,
            SessionCommand::ToggleShuffle => self.toggle_shuffle().await,
            SessionCommand::CycleRepeat => self.cycle_repeat().await,
            SessionCommand::Next => self.next().await,
            SessionCommand::Previous => self.previous().await,
            SessionCommand::PlayTrack { id } => self.play_track(id).await,
            SessionCommand::TrackFinished => self.track_finished().await,
            SessionCommand::ReportPosition { position } => self.report_position(position).await,
            SessionCommand::GetSnapshot | SessionCommand::Heartbeat => Ok(self.snapshot()),
            SessionCommand::Resync => {
                let id = origin.ok_or_else(|| {
                    Error::InvalidInput("resync requires a push-channel connection".to_string())
                })?;
                self.resync(id);
                Ok(self.snapshot())
            }
        }
    }

    // ========================================
    // Queries and subscriptions
    // ========================================

    /// Latest committed state
    pub fn snapshot(&self) -> PlaybackState {
        self.controller.snapshot()
    }

    /// Register a push-channel subscriber
    pub fn subscribe(&self) -> Subscription {
        self.broadcaster.register()
    }

    /// Unregister a subscriber; safe to call repeatedly
    pub fn unregister(&self, id: SubscriberId) -> bool {
        self.broadcaster.unregister(id)
    }

    /// Resend the full snapshot to one subscriber
    pub fn resync(&self, id: SubscriberId) -> bool {
        self.broadcaster.resync(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Push-channel heartbeat interval
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn diagnostics(&self) -> SessionDiagnostics {
        SessionDiagnostics {
            broadcast: self.broadcaster.stats(),
            engine_attached: self.controller.has_engine(),
            engine_failures: self.controller.engine_failures().await,
            revision: self.snapshot().revision,
            spectrum_buckets: self.spectrum_buckets,
            started_at: self.started_at,
        }
    }
}
