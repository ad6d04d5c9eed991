//! Spectrum sampler
//!
//! Periodic producer of fixed-size spectrum frames. Runs on its own tokio
//! task, reads the engine and the latest published snapshot, and never
//! touches controller state.
//!
//! # Pipeline (per tick)
//!
//! 1. Skip the tick if nobody is subscribed
//! 2. Raw magnitudes from the engine while a track is playing, otherwise a
//!    synthetic waveform
//! 3. Bucket to exactly N values by averaging proportional ranges
//! 4. Exponential smoothing against the previous frame
//! 5. Publish through the broadcaster

use std::sync::Arc;
use std::time::Duration;

use cadence_common::events::FrameSource;
use cadence_common::{Clock, PlaybackState, SpectrumFrame};
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::broadcast::Broadcaster;
use crate::config::SpectrumConfig;
use crate::engine::AudioEngine;

/// Resolution of the synthetic waveform before bucketing
const SYNTHETIC_RESOLUTION: usize = 512;

/// Amplitude of the random jitter added to synthetic frames
const SYNTHETIC_JITTER: f64 = 0.05;

/// Reduce `raw` to exactly `buckets` non-negative finite values
///
/// Bucket `i` averages the input range `[i*len/N, (i+1)*len/N)`. Shorter
/// inputs than N stretch: each bucket takes the nearest input value. Empty
/// input yields silence.
pub fn bucketize(raw: &[f32], buckets: usize) -> Vec<f32> {
    let sanitize = |v: f32| if v.is_finite() { v.abs() } else { 0.0 };

    if raw.is_empty() {
        return vec![0.0; buckets];
    }

    let len = raw.len();
    (0..buckets)
        .map(|i| {
            let start = i * len / buckets;
            let end = ((i + 1) * len / buckets).max(start + 1).min(len);
            let chunk = &raw[start..end];
            chunk.iter().map(|&v| sanitize(v)).sum::<f32>() / chunk.len() as f32
        })
        .collect()
}

/// Blend `next` into `previous` in place: `α·previous + (1-α)·next`
///
/// A length mismatch (bucket count changed) resets to `next`.
pub fn smooth(previous: &mut Vec<f32>, next: &[f32], alpha: f32) {
    if previous.len() != next.len() {
        previous.clear();
        previous.extend_from_slice(next);
        return;
    }
    for (p, &n) in previous.iter_mut().zip(next) {
        *p = alpha * *p + (1.0 - alpha) * n;
    }
}

/// Fallback waveform: bass, mid and treble humps breathing at different
/// rates, plus bounded jitter. Values lie in `[0, 1]`.
pub fn synthetic_spectrum<R: Rng + ?Sized>(t: f64, resolution: usize, rng: &mut R) -> Vec<f32> {
    let resolution = resolution.max(2);
    let last = (resolution - 1) as f64;

    (0..resolution)
        .map(|i| {
            let f = i as f64 / last;
            let bass = (-f * 5.0).exp() * (0.6 + 0.4 * (t * 2.0).sin());
            let mids = (-(f - 0.3).powi(2) * 8.0).exp() * (0.4 + 0.3 * (t * 3.0 + 1.0).sin());
            let highs = (-(f - 0.8).powi(2) * 15.0).exp() * (0.3 + 0.2 * (t * 4.0 + 2.0).sin());
            let jitter = rng.gen::<f64>() * SYNTHETIC_JITTER;
            (bass + mids + highs + jitter).clamp(0.0, 1.0) as f32
        })
        .collect()
}

/// Frame producer for one session
pub struct SpectrumSampler {
    engine: Option<Arc<dyn AudioEngine>>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    buckets: usize,
    alpha: f32,
    interval: Duration,
    previous: Vec<f32>,
}

impl SpectrumSampler {
    pub fn new(
        config: &SpectrumConfig,
        engine: Option<Arc<dyn AudioEngine>>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        Self {
            engine,
            clock,
            rng,
            buckets: config.bucket_count(),
            alpha: config.effective_smoothing(),
            interval: config.interval(),
            previous: Vec::new(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets
    }

    /// Produce the next smoothed frame
    ///
    /// Engine data is only consulted while `playing`; a paused engine may
    /// still report its last buffer, which would freeze the display.
    pub fn sample(&mut self, playing: bool) -> SpectrumFrame {
        let engine_raw = if playing {
            self.engine.as_ref().and_then(|e| e.get_raw_spectrum())
        } else {
            None
        };

        let (raw, source) = match engine_raw {
            Some(raw) => (raw, FrameSource::Engine),
            None => {
                let t = self.clock.seconds();
                (
                    synthetic_spectrum(t, SYNTHETIC_RESOLUTION, &mut self.rng),
                    FrameSource::Synthetic,
                )
            }
        };

        let bucketed = bucketize(&raw, self.buckets);
        smooth(&mut self.previous, &bucketed, self.alpha);

        SpectrumFrame {
            magnitudes: self.previous.clone(),
            source,
            timestamp: self.clock.now(),
        }
    }

    /// Tick forever, publishing frames to `broadcaster`
    ///
    /// Returns when the state channel closes (the controller was dropped).
    pub async fn run(mut self, broadcaster: Broadcaster, mut state: watch::Receiver<PlaybackState>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Spectrum sampler started: {} buckets every {:?}",
            self.buckets, self.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            if broadcaster.subscriber_count() == 0 {
                continue;
            }

            let playing = state.borrow().is_playing;
            let frame = self.sample(playing);
            broadcaster.publish_spectrum(frame);
        }

        debug!("Spectrum sampler stopped");
    }
}
