//! Configuration for the Playback Session Coordinator
//!
//! Bootstrap-only TOML configuration. Every field has a built-in default,
//! so an empty or missing file yields a working coordinator.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --bind, --seed, --no-engine)
//! 2. Environment variables (CADENCE_PORT, CADENCE_CONFIG)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! Example:
//!
//! ```toml
//! port = 5750
//!
//! [session]
//! default_volume = 70
//!
//! [spectrum]
//! bucket_count = 32
//! interval_ms = 150
//!
//! [logging]
//! level = "debug"
//! ```

use std::time::Duration;

use cadence_common::config::LoggingConfig;
use serde::Deserialize;

use crate::playback::shuffle::DEFAULT_HISTORY_DEPTH;

/// Default HTTP port for cadence-psc
pub const DEFAULT_PORT: u16 = 5750;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port (CLI and env override it)
    #[serde(default)]
    pub port: Option<u16>,

    /// Bind address (CLI overrides it)
    #[serde(default)]
    pub bind: Option<String>,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub spectrum: SpectrumConfig,

    #[serde(default)]
    pub broadcast: BroadcastConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Playback controller settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Volume of a fresh session (0-100)
    #[serde(default = "default_volume")]
    pub default_volume: u8,

    /// Shuffle history entries kept for `previous()`
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// Consecutive engine failures after which playback commands report
    /// `EngineUnavailable` to the caller
    #[serde(default = "default_engine_failure_threshold")]
    pub engine_failure_threshold: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            history_depth: default_history_depth(),
            engine_failure_threshold: default_engine_failure_threshold(),
        }
    }
}

/// Spectrum sampler settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SpectrumConfig {
    /// Buckets per frame (N)
    #[serde(default = "default_bucket_count")]
    pub bucket_count: usize,

    /// Tick interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Exponential smoothing factor α
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

impl SpectrumConfig {
    /// Smoothing factor clamped into [0, 1)
    ///
    /// α = 1 would freeze the output at its first frame.
    pub fn effective_smoothing(&self) -> f32 {
        if self.smoothing.is_finite() {
            self.smoothing.clamp(0.0, 0.99)
        } else {
            default_smoothing()
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count.max(1)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(10))
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            bucket_count: default_bucket_count(),
            interval_ms: default_interval_ms(),
            smoothing: default_smoothing(),
        }
    }
}

/// Broadcaster settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Outbound queue capacity per subscriber
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Consecutive saturated state deliveries before forced unregistration
    #[serde(default = "default_saturation_limit")]
    pub saturation_limit: u32,

    /// Push-channel heartbeat interval in seconds
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            saturation_limit: default_saturation_limit(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

fn default_volume() -> u8 {
    70
}

fn default_history_depth() -> usize {
    DEFAULT_HISTORY_DEPTH
}

fn default_engine_failure_threshold() -> u32 {
    3
}

fn default_bucket_count() -> usize {
    20
}

fn default_interval_ms() -> u64 {
    180
}

fn default_smoothing() -> f32 {
    0.8
}

fn default_queue_capacity() -> usize {
    64
}

fn default_saturation_limit() -> u32 {
    128
}

fn default_heartbeat_secs() -> u64 {
    cadence_common::sse::DEFAULT_HEARTBEAT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, None);
        assert_eq!(config.session.default_volume, 70);
        assert_eq!(config.session.history_depth, 500);
        assert_eq!(config.spectrum.bucket_count, 20);
        assert_eq!(config.spectrum.interval_ms, 180);
        assert_eq!(config.broadcast.queue_capacity, 64);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config: TomlConfig = toml::from_str(
            "port = 6001\n[spectrum]\nbucket_count = 32\n[broadcast]\nheartbeat_secs = 5\n",
        )
        .unwrap();
        assert_eq!(config.port, Some(6001));
        assert_eq!(config.spectrum.bucket_count, 32);
        assert_eq!(config.spectrum.interval_ms, 180);
        assert_eq!(config.broadcast.heartbeat_secs, 5);
        assert_eq!(config.broadcast.saturation_limit, 128);
    }

    #[test]
    fn test_smoothing_is_clamped() {
        let mut spectrum = SpectrumConfig::default();
        spectrum.smoothing = 1.5;
        assert!(spectrum.effective_smoothing() < 1.0);
        spectrum.smoothing = -0.3;
        assert_eq!(spectrum.effective_smoothing(), 0.0);
        spectrum.smoothing = f32::NAN;
        assert_eq!(spectrum.effective_smoothing(), 0.8);
    }

    #[test]
    fn test_degenerate_values_are_floored() {
        let spectrum = SpectrumConfig {
            bucket_count: 0,
            interval_ms: 0,
            smoothing: 0.5,
        };
        assert_eq!(spectrum.bucket_count(), 1);
        assert_eq!(spectrum.interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_load_from_file_feeds_session_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence-psc.toml");
        std::fs::write(&path, "[session]\ndefault_volume = 40\n[logging]\nlevel = \"debug\"\n").unwrap();

        let (config, loaded_from): (TomlConfig, _) =
            cadence_common::config::load_or_default(Some(&path));
        assert_eq!(loaded_from.as_deref(), Some(path.as_path()));
        assert_eq!(config.logging.level, "debug");

        let options = crate::SessionOptions::from_config(&config);
        assert_eq!(options.session.default_volume, 40);
        assert_eq!(options.spectrum.bucket_count, 20);
    }
}
