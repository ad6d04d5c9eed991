//! Spectrum frame definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a frame's magnitudes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSource {
    /// Raw magnitudes reported by the audio engine
    Engine,
    /// Deterministic fallback waveform (engine absent or not playing)
    Synthetic,
}

/// Fixed-size frequency-magnitude frame
///
/// `magnitudes.len()` always equals the session's bucket count; every
/// value is finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumFrame {
    pub magnitudes: Vec<f32>,
    pub source: FrameSource,
    pub timestamp: DateTime<Utc>,
}

impl SpectrumFrame {
    /// Number of buckets in this frame
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}
