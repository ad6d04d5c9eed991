//! Playback sequencing, control and spectrum sampling

pub mod controller;
pub mod repeat;
pub mod sampler;
pub mod shuffle;

pub use controller::PlaybackController;
pub use repeat::{NextOutcome, PreviousOutcome};
pub use sampler::SpectrumSampler;
pub use shuffle::{ShuffleSequencer, ShuffleStep};
