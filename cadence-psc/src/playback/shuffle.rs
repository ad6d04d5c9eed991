//! Shuffle sequencer
//!
//! Generates and walks a non-repeating random play order over a fixed
//! track set.
//!
//! **Guarantees:**
//! - One pass returns every id exactly once, then reports `Exhausted`
//! - A fresh permutation (re-enable or reshuffle) never equals the one it
//!   replaces when there are at least two tracks
//! - History is bounded to `history_depth` entries
//!
//! The sequencer does not own an RNG; the controller passes its seeded RNG
//! in, so a session seeded with the same value replays the same order.

use std::collections::VecDeque;

use cadence_common::TrackId;
use rand::seq::SliceRandom;
use rand::Rng;

/// Default number of previously-visited ids kept for `previous()`
pub const DEFAULT_HISTORY_DEPTH: usize = 500;

/// Attempts at drawing a permutation different from the previous one
/// before falling back to a rotation
const MAX_RESHUFFLE_ATTEMPTS: usize = 8;

/// Result of advancing the sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShuffleStep {
    Track(TrackId),
    /// Every id of the current permutation has been returned
    Exhausted,
}

/// Randomized traversal state
#[derive(Debug, Clone)]
pub struct ShuffleSequencer {
    /// Current permutation (each id exactly once)
    permutation: Vec<TrackId>,

    /// Index of the last returned entry; None = before first
    pointer: Option<usize>,

    /// Previously visited ids, most recent at the back
    history: VecDeque<TrackId>,

    history_depth: usize,

    /// Id the sequencer considers "current"; pushed to history on the next step
    last_returned: Option<TrackId>,
}

impl ShuffleSequencer {
    /// Create a disabled sequencer
    pub fn new(history_depth: usize) -> Self {
        Self {
            permutation: Vec::new(),
            pointer: None,
            history: VecDeque::new(),
            history_depth: history_depth.max(1),
            last_returned: None,
        }
    }

    /// Build a uniformly random permutation of `order` and reset history
    ///
    /// `current` is the track playing when shuffle starts: it becomes the
    /// first history entry once `next()` moves on, and the permutation
    /// never opens with it.
    pub fn enable<R: Rng + ?Sized>(
        &mut self,
        order: &[TrackId],
        current: Option<&TrackId>,
        rng: &mut R,
    ) {
        let previous = std::mem::take(&mut self.permutation);
        self.permutation = Self::draw(order.to_vec(), &previous, current, rng);
        self.pointer = None;
        self.history.clear();
        self.last_returned = current.cloned();
    }

    /// Draw a new permutation of the same ids, keeping history
    ///
    /// Used after exhaustion when repeat-all continues the session. The new
    /// pass does not open with the track the previous pass ended on.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let previous = std::mem::take(&mut self.permutation);
        let current = self.last_returned.clone();
        self.permutation = Self::draw(previous.clone(), &previous, current.as_ref(), rng);
        self.pointer = None;
    }

    /// Discard the permutation and history
    pub fn disable(&mut self) {
        self.permutation.clear();
        self.pointer = None;
        self.history.clear();
        self.last_returned = None;
    }

    pub fn is_enabled(&self) -> bool {
        !self.permutation.is_empty()
    }

    /// Advance to the next id of the permutation
    pub fn next(&mut self) -> ShuffleStep {
        let candidate = self.pointer.map_or(0, |p| p + 1);

        if candidate >= self.permutation.len() {
            // Park past the end so repeated calls stay exhausted
            self.pointer = Some(self.permutation.len());
            return ShuffleStep::Exhausted;
        }

        self.pointer = Some(candidate);
        let id = self.permutation[candidate].clone();
        if let Some(prev) = self.last_returned.replace(id.clone()) {
            self.push_history(prev);
        }
        ShuffleStep::Track(id)
    }

    /// Pop the most recently visited id
    ///
    /// Returns None at the start of the session; the caller treats that as a no-op.
    pub fn previous(&mut self) -> Option<TrackId> {
        let id = self.history.pop_back()?;
        self.last_returned = Some(id.clone());
        Some(id)
    }

    /// Record a direct jump to `id` outside the permutation walk
    pub fn record_jump(&mut self, id: TrackId) {
        if let Some(prev) = self.last_returned.replace(id) {
            self.push_history(prev);
        }
    }

    pub fn permutation(&self) -> &[TrackId] {
        &self.permutation
    }

    /// Index of the last returned entry (None before the first `next()`)
    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn push_history(&mut self, id: TrackId) {
        if self.history.len() == self.history_depth {
            self.history.pop_front();
        }
        self.history.push_back(id);
    }

    /// Fisher-Yates shuffle of `ids`, re-drawn until it differs from `previous`
    ///
    /// The result never starts with `current` when there are two or more
    /// ids. With exactly two ids that rule wins over differing from
    /// `previous`.
    fn draw<R: Rng + ?Sized>(
        mut ids: Vec<TrackId>,
        previous: &[TrackId],
        current: Option<&TrackId>,
        rng: &mut R,
    ) -> Vec<TrackId> {
        if ids.len() < 2 {
            return ids;
        }

        for _ in 0..MAX_RESHUFFLE_ATTEMPTS {
            ids.shuffle(rng);
            Self::move_off_head(&mut ids, current, rng);
            if ids.as_slice() != previous {
                return ids;
            }
        }

        // Distinct ids: every non-trivial rotation differs, at most one starts with `current`
        for _ in 1..ids.len() {
            ids.rotate_left(1);
            if ids.as_slice() != previous && ids.first() != current {
                return ids;
            }
        }
        Self::move_off_head(&mut ids, current, rng);
        ids
    }

    /// Swap `current` out of the first slot into a random other one
    fn move_off_head<R: Rng + ?Sized>(
        ids: &mut [TrackId],
        current: Option<&TrackId>,
        rng: &mut R,
    ) {
        if ids.len() >= 2 && current.is_some() && ids.first() == current {
            let slot = rng.gen_range(1..ids.len());
            ids.swap(0, slot);
        }
    }
}

impl Default for ShuffleSequencer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}
