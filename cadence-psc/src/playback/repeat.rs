//! Repeat policy
//!
//! Decides what happens at the edges of the play order: after the current
//! track for `next()` (natural end or user skip) and before it for
//! `previous()`. Pure with respect to the controller: the only state it
//! touches is the shuffle sequencer handed to it.

use cadence_common::{RepeatMode, TrackId};
use rand::Rng;
use tracing::{debug, warn};

use super::shuffle::{ShuffleSequencer, ShuffleStep};

/// Position in the base play order chosen by the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub index: usize,
    pub id: TrackId,
}

/// Outcome of advancing past the current track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    /// Repeat-one: restart the current track
    SameTrack,
    Advance(Target),
    /// End of the play order with repeat off
    Stop,
}

/// Outcome of stepping back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviousOutcome {
    Retreat(Target),
    /// Already at the start (or no history); nothing changes
    NoOp,
}

/// How the play order is walked
pub enum Traversal<'a, R: Rng + ?Sized> {
    /// Base order, index by index
    Sequential,
    /// Through the sequencer's permutation
    Shuffled {
        sequencer: &'a mut ShuffleSequencer,
        rng: &'a mut R,
    },
}

/// Resolve `next()` for the current position
///
/// `current` is the index of the current track in `order`, None when the
/// session has not selected one yet.
pub fn resolve_next<R: Rng + ?Sized>(
    current: Option<usize>,
    order: &[TrackId],
    traversal: Traversal<'_, R>,
    mode: RepeatMode,
) -> NextOutcome {
    if order.is_empty() {
        return NextOutcome::Stop;
    }

    if mode == RepeatMode::One && current.is_some() {
        return NextOutcome::SameTrack;
    }

    match traversal {
        Traversal::Sequential => {
            let candidate = current.map_or(0, |i| i + 1);
            if candidate < order.len() {
                NextOutcome::Advance(target_at(order, candidate))
            } else if mode == RepeatMode::All {
                debug!("End of play order, wrapping to start");
                NextOutcome::Advance(target_at(order, 0))
            } else {
                NextOutcome::Stop
            }
        }
        Traversal::Shuffled { sequencer, rng } => {
            let step = match sequencer.next() {
                ShuffleStep::Exhausted if mode == RepeatMode::All => {
                    debug!("Shuffle pass exhausted, reshuffling");
                    sequencer.reshuffle(rng);
                    sequencer.next()
                }
                step => step,
            };

            match step {
                ShuffleStep::Track(id) => match locate(order, &id) {
                    Some(target) => NextOutcome::Advance(target),
                    None => {
                        warn!("Shuffled id {} missing from play order", id);
                        NextOutcome::Stop
                    }
                },
                ShuffleStep::Exhausted => NextOutcome::Stop,
            }
        }
    }
}

/// Resolve `previous()` for the current position
///
/// Sequential traversal does not wrap: at index 0 it is a no-op.
pub fn resolve_previous<R: Rng + ?Sized>(
    current: Option<usize>,
    order: &[TrackId],
    traversal: Traversal<'_, R>,
) -> PreviousOutcome {
    match traversal {
        Traversal::Sequential => match current {
            Some(index) if index > 0 && index <= order.len() => {
                PreviousOutcome::Retreat(target_at(order, index - 1))
            }
            _ => PreviousOutcome::NoOp,
        },
        Traversal::Shuffled { sequencer, .. } => sequencer
            .previous()
            .and_then(|id| locate(order, &id))
            .map_or(PreviousOutcome::NoOp, PreviousOutcome::Retreat),
    }
}

fn target_at(order: &[TrackId], index: usize) -> Target {
    Target {
        index,
        id: order[index].clone(),
    }
}

fn locate(order: &[TrackId], id: &TrackId) -> Option<Target> {
    order.iter().position(|t| t == id).map(|index| Target {
        index,
        id: id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn ids(n: usize) -> Vec<TrackId> {
        (1..=n).map(|i| TrackId::from(i.to_string())).collect()
    }

    fn sequential() -> Traversal<'static, StdRng> {
        Traversal::Sequential
    }

    #[test]
    fn test_sequential_advances() {
        let order = ids(3);
        let outcome = resolve_next(Some(0), &order, sequential(), RepeatMode::None);
        assert_eq!(
            outcome,
            NextOutcome::Advance(Target {
                index: 1,
                id: TrackId::from("2")
            })
        );
    }

    #[test]
    fn test_sequential_end_stops_without_repeat() {
        let order = ids(3);
        assert_eq!(
            resolve_next(Some(2), &order, sequential(), RepeatMode::None),
            NextOutcome::Stop
        );
    }

    #[test]
    fn test_sequential_end_wraps_with_repeat_all() {
        let order = ids(3);
        match resolve_next(Some(2), &order, sequential(), RepeatMode::All) {
            NextOutcome::Advance(target) => assert_eq!(target.index, 0),
            other => panic!("expected wrap, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_one_replays_current() {
        let order = ids(3);
        assert_eq!(
            resolve_next(Some(2), &order, sequential(), RepeatMode::One),
            NextOutcome::SameTrack
        );
    }

    #[test]
    fn test_previous_at_start_is_noop() {
        let order = ids(3);
        assert_eq!(resolve_previous(Some(0), &order, sequential()), PreviousOutcome::NoOp);
        assert_eq!(resolve_previous(None, &order, sequential()), PreviousOutcome::NoOp);
    }

    #[test]
    fn test_previous_steps_back() {
        let order = ids(3);
        match resolve_previous(Some(2), &order, sequential()) {
            PreviousOutcome::Retreat(target) => assert_eq!(target.index, 1),
            other => panic!("expected retreat, got {:?}", other),
        }
    }

    #[test]
    fn test_shuffle_pass_then_stop() {
        let order = ids(5);
        let mut rng = StdRng::seed_from_u64(12);
        let mut seq = ShuffleSequencer::default();
        seq.enable(&order, None, &mut rng);

        let mut seen = HashSet::new();
        for _ in 0..5 {
            let traversal = Traversal::Shuffled {
                sequencer: &mut seq,
                rng: &mut rng,
            };
            match resolve_next(None, &order, traversal, RepeatMode::None) {
                NextOutcome::Advance(target) => {
                    assert_eq!(order[target.index], target.id);
                    seen.insert(target.id);
                }
                other => panic!("expected advance, got {:?}", other),
            }
        }
        assert_eq!(seen.len(), 5);

        let traversal = Traversal::Shuffled {
            sequencer: &mut seq,
            rng: &mut rng,
        };
        assert_eq!(resolve_next(None, &order, traversal, RepeatMode::None), NextOutcome::Stop);
    }

    #[test]
    fn test_shuffle_exhaustion_reshuffles_with_repeat_all() {
        let order = ids(3);
        let mut rng = StdRng::seed_from_u64(13);
        let mut seq = ShuffleSequencer::default();
        seq.enable(&order, None, &mut rng);
        while let ShuffleStep::Track(_) = seq.next() {}

        let before = seq.permutation().to_vec();
        let traversal = Traversal::Shuffled {
            sequencer: &mut seq,
            rng: &mut rng,
        };
        assert!(matches!(
            resolve_next(Some(0), &order, traversal, RepeatMode::All),
            NextOutcome::Advance(_)
        ));
        assert_ne!(seq.permutation(), before.as_slice());
    }

    #[test]
    fn test_empty_order_stops() {
        assert_eq!(resolve_next(None, &[], sequential(), RepeatMode::All), NextOutcome::Stop);
    }
}
