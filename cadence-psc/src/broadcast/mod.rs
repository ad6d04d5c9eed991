//! Broadcaster: fan-out of session events to push-channel subscribers
//!
//! Every subscriber owns a bounded queue. Publishing walks the registry
//! and offers the event to each queue without blocking; a slow consumer
//! only ever loses its own spectrum frames (and, when completely stalled,
//! superseded state snapshots), never delays the publisher.
//!
//! The broadcaster also remembers the latest state snapshot so that a new
//! or resynchronizing subscriber starts from a consistent view.

mod queue;

pub use queue::SubscriberStats;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use cadence_common::{PlaybackState, SessionEvent, SpectrumFrame};
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BroadcastConfig;
use queue::{Offer, SubscriberQueue};

/// Opaque subscriber handle
pub type SubscriberId = Uuid;

/// Aggregate delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastStats {
    pub subscribers: usize,
    pub dropped_spectrum: u64,
    pub dropped_state: u64,
    pub forced_unregistrations: u64,
    pub total_registered: u64,
}

struct Registry {
    subscribers: HashMap<SubscriberId, Arc<SubscriberQueue>>,
    /// Latest published snapshot, replayed on register/resync
    latest_state: PlaybackState,
    latest_at: DateTime<Utc>,
}

impl Registry {
    fn snapshot_event(&self) -> SessionEvent {
        SessionEvent::StateUpdate {
            state: self.latest_state.clone(),
            timestamp: self.latest_at,
        }
    }
}

struct Inner {
    registry: Mutex<Registry>,
    queue_capacity: usize,
    saturation_limit: u32,
    dropped_spectrum: AtomicU64,
    dropped_state: AtomicU64,
    forced_unregistrations: AtomicU64,
    total_registered: AtomicU64,
}

/// Cloneable handle to one session's broadcaster
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

impl Broadcaster {
    /// Create a broadcaster seeded with the session's initial snapshot
    pub fn new(config: &BroadcastConfig, initial_state: PlaybackState, at: DateTime<Utc>) -> Self {
        info!(
            "Broadcaster initialized: queue capacity {}, saturation limit {}",
            config.queue_capacity, config.saturation_limit
        );
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry {
                    subscribers: HashMap::new(),
                    latest_state: initial_state,
                    latest_at: at,
                }),
                queue_capacity: config.queue_capacity.max(1),
                saturation_limit: config.saturation_limit.max(1),
                dropped_spectrum: AtomicU64::new(0),
                dropped_state: AtomicU64::new(0),
                forced_unregistrations: AtomicU64::new(0),
                total_registered: AtomicU64::new(0),
            }),
        }
    }

    /// Register a new subscriber
    ///
    /// The current snapshot is enqueued before the subscriber becomes
    /// visible to publishers, so its first event is always a full
    /// `state_update` and no later state event can precede it.
    pub fn register(&self) -> Subscription {
        let id = Uuid::new_v4();
        let queue = Arc::new(SubscriberQueue::new(self.inner.queue_capacity));

        let count = {
            let mut registry = self.registry();
            queue.offer_state(registry.snapshot_event());
            registry.subscribers.insert(id, Arc::clone(&queue));
            registry.subscribers.len()
        };
        self.inner.total_registered.fetch_add(1, Ordering::Relaxed);

        info!("Subscriber {} registered, total subscribers: {}", id, count);
        Subscription {
            id,
            queue,
            broadcaster: self.clone(),
        }
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.registry().subscribers.remove(&id);
        match removed {
            Some(queue) => {
                queue.close();
                info!("Subscriber {} unregistered", id);
                true
            }
            None => false,
        }
    }

    /// Publish a state snapshot to every subscriber
    ///
    /// Callers publish from inside the controller's command lock, which is
    /// what keeps state events in production order.
    pub fn publish_state(&self, state: PlaybackState, at: DateTime<Utc>) {
        let mut saturated = Vec::new();
        {
            let mut registry = self.registry();
            registry.latest_state = state;
            registry.latest_at = at;
            let event = registry.snapshot_event();
            for (id, queue) in &registry.subscribers {
                match queue.offer_state(event.clone()) {
                    Offer::Saturated(count) => {
                        self.inner.dropped_state.fetch_add(1, Ordering::Relaxed);
                        debug!("Subscriber {} saturated ({} consecutive)", id, count);
                        if count >= self.inner.saturation_limit {
                            saturated.push(*id);
                        }
                    }
                    Offer::Replaced => {
                        self.inner.dropped_spectrum.fetch_add(1, Ordering::Relaxed);
                    }
                    Offer::Queued | Offer::Discarded => {}
                }
            }
            for id in &saturated {
                if let Some(queue) = registry.subscribers.remove(id) {
                    queue.close();
                }
            }
        }

        for id in saturated {
            self.inner.forced_unregistrations.fetch_add(1, Ordering::Relaxed);
            warn!("Subscriber {} unregistered: outbound queue saturated", id);
        }
    }

    /// Publish a spectrum frame (lossy)
    pub fn publish_spectrum(&self, frame: SpectrumFrame) {
        let event = SessionEvent::SpectrumUpdate { frame };
        let registry = self.registry();
        for (id, queue) in &registry.subscribers {
            match queue.offer_spectrum(event.clone()) {
                Offer::Replaced | Offer::Discarded => {
                    self.inner.dropped_spectrum.fetch_add(1, Ordering::Relaxed);
                    debug!("Dropped spectrum frame for slow subscriber {}", id);
                }
                _ => {}
            }
        }
    }

    /// Re-send the latest snapshot to one subscriber
    ///
    /// Idempotent; returns false for an unknown subscriber.
    pub fn resync(&self, id: SubscriberId) -> bool {
        let registry = self.registry();
        match registry.subscribers.get(&id) {
            Some(queue) => {
                queue.offer_state(registry.snapshot_event());
                debug!("Resynchronized subscriber {}", id);
                true
            }
            None => false,
        }
    }

    /// Most recently published snapshot
    pub fn latest_state(&self) -> PlaybackState {
        self.registry().latest_state.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().subscribers.len()
    }

    pub fn is_registered(&self, id: SubscriberId) -> bool {
        self.registry().subscribers.contains_key(&id)
    }

    /// Per-subscriber counters
    pub fn subscriber_stats(&self, id: SubscriberId) -> Option<SubscriberStats> {
        self.registry().subscribers.get(&id).map(|q| q.stats())
    }

    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            subscribers: self.subscriber_count(),
            dropped_spectrum: self.inner.dropped_spectrum.load(Ordering::Relaxed),
            dropped_state: self.inner.dropped_state.load(Ordering::Relaxed),
            forced_unregistrations: self.inner.forced_unregistrations.load(Ordering::Relaxed),
            total_registered: self.inner.total_registered.load(Ordering::Relaxed),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Receiving end of one registration
///
/// Dropping the subscription unregisters it, so a transport task that
/// ends for any reason (disconnect, error, shutdown) cleans up after itself.
pub struct Subscription {
    id: SubscriberId,
    queue: Arc<SubscriberQueue>,
    broadcaster: Broadcaster,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event, waiting if none is pending
    ///
    /// Returns None once the subscription was unregistered (explicitly or
    /// by the saturation policy) and its queue is drained.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.queue.recv().await
    }

    /// Next pending event without waiting
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.queue.pop()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn stats(&self) -> SubscriberStats {
        self.queue.stats()
    }

    /// Consume the subscription as a stream of events
    pub fn into_stream(mut self) -> impl Stream<Item = SessionEvent> + Send {
        async_stream::stream! {
            while let Some(event) = self.recv().await {
                yield event;
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unregister(self.id);
    }
}
