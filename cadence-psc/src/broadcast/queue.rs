//! Per-subscriber bounded outbound queue
//!
//! Single producer side (the broadcaster, under its registry lock) and a
//! single consumer (the subscriber's transport task). Offers never block
//! and never wait on the consumer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use cadence_common::SessionEvent;
use serde::Serialize;
use tokio::sync::Notify;

/// Result of offering an event to a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Offer {
    /// Enqueued without losing anything
    Queued,
    /// Enqueued after discarding an older event
    Replaced,
    /// Incoming spectrum frame discarded (queue holds only state events)
    Discarded,
    /// Queue holds only state events: the oldest one was superseded.
    /// Carries the number of consecutive saturated state deliveries.
    Saturated(u32),
}

/// Counters for one subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriberStats {
    pub queued: usize,
    pub dropped_spectrum: u64,
    pub dropped_state: u64,
    /// Set while the subscriber has missed a state event and not yet drained its queue
    pub stale: bool,
}

pub(crate) struct SubscriberQueue {
    events: Mutex<VecDeque<SessionEvent>>,
    notify: Notify,
    capacity: usize,
    closed: AtomicBool,
    stale: AtomicBool,
    consecutive_saturations: AtomicU32,
    dropped_spectrum: AtomicU64,
    dropped_state: AtomicU64,
}

impl SubscriberQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
            closed: AtomicBool::new(false),
            stale: AtomicBool::new(false),
            consecutive_saturations: AtomicU32::new(0),
            dropped_spectrum: AtomicU64::new(0),
            dropped_state: AtomicU64::new(0),
        }
    }

    /// Offer a spectrum frame; on a full queue the oldest pending frame goes
    pub(crate) fn offer_spectrum(&self, event: SessionEvent) -> Offer {
        let offer = {
            let mut events = self.lock();
            if events.len() < self.capacity {
                events.push_back(event);
                Offer::Queued
            } else if remove_oldest(&mut events, SessionEvent::is_spectrum) {
                events.push_back(event);
                self.dropped_spectrum.fetch_add(1, Ordering::Relaxed);
                Offer::Replaced
            } else {
                self.dropped_spectrum.fetch_add(1, Ordering::Relaxed);
                Offer::Discarded
            }
        };

        if offer != Offer::Discarded {
            self.notify.notify_one();
        }
        offer
    }

    /// Offer a state event
    ///
    /// A full queue first sheds its oldest spectrum frame (the retry). If
    /// the queue holds nothing but state events, the oldest of those is
    /// superseded by the incoming snapshot and the subscriber is marked stale.
    pub(crate) fn offer_state(&self, event: SessionEvent) -> Offer {
        let offer = {
            let mut events = self.lock();
            if events.len() < self.capacity {
                events.push_back(event);
                self.consecutive_saturations.store(0, Ordering::Relaxed);
                Offer::Queued
            } else if remove_oldest(&mut events, SessionEvent::is_spectrum) {
                events.push_back(event);
                self.dropped_spectrum.fetch_add(1, Ordering::Relaxed);
                self.consecutive_saturations.store(0, Ordering::Relaxed);
                Offer::Replaced
            } else {
                remove_oldest(&mut events, SessionEvent::is_state);
                events.push_back(event);
                self.dropped_state.fetch_add(1, Ordering::Relaxed);
                self.stale.store(true, Ordering::Relaxed);
                let count = self.consecutive_saturations.fetch_add(1, Ordering::Relaxed) + 1;
                Offer::Saturated(count)
            }
        };

        self.notify.notify_one();
        offer
    }

    pub(crate) fn pop(&self) -> Option<SessionEvent> {
        let mut events = self.lock();
        let event = events.pop_front();
        if events.is_empty() {
            self.stale.store(false, Ordering::Relaxed);
        }
        event
    }

    /// Wait until an event is available or the queue is closed
    pub(crate) async fn recv(&self) -> Option<SessionEvent> {
        loop {
            if let Some(event) = self.pop() {
                return Some(event);
            }
            if self.is_closed() {
                return None;
            }
            self.notify.notified().await;
        }
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn stats(&self) -> SubscriberStats {
        SubscriberStats {
            queued: self.lock().len(),
            dropped_spectrum: self.dropped_spectrum.load(Ordering::Relaxed),
            dropped_state: self.dropped_state.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<SessionEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn remove_oldest(events: &mut VecDeque<SessionEvent>, matches: fn(&SessionEvent) -> bool) -> bool {
    match events.iter().position(matches) {
        Some(index) => {
            events.remove(index);
            true
        }
        None => false,
    }
}
