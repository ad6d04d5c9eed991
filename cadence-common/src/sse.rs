//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE framing for Cadence services: how a `SessionEvent` becomes an
//! SSE frame, and the keepalive every stream carries.

use axum::response::sse::{Event, KeepAlive};
use std::time::Duration;
use tracing::warn;

use crate::events::SessionEvent;

/// Default push-channel heartbeat interval
pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;

/// Convert a session event to an SSE frame
///
/// The SSE `event:` field carries the event name (`state_update`,
/// `spectrum_update`, `heartbeat`), the `data:` field the full JSON
/// envelope. Returns None if the payload cannot be serialized, which is
/// logged and skipped rather than tearing the stream down.
pub fn to_sse_event(event: &SessionEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_name()).data(json)),
        Err(e) => {
            warn!("Failed to serialize {} event: {}", event.event_name(), e);
            None
        }
    }
}

/// Keepalive comment sent on idle streams
pub fn keep_alive(interval_secs: u64) -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(interval_secs.max(1)))
        .text("heartbeat")
}
