//! Server-Sent Events stream
//!
//! Each connection is one broadcaster subscription. The first event is
//! always a full `state_update`; the subscription unregisters itself when
//! the client goes away and axum drops the stream.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::{Stream, StreamExt};
use tracing::debug;

use crate::api::server::AppContext;

/// GET /api/v1/events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = ctx.session.subscribe();
    debug!("New SSE client connected as {}", subscription.id());

    let heartbeat = ctx.session.heartbeat_interval().as_secs();
    let stream = subscription
        .into_stream()
        .filter_map(|event| async move { cadence_common::sse::to_sse_event(&event).map(Ok) });

    Sse::new(stream).keep_alive(cadence_common::sse::keep_alive(heartbeat))
}
