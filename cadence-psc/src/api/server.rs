//! HTTP server setup and routing
//!
//! One router serves the command endpoints, the SSE stream and the
//! WebSocket push channel for a single `PlaybackSession`.
//!
//! Base URL: `http://<bind>:5750`, versioned routes under `/api/v1`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{Error, Result};
use crate::session::PlaybackSession;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<PlaybackSession>,
}

impl AppContext {
    pub fn new(session: Arc<PlaybackSession>) -> Self {
        Self { session }
    }
}

/// Build the full router
pub fn create_router(ctx: AppContext) -> Router {
    let api = Router::new()
        // Playback control
        .route("/playback/load", post(super::handlers::load))
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/pause", post(super::handlers::pause))
        .route("/playback/toggle", post(super::handlers::toggle_play))
        .route("/playback/stop", post(super::handlers::stop))
        .route("/playback/next", post(super::handlers::next))
        .route("/playback/previous", post(super::handlers::previous))
        .route("/playback/seek", post(super::handlers::seek))
        .route("/playback/shuffle", post(super::handlers::toggle_shuffle))
        .route("/playback/repeat", post(super::handlers::cycle_repeat))
        .route("/playback/track/:track_id", post(super::handlers::play_track))
        .route("/playback/track_finished", post(super::handlers::track_finished))
        .route("/playback/position", post(super::handlers::report_position))
        .route("/playback/state", get(super::handlers::get_state))
        // Audio
        .route("/audio/volume", post(super::handlers::set_volume))
        // Diagnostics
        .route("/diagnostics", get(super::handlers::get_diagnostics))
        .route("/build_info", get(super::handlers::get_build_info))
        // Push channels
        .route("/events", get(super::sse::event_stream))
        .route("/ws", get(super::ws::ws_handler));

    Router::new()
        .route("/health", get(super::handlers::health))
        .nest("/api/v1", api)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `shutdown` resolves
pub async fn run<F>(addr: SocketAddr, session: Arc<PlaybackSession>, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppContext::new(session));

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
