//! HTTP request handlers
//!
//! Every command endpoint returns the resulting `PlaybackState` as JSON.
//! Failures use one error body shape:
//!
//! ```json
//! { "status": "error", "error": "no_active_track", "message": "..." }
//! ```

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use cadence_common::{PlaybackState, TrackId, TrackRef};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::server::AppContext;
use crate::error::Error;
use crate::session::SessionDiagnostics;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BuildInfoResponse {
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    tracks: Vec<TrackRef>,
}

/// Body of `seek` and `position`
#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    /// Seconds from the start of the current track
    position: f64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// 0-100 user-facing scale; clamped
    volume: i64,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Map a coordinator error to its HTTP status and body
pub fn error_response(e: Error) -> ApiError {
    let status = match &e {
        Error::NoActiveTrack => StatusCode::CONFLICT,
        Error::TrackNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Request failed: {}", e);
    }
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            error: e.kind().to_string(),
            message: e.to_string(),
        }),
    )
}

fn state_result(result: crate::Result<PlaybackState>) -> ApiResult<PlaybackState> {
    result.map(Json).map_err(error_response)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| error_response(Error::InvalidInput(rejection.body_text())))
}

// ============================================================================
// Health / Build Info
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "cadence-psc".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/v1/build_info
pub async fn get_build_info() -> Json<BuildInfoResponse> {
    Json(BuildInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}

// ============================================================================
// Playback Control
// ============================================================================

/// POST /api/v1/playback/load
pub async fn load(
    State(ctx): State<AppContext>,
    payload: Result<Json<LoadRequest>, JsonRejection>,
) -> ApiResult<PlaybackState> {
    let request = body(payload)?;
    info!("Load request: {} tracks", request.tracks.len());
    state_result(ctx.session.load(request.tracks).await)
}

/// POST /api/v1/playback/play
pub async fn play(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.play().await)
}

/// POST /api/v1/playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.pause().await)
}

/// POST /api/v1/playback/toggle
pub async fn toggle_play(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.toggle_play().await)
}

/// POST /api/v1/playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.stop().await)
}

/// POST /api/v1/playback/next
pub async fn next(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.next().await)
}

/// POST /api/v1/playback/previous
pub async fn previous(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.previous().await)
}

/// POST /api/v1/playback/seek
pub async fn seek(
    State(ctx): State<AppContext>,
    payload: Result<Json<PositionRequest>, JsonRejection>,
) -> ApiResult<PlaybackState> {
    let request = body(payload)?;
    state_result(ctx.session.seek(request.position).await)
}

/// POST /api/v1/playback/track_finished
pub async fn track_finished(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.track_finished().await)
}

/// POST /api/v1/playback/position - progress report from the engine host
pub async fn report_position(
    State(ctx): State<AppContext>,
    payload: Result<Json<PositionRequest>, JsonRejection>,
) -> ApiResult<PlaybackState> {
    let request = body(payload)?;
    state_result(ctx.session.report_position(request.position).await)
}

/// POST /api/v1/playback/shuffle
pub async fn toggle_shuffle(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.toggle_shuffle().await)
}

/// POST /api/v1/playback/repeat
pub async fn cycle_repeat(State(ctx): State<AppContext>) -> ApiResult<PlaybackState> {
    state_result(ctx.session.cycle_repeat().await)
}

/// POST /api/v1/playback/track/:track_id
pub async fn play_track(
    State(ctx): State<AppContext>,
    Path(track_id): Path<String>,
) -> ApiResult<PlaybackState> {
    state_result(ctx.session.play_track(TrackId::from(track_id)).await)
}

/// GET /api/v1/playback/state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<PlaybackState> {
    Json(ctx.session.snapshot())
}

// ============================================================================
// Audio
// ============================================================================

/// POST /api/v1/audio/volume
pub async fn set_volume(
    State(ctx): State<AppContext>,
    payload: Result<Json<VolumeRequest>, JsonRejection>,
) -> ApiResult<PlaybackState> {
    let request = body(payload)?;
    state_result(ctx.session.set_volume(request.volume).await)
}

// ============================================================================
// Diagnostics
// ============================================================================

/// GET /api/v1/diagnostics
pub async fn get_diagnostics(State(ctx): State<AppContext>) -> Json<SessionDiagnostics> {
    Json(ctx.session.diagnostics().await)
}
