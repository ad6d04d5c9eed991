//! HTTP, SSE and WebSocket boundary for a playback session
//!
//! Thin adapters only: every endpoint forwards to `PlaybackSession` and
//! serializes what comes back.

pub mod handlers;
pub mod server;
pub mod sse;
pub mod ws;

pub use server::{create_router, run, AppContext};
