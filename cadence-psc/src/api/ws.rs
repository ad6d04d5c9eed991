//! WebSocket push channel
//!
//! Bidirectional counterpart of the SSE stream:
//! - Outbound: every `SessionEvent` of the connection's subscription, plus
//!   a `heartbeat` on the configured interval
//! - Inbound: tagged `SessionCommand` JSON, each answered with one
//!   `command_result` or `command_error`
//!
//! Malformed input is answered, never fatal to the connection.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use cadence_common::events::CommandReply;
use cadence_common::{SessionCommand, SessionEvent};
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::server::AppContext;
use crate::broadcast::SubscriberId;

/// One outbound message produced in answer to an inbound one
#[derive(Serialize)]
#[serde(untagged)]
enum Outgoing {
    Reply(CommandReply),
    Event(SessionEvent),
}

/// GET /api/v1/ws - upgrade to the WebSocket push channel
pub async fn ws_handler(ws: WebSocketUpgrade, State(ctx): State<AppContext>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, ctx))
}

async fn handle_ws(socket: WebSocket, ctx: AppContext) {
    let (mut sender, mut receiver) = socket.split();

    // Dropped on every exit path below, which unregisters it
    let mut subscription = ctx.session.subscribe();
    let id = subscription.id();
    info!("WebSocket client connected as {}", id);

    let mut heartbeat = tokio::time::interval(ctx.session.heartbeat_interval());
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let outgoing = match incoming {
                    Some(Ok(Message::Text(text))) => dispatch(&ctx, id, &text).await,
                    Some(Ok(Message::Binary(_))) => Outgoing::Reply(command_error(
                        None,
                        "invalid_input",
                        "binary messages are not supported".to_string(),
                    )),
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!("WebSocket {} receive error: {}", id, e);
                        break;
                    }
                };
                if send_json(&mut sender, &outgoing).await.is_err() {
                    break;
                }
            }
            event = subscription.recv() => {
                match event {
                    Some(event) => {
                        if send_json(&mut sender, &event).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        warn!("WebSocket {} subscription closed by broadcaster", id);
                        break;
                    }
                }
            }
            _ = heartbeat.tick() => {
                let event = SessionEvent::Heartbeat { timestamp: ctx.session.now() };
                if send_json(&mut sender, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = sender.close().await;
    info!("WebSocket client {} disconnected", id);
}

/// Parse and apply one inbound text message
async fn dispatch(ctx: &AppContext, id: SubscriberId, text: &str) -> Outgoing {
    let command: SessionCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            debug!("WebSocket {} sent malformed command: {}", id, e);
            return Outgoing::Reply(command_error(None, "invalid_input", e.to_string()));
        }
    };

    if command == SessionCommand::Heartbeat {
        return Outgoing::Event(SessionEvent::Heartbeat {
            timestamp: ctx.session.now(),
        });
    }

    let name = command.name();
    match ctx.session.apply(command, Some(id)).await {
        Ok(state) => Outgoing::Reply(CommandReply::CommandResult {
            command: name.to_string(),
            state,
        }),
        Err(e) => Outgoing::Reply(command_error(Some(name), e.kind(), e.to_string())),
    }
}

fn command_error(command: Option<&str>, error: &str, message: String) -> CommandReply {
    CommandReply::CommandError {
        command: command.map(str::to_string),
        error: error.to_string(),
        message,
    }
}

async fn send_json<S, T>(sender: &mut S, value: &T) -> Result<(), ()>
where
    S: futures::Sink<Message> + Unpin,
    T: Serialize,
{
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize WebSocket message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json)).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{PlaybackSession, SessionOptions};
    use std::sync::Arc;

    fn context() -> AppContext {
        AppContext::new(Arc::new(PlaybackSession::new(SessionOptions::default())))
    }

    fn to_value(outgoing: &Outgoing) -> serde_json::Value {
        serde_json::to_value(outgoing).unwrap()
    }

    #[tokio::test]
    async fn test_malformed_json_yields_command_error() {
        let ctx = context();
        let sub = ctx.session.subscribe();
        let reply = to_value(&dispatch(&ctx, sub.id(), "{not json").await);
        assert_eq!(reply["type"], "command_error");
        assert_eq!(reply["error"], "invalid_input");
        assert!(reply["command"].is_null());
    }

    #[tokio::test]
    async fn test_rejected_command_names_itself() {
        let ctx = context();
        let sub = ctx.session.subscribe();
        let reply = to_value(&dispatch(&ctx, sub.id(), r#"{"type":"next"}"#).await);
        assert_eq!(reply["type"], "command_error");
        assert_eq!(reply["command"], "next");
        assert_eq!(reply["error"], "no_active_track");
    }

    #[tokio::test]
    async fn test_command_result_carries_state() {
        let ctx = context();
        let sub = ctx.session.subscribe();
        let reply = to_value(&dispatch(&ctx, sub.id(), r#"{"type":"set_volume","level":140}"#).await);
        assert_eq!(reply["type"], "command_result");
        assert_eq!(reply["command"], "set_volume");
        assert_eq!(reply["state"]["volume"], 100);
    }

    #[tokio::test]
    async fn test_heartbeat_is_answered_with_heartbeat() {
        let ctx = context();
        let sub = ctx.session.subscribe();
        let reply = to_value(&dispatch(&ctx, sub.id(), r#"{"type":"heartbeat"}"#).await);
        assert_eq!(reply["type"], "heartbeat");
    }
}
