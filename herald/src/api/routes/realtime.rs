//! Live event WebSocket route.
//!
//! A client connects to `/ws`, identifies itself with
//! `{"type":"register","recipient_id":"..."}` and then receives JSON frames
//! `{"event":"...","data":{...}}` for that recipient until it disconnects.

use std::time::Duration;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tracing::{debug, warn};

use crate::api::server::AppState;
use crate::realtime::{
    ClientMessage, ConnectionHandle, DEFAULT_CONNECTION_BUFFER, LiveEvent, event_names,
};

/// Heartbeat interval in seconds.
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(live_events_ws))
}

async fn live_events_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

fn encode(event: &LiveEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            warn!("Failed to encode live event: {}", e);
            None
        }
    }
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let registry = state.registry;
    let (mut sender, mut receiver) = socket.split();
    let (handle, mut event_rx) = ConnectionHandle::new(DEFAULT_CONNECTION_BUFFER);
    let connection_id = handle.id();
    debug!(connection = %connection_id, "WebSocket connection established");

    let mut heartbeat_interval =
        tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    // The first tick completes immediately.
    heartbeat_interval.tick().await;
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                            Ok(ClientMessage::Register { recipient_id }) if !recipient_id.trim().is_empty() => {
                                registry.register(handle.clone(), &recipient_id);
                                debug!(connection = %connection_id, recipient_id = %recipient_id, "Connection registered");
                                LiveEvent::new(event_names::REGISTERED, json!({ "recipientId": recipient_id }))
                            }
                            Ok(ClientMessage::Register { .. }) => {
                                LiveEvent::new(event_names::ERROR, json!({ "message": "recipient_id must not be empty" }))
                            }
                            Err(e) => {
                                debug!("Failed to decode client message: {}", e);
                                LiveEvent::new(event_names::ERROR, json!({ "message": format!("invalid message: {}", e) }))
                            }
                        };
                        if let Some(frame) = encode(&reply)
                            && sender.send(frame).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        awaiting_pong = false;
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                if let Some(frame) = encode(&event)
                    && let Err(e) = sender.send(frame).await
                {
                    debug!("Failed to send live event, closing connection: {}", e);
                    break;
                }
            }

            _ = heartbeat_interval.tick() => {
                if awaiting_pong {
                    debug!(connection = %connection_id, "Client failed to respond to Ping, closing connection");
                    break;
                }
                if sender.send(Message::Ping(Bytes::new())).await.is_ok() {
                    awaiting_pong = true;
                } else {
                    break;
                }
            }
        }
    }

    if let Some(recipient_id) = registry.unregister(connection_id) {
        debug!(connection = %connection_id, recipient_id = %recipient_id, "Connection unregistered");
    }
}
