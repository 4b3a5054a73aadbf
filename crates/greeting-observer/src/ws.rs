//! `WebSocket` handler for live slot updates.
//!
//! Clients connect to `GET /ws/greeting`. The first frame carries the
//! slot's current [`SlotSnapshot`] as `{"snapshot": ...}`, so a page that
//! connects late or reconnects catches up immediately. After that, each
//! slot mutation arrives as one JSON [`SlotUpdate`]. Both shapes carry a
//! `snapshot` field. Lagging clients skip ahead.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use greeting_core::DisplaySlot;
use greeting_types::{SlotSnapshot, SlotUpdate};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::error::ObserverError;
use crate::state::AppState;

/// Upgrade to a `WebSocket` and stream slot updates.
///
/// # Route
///
/// `GET /ws/greeting`
pub async fn ws_greeting(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// First frame sent to a newly connected client.
#[derive(Serialize)]
struct CurrentSlot<'a> {
    snapshot: &'a SlotSnapshot,
}

fn encode<T: Serialize>(frame: &T) -> Result<Message, ObserverError> {
    let json = serde_json::to_string(frame)?;
    Ok(Message::Text(json.into()))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the snapshot so no mutation falls between.
    let mut rx = state.subscribe();
    let snapshot = state.slot.snapshot();
    match encode(&CurrentSlot { snapshot: &snapshot }) {
        Ok(msg) => {
            if socket.send(msg).await.is_err() {
                debug!("WebSocket client disconnected (initial send failed)");
                return;
            }
        }
        Err(e) => warn!(error = %e, "Failed to encode current slot"),
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(update) => {
                        let msg = match encode(&update) {
                            Ok(m) => m,
                            Err(e) => {
                                warn!(error = %e, "Failed to encode slot update");
                                continue;
                            }
                        };
                        if socket.send(msg).await.is_err() {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Slot update channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}
