//! WebSocket endpoint for real-time fan-out to viewers.
//!
//! Viewers connect to `GET /ws` and receive a one-way event stream:
//!
//! 1. A `snapshot` frame with the current session state, sent immediately so
//!    late joiners can reconcile without a REST round trip.
//! 2. Every subsequent session event (`movieSelected`, `startRatingSession`,
//!    `idle`, `ratingUpdate`, `ratingCountUpdate`, `ratingClear`) as emitted.
//!
//! Delivery is best-effort: a viewer that cannot keep up with the broadcast
//! channel capacity loses the oldest events and is expected to reconcile via
//! `GET /api/status`. Client messages other than control frames are ignored.
//!
//! # Frame Format
//!
//! **Server → Client (snapshot):**
//! ```json
//! {"event":"snapshot","payload":{"currentMovieId":7,"ratingOpen":true}}
//! ```
//!
//! **Server → Client (session event):**
//! ```json
//! {"event":"ratingUpdate","payload":{"movieId":7,"average":4.5}}
//! ```

use crate::state::AppState;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use cinerate_core::SessionSnapshot;
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// Frames the server sends that are not session events.
///
/// Session events serialize themselves (`cinerate_core::SessionEvent`); this
/// enum covers the connection-scoped frames in the same envelope shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ServerFrame {
    /// The reconciliation snapshot sent as the first frame
    Snapshot(SessionSnapshot),
}

/// Upgrade to a WebSocket viewer connection.
#[allow(clippy::unused_async)] // Axum handler signature requires async
pub async fn handle(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("WebSocket connection requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the WebSocket connection lifecycle.
///
/// Subscribes to the broadcaster *before* reading the snapshot, so no event
/// can fall between the snapshot and the stream. Then runs two tasks:
/// a sender streaming broadcast events and a receiver draining (and mostly
/// ignoring) client messages.
async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("WebSocket connection established");

    let mut event_rx = state.broadcaster.subscribe();
    let snapshot = state.session.snapshot().await;

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        // Snapshot first, always
        match serde_json::to_string(&ServerFrame::Snapshot(snapshot)) {
            Ok(json) => {
                if sender.send(Message::Text(json)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to serialize snapshot");
                return;
            }
        }

        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let message = match serde_json::to_string(&event) {
                        Ok(json) => Message::Text(json),
                        Err(e) => {
                            error!(error = %e, "Failed to serialize event");
                            continue;
                        }
                    };

                    if sender.send(message).await.is_err() {
                        // Client disconnected
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    // Best-effort delivery: the viewer reconciles via /api/status
                    warn!(missed, "viewer lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }

        debug!("WebSocket send task terminated");
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    // Viewers are receive-only
                    debug!(len = text.len(), "Ignoring client text message");
                }
                Message::Binary(_) => {
                    warn!("Received unexpected binary message");
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Axum answers pings automatically
                    debug!("Received keep-alive frame");
                }
                Message::Close(_) => {
                    info!("Client requested close");
                    break;
                }
            }
        }

        debug!("WebSocket receive task terminated");
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        },
        _ = (&mut recv_task) => {
            send_task.abort();
        },
    }

    info!("WebSocket connection closed");
}
