//! WebSocket fan-out of session snapshots

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::services::session::SessionEvent;
use crate::services::SessionManager;

/// Send the current snapshot, then forward every published one until the
/// client goes away
pub async fn forward_session(socket: WebSocket, manager: SessionManager) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the snapshot so no update falls in between
    let mut rx = manager.subscribe();

    tracing::info!(
        session = manager.name(),
        subscribers = manager.subscriber_count(),
        "New WebSocket client connected"
    );

    let initial = manager.snapshot();
    let initial = serde_json::to_string(&SessionEvent {
        msg_type: "session",
        timestamp: chrono::Utc::now().timestamp_millis(),
        session: &initial,
    });

    let send_task = tokio::spawn(async move {
        if let Ok(json) = initial {
            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }

        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if sender.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                // A slow client only needs the latest state
                Err(RecvError::Lagged(skipped)) => {
                    debug!("WebSocket client lagged, skipped {} snapshots", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Handle incoming messages (ping/pong, close)
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("WebSocket client requested close");
                    break;
                }
                Err(e) => {
                    debug!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete (client disconnect or error)
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    debug!(session = manager.name(), "WebSocket client disconnected");
}
