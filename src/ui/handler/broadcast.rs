//! Broadcaster and viewer WebSocket handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::stream::StreamExt;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionIdFactory, ConnectionInfo, Role},
    ui::state::AppState,
};

use super::pusher_loop;

/// Handler for the single broadcaster connection.
///
/// Incoming text frames are relayed to all viewers. A second broadcaster
/// connection evicts the first (evict-and-replace).
pub async fn broadcast_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_broadcast_socket(socket, state))
}

async fn handle_broadcast_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    let evicted = state
        .registry
        .register(ConnectionInfo::new(connection_id, Role::Broadcaster), tx)
        .await;
    if let Some(previous) = evicted {
        tracing::info!(
            "New broadcaster replaced previous connection: old_connection_id={}",
            previous
        );
    }
    tracing::info!("Broadcaster connected: connection_id={}", connection_id);

    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("Broadcaster WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if let Err(error) = state_clone.relay_frame_usecase.execute(&text).await {
                        tracing::warn!("Dropping malformed frame: {}", error);
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Broadcaster requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.registry.unregister(&connection_id).await;
    state.relay_frame_usecase.stream_ended().await;
    tracing::info!("Broadcaster disconnected: connection_id={}", connection_id);
}

/// Handler for viewer connections.
///
/// Viewers only receive relayed frames; anything they send is ignored.
pub async fn view_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_view_socket(socket, state))
}

async fn handle_view_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    state
        .registry
        .register(ConnectionInfo::new(connection_id, Role::Viewer), tx)
        .await;
    tracing::info!("Viewer connected: connection_id={}", connection_id);

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.registry.unregister(&connection_id).await;
    tracing::info!("Viewer disconnected: connection_id={}", connection_id);
}
