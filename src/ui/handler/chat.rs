//! Chat WebSocket handler.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::stream::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionIdFactory, ConnectionInfo, Role},
    infrastructure::dto::chat::ChatMessageIn,
    ui::state::AppState,
};

use super::pusher_loop;

/// Query parameters for chat connection
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub user: String,
}

pub async fn chat_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChatQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = query.user.trim().to_string();
    if user.is_empty() {
        tracing::warn!("Rejected chat connection without user label");
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, state, user)))
}

async fn handle_chat_socket(socket: WebSocket, state: Arc<AppState>, user: String) {
    let (sender, mut receiver) = socket.split();
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    state
        .registry
        .register(
            ConnectionInfo::new(connection_id, Role::ChatParticipant),
            tx,
        )
        .await;
    tracing::info!(
        "Chat participant connected: user={}, connection_id={}",
        user,
        connection_id
    );

    let state_clone = state.clone();
    let user_clone = user.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("Chat WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // 本文内の user は無視し、ハンドシェイク時の表示名を使う
                    let incoming = match serde_json::from_str::<ChatMessageIn>(&text) {
                        Ok(incoming) => incoming,
                        Err(e) => {
                            tracing::warn!("Failed to parse chat message as JSON: {}", e);
                            continue;
                        }
                    };
                    if let Err(error) = state_clone
                        .send_chat_usecase
                        .execute(&user_clone, incoming.text)
                        .await
                    {
                        tracing::warn!("Rejected chat message from '{}': {}", user_clone, error);
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Chat participant '{}' requested close", user_clone);
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
    tracing::info!(
        "Chat participant disconnected: user={}, connection_id={}",
        user,
        connection_id
    );
}
