//! HTTP and WebSocket endpoint handlers.

mod broadcast;
mod chat;
mod http;
mod quiz;

pub use broadcast::{broadcast_handler, view_handler};
pub use chat::chat_handler;
pub use http::{debug_session, health_check};
pub use quiz::{quiz_host_handler, quiz_play_handler};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{sink::SinkExt, stream::SplitSink};
use tokio::sync::mpsc;

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
///
/// This is the outbound half of every connection: serialized JSON queued by
/// usecases (via the registry) or by the connection's own receive task is
/// written to the socket here.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}
