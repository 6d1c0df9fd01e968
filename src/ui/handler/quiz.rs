//! Quiz host and player WebSocket handlers.

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
    domain::{
        ConnectionIdFactory, ConnectionInfo, DisplayName, PlayerId, QuestionId, QuestionPlacement,
        QuizError, Role,
    },
    infrastructure::dto::quiz::{HostCommand, PlayerCommand, QuizServerMessage},
    ui::state::AppState,
};

use super::pusher_loop;

/// Serialize a quiz message and queue it on the connection's own channel.
fn reply(tx: &mpsc::UnboundedSender<String>, message: &QuizServerMessage) {
    match serde_json::to_string(message) {
        Ok(json) => {
            // 送信失敗は pusher タスク終了済みを意味するので無視してよい
            let _ = tx.send(json);
        }
        Err(error) => {
            tracing::error!("Failed to serialize quiz reply: {}", error);
        }
    }
}

/// Handler for the single quiz host connection.
///
/// Accepts `submit_question` and `end_game` commands. A second host
/// connection evicts the first (evict-and-replace).
pub async fn quiz_host_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_host_socket(socket, state))
}

async fn handle_host_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    let evicted = state
        .registry
        .register(ConnectionInfo::new(connection_id, Role::QuizHost), tx.clone())
        .await;
    if let Some(previous) = evicted {
        tracing::info!(
            "New quiz host replaced previous connection: old_connection_id={}",
            previous
        );
    }
    tracing::info!("Quiz host connected: connection_id={}", connection_id);

    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("Quiz host WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let command = match serde_json::from_str::<HostCommand>(&text) {
                        Ok(command) => command,
                        Err(e) => {
                            tracing::warn!("Failed to parse host command: {}", e);
                            continue;
                        }
                    };
                    handle_host_command(&state_clone, &tx, command).await;
                }
                Message::Close(_) => {
                    tracing::info!("Quiz host requested close");
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
    tracing::info!("Quiz host disconnected: connection_id={}", connection_id);
}

async fn handle_host_command(
    state: &Arc<AppState>,
    tx: &mpsc::UnboundedSender<String>,
    command: HostCommand,
) {
    match command {
        HostCommand::SubmitQuestion {
            question,
            options,
            correct_index,
            time_limit,
        } => match state
            .submit_question_usecase
            .execute(question, options, correct_index, time_limit)
            .await
        {
            Ok(QuestionPlacement::Live(view)) => {
                reply(
                    tx,
                    &QuizServerMessage::QuestionLive {
                        question: (&view).into(),
                    },
                );
            }
            Ok(QuestionPlacement::Queued { position }) => {
                reply(tx, &QuizServerMessage::QuestionQueued { position });
            }
            Err(error) => {
                tracing::warn!("Question rejected: {}", error);
                reply(tx, &QuizServerMessage::from_error(&error));
            }
        },
        HostCommand::EndGame => {
            // game_ended の配信は usecase 側で行われる
            if let Err(error) = state.end_game_usecase.execute().await {
                tracing::warn!("End game rejected: {}", error);
                reply(tx, &QuizServerMessage::from_error(&error));
            }
        }
    }
}

/// Query parameters for quiz player connection.
///
/// Identity is taken as-is at the connection boundary; an external identity
/// provider is expected to sit in front of this server.
#[derive(Debug, Deserialize)]
pub struct PlayQuery {
    pub user_id: String,
    pub display_name: String,
}

pub async fn quiz_play_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlayQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let player_id = match PlayerId::new(query.user_id.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid user_id '{}': {}", query.user_id, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let display_name = match DisplayName::new(query.display_name.clone()) {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Invalid display_name '{}': {}", query.display_name, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_play_socket(socket, state, player_id, display_name)))
}

async fn handle_play_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    player_id: PlayerId,
    display_name: DisplayName,
) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // 登録・台帳参照・game_state スナップショットの送信まで usecase が行う
    let connection_id = match state
        .connect_player_usecase
        .execute(player_id.clone(), display_name, tx.clone())
        .await
    {
        Ok(connection_id) => connection_id,
        Err(error) => {
            tracing::error!("Failed to connect player '{}': {}", player_id, error);
            return;
        }
    };

    let state_clone = state.clone();
    let player_id_clone = player_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("Quiz player WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let command = match serde_json::from_str::<PlayerCommand>(&text) {
                        Ok(command) => command,
                        Err(e) => {
                            tracing::warn!("Failed to parse player command: {}", e);
                            continue;
                        }
                    };
                    handle_player_command(&state_clone, &tx, &player_id_clone, command).await;
                }
                Message::Close(_) => {
                    tracing::info!("Quiz player '{}' requested close", player_id_clone);
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

    // プレイヤー台帳は残す（再接続で残高・脱落状態を引き継ぐため）
    state.registry.unregister(&connection_id).await;
    tracing::info!(
        "Quiz player disconnected: player_id={}, connection_id={}",
        player_id,
        connection_id
    );
}

async fn handle_player_command(
    state: &Arc<AppState>,
    tx: &mpsc::UnboundedSender<String>,
    player_id: &PlayerId,
    command: PlayerCommand,
) {
    match command {
        PlayerCommand::SubmitBet { question_id, bets } => {
            let qid = match QuestionId::new(question_id.clone()) {
                Ok(qid) => qid,
                Err(_) => {
                    reply(
                        tx,
                        &QuizServerMessage::from_error(&QuizError::StaleQuestion(question_id)),
                    );
                    return;
                }
            };
            match state.submit_bet_usecase.execute(player_id, &qid, bets).await {
                Ok(accepted) => {
                    reply(tx, &QuizServerMessage::bet_confirmed(qid.as_str(), &accepted));
                }
                Err(error) => {
                    tracing::debug!("Bet rejected: player_id={}, error={}", player_id, error);
                    reply(tx, &QuizServerMessage::from_error(&error));
                }
            }
        }
    }
}
