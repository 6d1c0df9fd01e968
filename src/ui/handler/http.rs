//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    domain::{GamePhase, Role},
    infrastructure::dto::quiz::SessionSnapshotDto,
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint to get current session state (for testing purposes)
pub async fn debug_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshotDto> {
    let (game_active, live_question_id, queued_questions, players, remaining_players, jackpot) = {
        let session = state.session.lock().await;
        (
            session.phase() == GamePhase::Active,
            session
                .live_question()
                .map(|live| live.id().as_str().to_string()),
            session.queue_len(),
            session.player_count(),
            session.remaining_players(),
            session.jackpot().to_f64(),
        )
    };

    Json(SessionSnapshotDto {
        game_active,
        live_question_id,
        queued_questions,
        players,
        remaining_players,
        jackpot,
        broadcaster_connected: state.registry.count_role(Role::Broadcaster).await > 0,
        viewers: state.registry.count_role(Role::Viewer).await,
        chat_participants: state.registry.count_role(Role::ChatParticipant).await,
        quiz_host_connected: state.registry.count_role(Role::QuizHost).await > 0,
        quiz_players: state.registry.count_role(Role::QuizPlayer).await,
    })
}
