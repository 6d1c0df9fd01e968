//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::domain::ConnectionRegistry;
use crate::usecase::{
    ConnectPlayerUseCase, EndGameUseCase, RelayFrameUseCase, SendChatUseCase, SharedGameSession,
    SubmitBetUseCase, SubmitQuestionUseCase,
};

use super::{
    handler::{
        broadcast_handler, chat_handler, debug_session, health_check, quiz_host_handler,
        quiz_play_handler, view_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Broadcast relay & quiz server
///
/// This struct encapsulates the server configuration and provides methods to
/// run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     registry,
///     session,
///     connect_player_usecase,
///     submit_question_usecase,
///     submit_bet_usecase,
///     end_game_usecase,
///     relay_frame_usecase,
///     send_chat_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// ConnectionRegistry（接続管理の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// 単一のゲームセッション
    session: SharedGameSession,
    /// ConnectPlayerUseCase（プレイヤー接続のユースケース）
    connect_player_usecase: Arc<ConnectPlayerUseCase>,
    /// SubmitQuestionUseCase（質問出題のユースケース）
    submit_question_usecase: Arc<SubmitQuestionUseCase>,
    /// SubmitBetUseCase（賭け受付のユースケース）
    submit_bet_usecase: Arc<SubmitBetUseCase>,
    /// EndGameUseCase（ゲーム終了のユースケース）
    end_game_usecase: Arc<EndGameUseCase>,
    /// RelayFrameUseCase（フレーム中継のユースケース）
    relay_frame_usecase: Arc<RelayFrameUseCase>,
    /// SendChatUseCase（チャット送信のユースケース）
    send_chat_usecase: Arc<SendChatUseCase>,
}

impl Server {
    /// Create a new Server instance
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        session: SharedGameSession,
        connect_player_usecase: Arc<ConnectPlayerUseCase>,
        submit_question_usecase: Arc<SubmitQuestionUseCase>,
        submit_bet_usecase: Arc<SubmitBetUseCase>,
        end_game_usecase: Arc<EndGameUseCase>,
        relay_frame_usecase: Arc<RelayFrameUseCase>,
        send_chat_usecase: Arc<SendChatUseCase>,
    ) -> Self {
        Self {
            registry,
            session,
            connect_player_usecase,
            submit_question_usecase,
            submit_bet_usecase,
            end_game_usecase,
            relay_frame_usecase,
            send_chat_usecase,
        }
    }

    /// Run the broadcast relay & quiz server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            registry: self.registry,
            session: self.session,
            connect_player_usecase: self.connect_player_usecase,
            submit_question_usecase: self.submit_question_usecase,
            submit_bet_usecase: self.submit_bet_usecase,
            end_game_usecase: self.end_game_usecase,
            relay_frame_usecase: self.relay_frame_usecase,
            send_chat_usecase: self.send_chat_usecase,
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws/broadcast", get(broadcast_handler))
            .route("/ws/view", get(view_handler))
            .route("/ws/chat", get(chat_handler))
            .route("/ws/quiz/host", get(quiz_host_handler))
            .route("/ws/quiz/play", get(quiz_play_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/debug/session", get(debug_session))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "Broadcast relay & quiz server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Broadcast: ws://{}/ws/broadcast", bind_addr);
        tracing::info!("View:      ws://{}/ws/view", bind_addr);
        tracing::info!("Chat:      ws://{}/ws/chat?user=<label>", bind_addr);
        tracing::info!("Quiz host: ws://{}/ws/quiz/host", bind_addr);
        tracing::info!(
            "Quiz play: ws://{}/ws/quiz/play?user_id=<id>&display_name=<label>",
            bind_addr
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
