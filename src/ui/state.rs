//! Server state and connection management.

use std::sync::Arc;

use crate::domain::ConnectionRegistry;
use crate::usecase::{
    ConnectPlayerUseCase, EndGameUseCase, RelayFrameUseCase, SendChatUseCase, SharedGameSession,
    SubmitBetUseCase, SubmitQuestionUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectionRegistry（接続管理の抽象化）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// 単一のゲームセッション（/debug/session 用）
    pub session: SharedGameSession,
    /// ConnectPlayerUseCase（プレイヤー接続のユースケース）
    pub connect_player_usecase: Arc<ConnectPlayerUseCase>,
    /// SubmitQuestionUseCase（質問出題のユースケース）
    pub submit_question_usecase: Arc<SubmitQuestionUseCase>,
    /// SubmitBetUseCase（賭け受付のユースケース）
    pub submit_bet_usecase: Arc<SubmitBetUseCase>,
    /// EndGameUseCase（ゲーム終了のユースケース）
    pub end_game_usecase: Arc<EndGameUseCase>,
    /// RelayFrameUseCase（フレーム中継のユースケース）
    pub relay_frame_usecase: Arc<RelayFrameUseCase>,
    /// SendChatUseCase（チャット送信のユースケース）
    pub send_chat_usecase: Arc<SendChatUseCase>,
}
