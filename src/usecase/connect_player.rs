//! プレイヤー接続 usecase
//!
//! クイズ接続の確立時にプレイヤー台帳へ登録し、状態スナップショットを
//! 返送します。再接続では既存の残高・脱落フラグを引き継ぎ、新しい賭け金を
//! 配ることはありません。

use std::sync::Arc;

use crate::common::time::get_unix_timestamp_ms;
use crate::domain::{
    ConnectionId, ConnectionIdFactory, ConnectionInfo, ConnectionRegistry, DisplayName, PlayerId,
    QuizError, RegistryChannel, Timestamp,
};
use crate::infrastructure::dto::quiz::QuizServerMessage;
use crate::usecase::SharedGameSession;

/// プレイヤー接続 usecase
pub struct ConnectPlayerUseCase {
    session: SharedGameSession,
    registry: Arc<dyn ConnectionRegistry>,
}

impl ConnectPlayerUseCase {
    pub fn new(session: SharedGameSession, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { session, registry }
    }

    /// プレイヤー接続を確立する
    ///
    /// 同一プレイヤーの既存接続があれば退去させます
    /// （single-active-session-per-player）。登録後、game_state
    /// スナップショットを新しい接続へ送ります。
    ///
    /// # Errors
    ///
    /// プレイヤー台帳の参照に失敗した場合は `QuizError` を返します。
    pub async fn execute(
        &self,
        player_id: PlayerId,
        display_name: DisplayName,
        channel: RegistryChannel,
    ) -> Result<ConnectionId, QuizError> {
        if let Some(previous) = self.registry.find_player_connection(&player_id).await {
            tracing::info!(
                "Replacing existing player connection: player_id={}, connection_id={}",
                player_id,
                previous
            );
            self.registry.unregister(&previous).await;
        }

        let connection_id = ConnectionIdFactory::generate();
        self.registry
            .register(
                ConnectionInfo::for_player(connection_id, player_id.clone()),
                channel,
            )
            .await;

        let now = Timestamp::new(get_unix_timestamp_ms());
        let state = {
            let mut session = self.session.lock().await;
            session.get_or_create_player(player_id.clone(), display_name);
            session.game_state_for(&player_id, now)?
        };

        let message = QuizServerMessage::game_state(&state);
        match serde_json::to_string(&message) {
            Ok(json) => {
                if let Err(error) = self.registry.push_to(&connection_id, &json).await {
                    tracing::warn!(
                        "Failed to push game state: player_id={}, error={}",
                        player_id,
                        error
                    );
                }
            }
            Err(error) => {
                tracing::error!("Failed to serialize game state: {}", error);
            }
        }

        tracing::info!(
            "Player connected: player_id={}, connection_id={}",
            player_id,
            connection_id
        );
        Ok(connection_id)
    }
}
