//! ゲーム終了 usecase
//!
//! ホストの指示によりゲームを終了し、最終順位表を全員へ配信します。

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, FinalStandings, QuizError, Role};
use crate::infrastructure::dto::quiz::QuizServerMessage;
use crate::usecase::SharedGameSession;

/// ゲーム終了 usecase
pub struct EndGameUseCase {
    session: SharedGameSession,
    registry: Arc<dyn ConnectionRegistry>,
}

impl EndGameUseCase {
    pub fn new(session: SharedGameSession, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { session, registry }
    }

    /// ゲームを終了し、最終順位表を配信する
    ///
    /// # Errors
    ///
    /// 既に終了している場合は `QuizError::GameEnded` を返します。
    pub async fn execute(&self) -> Result<FinalStandings, QuizError> {
        let standings = {
            let mut session = self.session.lock().await;
            session.end_game()?
        };
        tracing::info!(
            "Game ended: players={}, jackpot={}",
            standings.rankings.len(),
            standings.jackpot
        );

        let message = QuizServerMessage::GameEnded {
            standings: (&standings).into(),
        };
        match serde_json::to_string(&message) {
            Ok(json) => {
                self.registry.broadcast_to(Role::QuizPlayer, &json).await;
                self.registry.broadcast_to(Role::QuizHost, &json).await;
            }
            Err(error) => {
                tracing::error!("Failed to serialize game_ended message: {}", error);
            }
        }

        Ok(standings)
    }
}
