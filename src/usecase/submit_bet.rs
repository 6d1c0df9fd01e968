//! 賭け受付 usecase
//!
//! プレイヤーからの賭けベクトルをドメインのトークン量に変換し、
//! ライブ質問への暫定賭けとして記録します。残高の引き落としは行わず、
//! 精算は締切時の解決に委ねます。

use crate::common::time::get_unix_timestamp_ms;
use crate::domain::{BetAccepted, PlayerId, QuestionId, QuizError, Timestamp, TokenAmount};
use crate::usecase::SharedGameSession;

/// 賭け受付 usecase
pub struct SubmitBetUseCase {
    session: SharedGameSession,
}

impl SubmitBetUseCase {
    pub fn new(session: SharedGameSession) -> Self {
        Self { session }
    }

    /// 賭けを検証して記録する
    ///
    /// 締切前の再提出は前の賭けを上書きします（last-write-wins）。
    ///
    /// # Errors
    ///
    /// 負値・非有限の金額や長さ不一致・残高超過は `QuizError::InvalidWager`、
    /// ライブ質問との不一致・締切超過は `QuizError::StaleQuestion`、
    /// 脱落済みプレイヤーは `QuizError::AlreadyEliminated` を返します。
    pub async fn execute(
        &self,
        player_id: &PlayerId,
        question_id: &QuestionId,
        bets: Vec<f64>,
    ) -> Result<BetAccepted, QuizError> {
        let amounts = bets
            .into_iter()
            .map(TokenAmount::from_f64)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| QuizError::InvalidWager {
                reason: error.to_string(),
            })?;

        let now = Timestamp::new(get_unix_timestamp_ms());
        let accepted = {
            let mut session = self.session.lock().await;
            session.submit_bet(player_id, question_id, amounts, now)?
        };
        tracing::debug!(
            "Bet recorded: player_id={}, question_id={}",
            player_id,
            question_id
        );
        Ok(accepted)
    }
}
