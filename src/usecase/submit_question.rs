//! 質問出題 usecase
//!
//! ホストからの質問を検証し、ライブ化またはキュー登録します。
//! ライブ化した場合はプレイヤーへの告知と締切タイマーの起動まで行います。

use std::sync::Arc;

use crate::common::time::get_unix_timestamp_ms;
use crate::domain::{Question, QuestionIdFactory, QuestionPlacement, QuizError, Timestamp};
use crate::usecase::{ResolveQuestionUseCase, SharedGameSession};

/// 質問出題 usecase
pub struct SubmitQuestionUseCase {
    session: SharedGameSession,
    resolver: Arc<ResolveQuestionUseCase>,
}

impl SubmitQuestionUseCase {
    pub fn new(session: SharedGameSession, resolver: Arc<ResolveQuestionUseCase>) -> Self {
        Self { session, resolver }
    }

    /// 質問を検証して配置する
    ///
    /// ライブ質問が無ければ即時ライブ化し、あれば FIFO キューに積みます。
    /// 戻り値の配置結果をもとに、呼び出し元（ホストのハンドラ）が確認
    /// メッセージを返信します。
    ///
    /// # Errors
    ///
    /// 検証に失敗した場合は `QuizError::InvalidQuestion`、ゲーム終了後は
    /// `QuizError::GameEnded` を返します。
    pub async fn execute(
        &self,
        prompt: String,
        options: Vec<String>,
        correct_index: usize,
        time_limit_secs: u32,
    ) -> Result<QuestionPlacement, QuizError> {
        let now = Timestamp::new(get_unix_timestamp_ms());
        let question_id =
            QuestionIdFactory::generate().map_err(|error| QuizError::InvalidQuestion {
                reason: error.to_string(),
            })?;
        let question = Question::new(
            question_id,
            prompt,
            options,
            correct_index,
            time_limit_secs,
            now,
        )?;

        let placement = {
            let mut session = self.session.lock().await;
            session.submit_question(question, now)?
        };

        match &placement {
            QuestionPlacement::Live(view) => {
                tracing::info!("Question went live: question_id={}", view.id);
                self.resolver.announce_live(view).await;
                self.resolver.clone().schedule(view);
            }
            QuestionPlacement::Queued { position } => {
                tracing::info!("Question queued: position={}", position);
            }
        }

        Ok(placement)
    }
}
