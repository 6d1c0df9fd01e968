//! 質問解決 usecase
//!
//! ライブ質問の締切タイマーの起動と、締切到達時の精算・結果配信を担います。
//! 解決はタイマー駆動であり、クライアントから直接起動されることはありません。

use std::sync::Arc;
use std::time::Duration;

use crate::common::time::get_unix_timestamp_ms;
use crate::domain::{
    ConnectionRegistry, LiveQuestionView, QuestionId, QuizError, Resolution, Role, Timestamp,
};
use crate::infrastructure::dto::quiz::QuizServerMessage;
use crate::usecase::SharedGameSession;

/// 質問解決 usecase
pub struct ResolveQuestionUseCase {
    session: SharedGameSession,
    registry: Arc<dyn ConnectionRegistry>,
}

impl ResolveQuestionUseCase {
    pub fn new(session: SharedGameSession, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { session, registry }
    }

    /// ライブ化した質問を全プレイヤーへ告知
    pub async fn announce_live(&self, view: &LiveQuestionView) {
        let message = QuizServerMessage::NewQuestion {
            question: view.into(),
        };
        if let Some(json) = encode(&message) {
            let delivered = self.registry.broadcast_to(Role::QuizPlayer, &json).await;
            tracing::info!(
                "Announced live question: question_id={}, players={}",
                view.id,
                delivered
            );
        }
    }

    /// 締切タイマーを起動
    ///
    /// 制限時間だけ待ってから解決を実行するタスクを spawn します。解決で
    /// キュー先頭が昇格した場合は、その質問のタイマーも続けて起動します。
    /// 解決済み・ゲーム終了後の発火は StaleQuestion / GameEnded として
    /// 無害に吸収されます。
    pub fn schedule(self: Arc<Self>, view: &LiveQuestionView) {
        let question_id = view.id.clone();
        let time_limit_secs = view.time_limit_secs;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(u64::from(time_limit_secs))).await;
            match self.execute(&question_id).await {
                Ok(Some(next)) => {
                    self.clone().schedule(&next);
                }
                Ok(None) => {}
                Err(QuizError::StaleQuestion(_)) | Err(QuizError::GameEnded) => {
                    tracing::debug!(
                        "Deadline timer fired for settled question: question_id={}",
                        question_id
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        "Question resolution failed: question_id={}, error={}",
                        question_id,
                        error
                    );
                }
            }
        });
    }

    /// ライブ質問を精算し、結果を配信する
    ///
    /// キュー先頭が昇格した場合はそのビューを返します。呼び出し元（通常は
    /// 締切タイマー）が昇格した質問のタイマーを起動する責務を持ちます。
    ///
    /// # Errors
    ///
    /// 指定 ID がライブ質問と一致しない場合は `QuizError::StaleQuestion`、
    /// ゲーム終了後は `QuizError::GameEnded` を返します。
    pub async fn execute(
        &self,
        question_id: &QuestionId,
    ) -> Result<Option<LiveQuestionView>, QuizError> {
        let now = Timestamp::new(get_unix_timestamp_ms());
        let resolution = {
            let mut session = self.session.lock().await;
            session.resolve(question_id, now)?
        };
        tracing::info!(
            "Resolved question: question_id={}, eliminated={}, remaining={}, jackpot={}",
            resolution.question_id,
            resolution.eliminated.len(),
            resolution.remaining_players,
            resolution.jackpot
        );
        Ok(self.dispatch(resolution).await)
    }

    /// 解決結果をロール別に配信し、昇格した質問のビューを返す
    async fn dispatch(&self, resolution: Resolution) -> Option<LiveQuestionView> {
        if let Some(json) = encode(&QuizServerMessage::results(&resolution)) {
            self.registry.broadcast_to(Role::QuizPlayer, &json).await;
            self.registry.broadcast_to(Role::QuizHost, &json).await;
        }

        // 脱落者には個別通知を送る。接続は閉じず、観戦は継続できる。
        if let Some(json) = encode(&QuizServerMessage::eliminated(resolution.jackpot)) {
            for player_id in &resolution.eliminated {
                if let Some(connection_id) =
                    self.registry.find_player_connection(player_id).await
                {
                    if let Err(error) = self.registry.push_to(&connection_id, &json).await {
                        tracing::warn!(
                            "Failed to notify eliminated player: player_id={}, error={}",
                            player_id,
                            error
                        );
                    }
                }
            }
        }

        if let Some(standings) = &resolution.standings {
            let message = QuizServerMessage::GameEnded {
                standings: standings.into(),
            };
            if let Some(json) = encode(&message) {
                self.registry.broadcast_to(Role::QuizPlayer, &json).await;
                self.registry.broadcast_to(Role::QuizHost, &json).await;
            }
            return None;
        }

        if let Some(next) = resolution.next {
            self.announce_live(&next).await;
            return Some(next);
        }

        if let Some(json) = encode(&QuizServerMessage::ReadyForQuestion {
            remaining_players: resolution.remaining_players,
        }) {
            self.registry.broadcast_to(Role::QuizHost, &json).await;
        }
        None
    }
}

fn encode(message: &QuizServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(error) => {
            tracing::error!("Failed to serialize quiz message: {}", error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DisplayName, GameSession, PlayerId, Question, QuestionIdFactory, TokenAmount,
    };
    use crate::usecase::test_support::MockRegistry;
    use tokio::sync::Mutex;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 解決結果（results）がプレイヤーとホストの両方に配信されること
    // - 脱落者への個別通知
    // - キューが空のとき ready_for_question がホストに届くこと
    // - 自動終了時に game_ended が配信されること
    // - 二重発火が StaleQuestion として無害に終わること
    // ========================================

    fn tokens(v: f64) -> TokenAmount {
        TokenAmount::from_f64(v).unwrap()
    }

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s.to_string()).unwrap()
    }

    async fn setup(
        player_ids: &[&str],
        correct_index: usize,
    ) -> (
        Arc<ResolveQuestionUseCase>,
        SharedGameSession,
        Arc<MockRegistry>,
        QuestionId,
    ) {
        let now = Timestamp::new(get_unix_timestamp_ms());
        let mut session = GameSession::new(now);
        for id in player_ids {
            session.get_or_create_player(pid(id), DisplayName::new(id.to_string()).unwrap());
        }
        let question = Question::new(
            QuestionIdFactory::generate().unwrap(),
            "Which color?".to_string(),
            vec!["Red".to_string(), "Blue".to_string()],
            correct_index,
            30,
            now,
        )
        .unwrap();
        let question_id = question.id().clone();
        session.submit_question(question, now).unwrap();

        let session: SharedGameSession = Arc::new(Mutex::new(session));
        let registry = Arc::new(MockRegistry::new());
        let resolver = Arc::new(ResolveQuestionUseCase::new(
            Arc::clone(&session),
            registry.clone() as Arc<dyn ConnectionRegistry>,
        ));
        (resolver, session, registry, question_id)
    }

    #[tokio::test]
    async fn test_execute_broadcasts_results_to_players_and_host() {
        // テスト項目: 解決結果がプレイヤーとホストの両ロールに配信される
        // given (前提条件): 3 人が賭けたライブ質問
        let (resolver, session, registry, question_id) = setup(&["alice", "bob", "carol"], 1).await;
        {
            let mut session = session.lock().await;
            let now = Timestamp::new(get_unix_timestamp_ms());
            for id in ["alice", "bob", "carol"] {
                session
                    .submit_bet(&pid(id), &question_id, vec![tokens(0.0), tokens(5.0)], now)
                    .unwrap();
            }
        }

        // when (操作):
        let next = resolver.execute(&question_id).await.unwrap();

        // then (期待する結果): results が両ロールへ、全員生存・キュー空なので
        // ホストに残存人数付きの ready_for_question が届く
        assert!(next.is_none());
        let player_messages = registry.broadcasts_to(Role::QuizPlayer).await;
        let host_messages = registry.broadcasts_to(Role::QuizHost).await;
        assert!(player_messages.iter().any(|m| m.contains(r#""type":"results""#)));
        assert!(host_messages.iter().any(|m| m.contains(r#""type":"results""#)));
        let ready = host_messages
            .iter()
            .find(|m| m.contains(r#""type":"ready_for_question""#))
            .unwrap();
        assert!(ready.contains(r#""remaining_players":3"#));
    }

    #[tokio::test]
    async fn test_execute_notifies_eliminated_player() {
        // テスト項目: 脱落者の接続に eliminated 通知が個別に届く
        // given (前提条件): alice のみ不正解に賭けた状態
        let (resolver, session, registry, question_id) = setup(&["alice", "bob", "carol"], 1).await;
        let alice_conn = registry.attach_player(pid("alice")).await;
        {
            let mut session = session.lock().await;
            let now = Timestamp::new(get_unix_timestamp_ms());
            session
                .submit_bet(&pid("alice"), &question_id, vec![tokens(5.0), tokens(0.0)], now)
                .unwrap();
            for id in ["bob", "carol"] {
                session
                    .submit_bet(&pid(id), &question_id, vec![tokens(0.0), tokens(5.0)], now)
                    .unwrap();
            }
        }

        // when (操作):
        resolver.execute(&question_id).await.unwrap();

        // then (期待する結果):
        let pushed = registry.pushes_to(&alice_conn).await;
        assert!(pushed.iter().any(|m| m.contains(r#""type":"eliminated""#)));
    }

    #[tokio::test]
    async fn test_execute_broadcasts_game_ended_on_auto_end() {
        // テスト項目: 残り 1 人での自動終了時に game_ended が配信される
        // given (前提条件): 2 人のうち alice が不正解
        let (resolver, session, registry, question_id) = setup(&["alice", "bob"], 1).await;
        {
            let mut session = session.lock().await;
            let now = Timestamp::new(get_unix_timestamp_ms());
            session
                .submit_bet(&pid("alice"), &question_id, vec![tokens(10.0), tokens(0.0)], now)
                .unwrap();
            session
                .submit_bet(&pid("bob"), &question_id, vec![tokens(0.0), tokens(20.0)], now)
                .unwrap();
        }

        // when (操作):
        let next = resolver.execute(&question_id).await.unwrap();

        // then (期待する結果):
        assert!(next.is_none());
        let player_messages = registry.broadcasts_to(Role::QuizPlayer).await;
        assert!(player_messages
            .iter()
            .any(|m| m.contains(r#""type":"game_ended""#)));
    }

    #[tokio::test]
    async fn test_execute_promotes_queued_question() {
        // テスト項目: 解決後にキュー先頭が昇格し new_question が配信される
        // given (前提条件): ライブ質問の後ろに 1 問キュー済み
        let (resolver, session, registry, question_id) = setup(&["alice", "bob", "carol"], 0).await;
        {
            let mut session = session.lock().await;
            let now = Timestamp::new(get_unix_timestamp_ms());
            let queued = Question::new(
                QuestionIdFactory::generate().unwrap(),
                "Second?".to_string(),
                vec!["Yes".to_string(), "No".to_string()],
                0,
                30,
                now,
            )
            .unwrap();
            session.submit_question(queued, now).unwrap();
            for id in ["alice", "bob", "carol"] {
                session
                    .submit_bet(&pid(id), &question_id, vec![tokens(5.0), tokens(0.0)], now)
                    .unwrap();
            }
        }

        // when (操作):
        let next = resolver.execute(&question_id).await.unwrap();

        // then (期待する結果): 昇格した質問のビューが返り、new_question が届く
        assert_eq!(next.unwrap().prompt, "Second?");
        let player_messages = registry.broadcasts_to(Role::QuizPlayer).await;
        assert!(player_messages
            .iter()
            .any(|m| m.contains(r#""type":"new_question""#) && m.contains("Second?")));
    }

    #[tokio::test]
    async fn test_execute_double_fire_is_stale() {
        // テスト項目: 同じ質問の二重解決は StaleQuestion になる
        // given (前提条件): 一度解決済みの質問
        let (resolver, session, _registry, question_id) = setup(&["alice", "bob", "carol"], 0).await;
        {
            let mut session = session.lock().await;
            let now = Timestamp::new(get_unix_timestamp_ms());
            for id in ["alice", "bob", "carol"] {
                session
                    .submit_bet(&pid(id), &question_id, vec![tokens(5.0), tokens(0.0)], now)
                    .unwrap();
            }
        }
        resolver.execute(&question_id).await.unwrap();

        // when (操作):
        let result = resolver.execute(&question_id).await;

        // then (期待する結果):
        assert!(matches!(result, Err(QuizError::StaleQuestion(_))));
    }
}
