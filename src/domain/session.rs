//! Game session state machine.
//!
//! One `GameSession` holds everything a broadcast session's quiz mutates:
//! the live question, the FIFO question queue, the player set, committed
//! wagers and the jackpot. All mutating operations go through this type
//! under a single lock, so `submit_bet`, the deadline-fired `resolve` and
//! `submit_question` never interleave partially.

use std::collections::{HashMap, VecDeque};

use super::{
    error::QuizError,
    player::{Player, WagerVector},
    question::{LiveQuestion, Question},
    value_object::{DisplayName, PlayerId, QuestionId, Timestamp, TokenAmount},
};

/// Session lifecycle: accepting questions and wagers, or frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Accepting questions and wagers.
    Active,
    /// No further questions or bets; final results frozen.
    Ended,
}

/// Where a submitted question landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionPlacement {
    /// The question went live immediately.
    Live(LiveQuestionView),
    /// Another question is live; queued at the given 1-based position.
    Queued { position: usize },
}

/// Player-safe projection of a live question (correct index withheld).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveQuestionView {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub time_limit_secs: u32,
    pub started_at: Timestamp,
    pub deadline: Timestamp,
}

impl LiveQuestionView {
    fn from_live(live: &LiveQuestion) -> Self {
        Self {
            id: live.id().clone(),
            prompt: live.question().prompt().to_string(),
            options: live.question().options().to_vec(),
            time_limit_secs: live.question().time_limit_secs(),
            started_at: live.started_at(),
            deadline: live.deadline(),
        }
    }
}

/// Acknowledgement for a recorded wager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetAccepted {
    pub bets: Vec<TokenAmount>,
    /// Balance is untouched until resolution; echoed for the client.
    pub balance: TokenAmount,
}

/// Per-player settlement for one resolved question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOutcome {
    pub player_id: PlayerId,
    pub display_name: DisplayName,
    /// `None` when the player submitted no wager at all.
    pub bets: Option<Vec<TokenAmount>>,
    pub won: bool,
    pub tokens_returned: TokenAmount,
    pub tokens_lost: TokenAmount,
    pub new_balance: TokenAmount,
}

/// Everything produced by resolving one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub question_id: QuestionId,
    pub correct_index: usize,
    pub outcomes: Vec<PlayerOutcome>,
    pub eliminated: Vec<PlayerId>,
    pub remaining_players: usize,
    pub jackpot: TokenAmount,
    /// The queue head promoted to live, when the game continues.
    pub next: Option<LiveQuestionView>,
    /// Final standings, when this resolution ended the game.
    pub standings: Option<FinalStandings>,
}

/// One row of the final standings, ranked by balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub display_name: DisplayName,
    pub balance: TokenAmount,
    pub eliminated: bool,
}

/// Frozen results broadcast with `game_ended`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalStandings {
    /// Players sorted by balance (descending), ties by player id.
    pub rankings: Vec<PlayerStanding>,
    pub jackpot: TokenAmount,
}

/// Snapshot pushed to a player on (re)connect so it can resynchronize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStateView {
    pub game_active: bool,
    pub jackpot: TokenAmount,
    pub balance: TokenAmount,
    pub eliminated: bool,
    /// The live question, present only while its deadline has not passed.
    pub current_question: Option<LiveQuestionView>,
}

/// Process-wide mutable state for one broadcast session's quiz game.
#[derive(Debug)]
pub struct GameSession {
    phase: GamePhase,
    created_at: Timestamp,
    live: Option<LiveQuestion>,
    queue: VecDeque<Question>,
    players: HashMap<PlayerId, Player>,
    wagers: HashMap<PlayerId, WagerVector>,
    jackpot: TokenAmount,
}

impl GameSession {
    /// Create a new active session with an empty player set.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            phase: GamePhase::Active,
            created_at,
            live: None,
            queue: VecDeque::new(),
            players: HashMap::new(),
            wagers: HashMap::new(),
            jackpot: TokenAmount::ZERO,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn jackpot(&self) -> TokenAmount {
        self.jackpot
    }

    pub fn live_question(&self) -> Option<&LiveQuestion> {
        self.live.as_ref()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Count of players still in the game.
    pub fn remaining_players(&self) -> usize {
        self.players.values().filter(|p| !p.is_eliminated()).count()
    }

    /// Look up or create the player record for a quiz connection.
    ///
    /// A reconnect within the same session resumes the existing balance and
    /// elimination flag; it never grants a second stake.
    pub fn get_or_create_player(&mut self, player_id: PlayerId, display_name: DisplayName) -> Player {
        self.players
            .entry(player_id.clone())
            .or_insert_with(|| Player::new(player_id, display_name))
            .clone()
    }

    /// Submit a question: goes live immediately, or joins the FIFO queue
    /// behind the current live question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::GameEnded` after the session has ended.
    pub fn submit_question(
        &mut self,
        question: Question,
        now: Timestamp,
    ) -> Result<QuestionPlacement, QuizError> {
        if self.phase == GamePhase::Ended {
            return Err(QuizError::GameEnded);
        }

        if self.live.is_some() {
            self.queue.push_back(question);
            return Ok(QuestionPlacement::Queued {
                position: self.queue.len(),
            });
        }

        Ok(QuestionPlacement::Live(self.go_live(question, now)))
    }

    fn go_live(&mut self, question: Question, now: Timestamp) -> LiveQuestionView {
        let live = LiveQuestion::start(question, now);
        let view = LiveQuestionView::from_live(&live);
        self.wagers.clear();
        self.live = Some(live);
        view
    }

    /// Record a player's provisional wager for the live question.
    ///
    /// Nothing is debited yet; the wager is settled at resolution.
    /// Resubmission before the deadline overwrites the previous wager
    /// (last-write-wins).
    ///
    /// # Errors
    ///
    /// * `GameEnded` - the session has ended
    /// * `StaleQuestion` - no live question, id mismatch, or deadline passed
    /// * `UnknownPlayer` / `AlreadyEliminated` - player cannot bet
    /// * `InvalidWager` - wrong vector length or sum over current balance
    pub fn submit_bet(
        &mut self,
        player_id: &PlayerId,
        question_id: &QuestionId,
        amounts: Vec<TokenAmount>,
        now: Timestamp,
    ) -> Result<BetAccepted, QuizError> {
        if self.phase == GamePhase::Ended {
            return Err(QuizError::GameEnded);
        }

        let live = self
            .live
            .as_ref()
            .filter(|live| live.id() == question_id)
            .ok_or_else(|| QuizError::StaleQuestion(question_id.as_str().to_string()))?;
        if live.is_expired(now) {
            return Err(QuizError::StaleQuestion(question_id.as_str().to_string()));
        }
        let option_count = live.question().option_count();

        let player = self
            .players
            .get(player_id)
            .ok_or_else(|| QuizError::UnknownPlayer(player_id.as_str().to_string()))?;
        if player.is_eliminated() {
            return Err(QuizError::AlreadyEliminated(player_id.as_str().to_string()));
        }

        let wager = WagerVector::new(amounts, option_count)?;
        if wager.total() > player.balance() {
            return Err(QuizError::InvalidWager {
                reason: format!(
                    "total wager {} exceeds balance {}",
                    wager.total(),
                    player.balance()
                ),
            });
        }

        let accepted = BetAccepted {
            bets: wager.amounts().to_vec(),
            balance: player.balance(),
        };
        self.wagers.insert(player_id.clone(), wager);
        Ok(accepted)
    }

    /// Settle the live question: move losing wagers into the jackpot,
    /// eliminate players with nothing on the correct option (including
    /// no-bet), and promote the queue head or end the game.
    ///
    /// Driven by the deadline timer, never by clients.
    ///
    /// # Errors
    ///
    /// * `GameEnded` - the session has ended
    /// * `StaleQuestion` - the id does not match the live question (benign
    ///   timer race after an earlier resolution or game end)
    pub fn resolve(
        &mut self,
        question_id: &QuestionId,
        now: Timestamp,
    ) -> Result<Resolution, QuizError> {
        if self.phase == GamePhase::Ended {
            return Err(QuizError::GameEnded);
        }
        if self.live.as_ref().map(|live| live.id()) != Some(question_id) {
            return Err(QuizError::StaleQuestion(question_id.as_str().to_string()));
        }

        // Checked above; the take cannot miss.
        let question = match self.live.take() {
            Some(live) => live.into_question(),
            None => return Err(QuizError::StaleQuestion(question_id.as_str().to_string())),
        };
        let correct_index = question.correct_index();

        let mut outcomes = Vec::new();
        let mut eliminated = Vec::new();

        // Deterministic settlement order for reproducible event payloads.
        let mut ids: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, p)| !p.is_eliminated())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();

        for player_id in ids {
            let wager = self.wagers.remove(&player_id);
            let (on_correct, off_correct) = match &wager {
                Some(w) => (w.amount_on(correct_index), w.amount_off(correct_index)),
                None => (TokenAmount::ZERO, TokenAmount::ZERO),
            };

            // A kept entry is guaranteed: ids came from the player map.
            let Some(player) = self.players.get_mut(&player_id) else {
                continue;
            };

            // The correct-option amount stays with the player (it was never
            // debited); everything else is forfeited. No bet counts as an
            // all-wrong bet. An external debit after the bet can leave the
            // committed wager above the balance, so only what the forfeit
            // actually deducted feeds the jackpot.
            let won = !on_correct.is_zero();
            let forfeited = player.forfeit(off_correct);
            self.jackpot += forfeited;
            if !won {
                player.eliminate();
                eliminated.push(player_id.clone());
            }

            outcomes.push(PlayerOutcome {
                player_id: player_id.clone(),
                display_name: player.display_name().clone(),
                bets: wager.map(|w| w.amounts().to_vec()),
                won,
                tokens_returned: if won { on_correct } else { TokenAmount::ZERO },
                tokens_lost: forfeited,
                new_balance: player.balance(),
            });
        }

        self.wagers.clear();
        let remaining = self.remaining_players();

        let mut resolution = Resolution {
            question_id: question.id().clone(),
            correct_index,
            outcomes,
            eliminated,
            remaining_players: remaining,
            jackpot: self.jackpot,
            next: None,
            standings: None,
        };

        if remaining <= 1 {
            resolution.standings = Some(self.finish());
        } else if let Some(next) = self.queue.pop_front() {
            resolution.next = Some(self.go_live(next, now));
        }

        Ok(resolution)
    }

    /// End the game: freeze state, build final standings, clear the player
    /// set. Host-initiated or triggered automatically by `resolve`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::GameEnded` if the session already ended.
    pub fn end_game(&mut self) -> Result<FinalStandings, QuizError> {
        if self.phase == GamePhase::Ended {
            return Err(QuizError::GameEnded);
        }
        self.live = None;
        Ok(self.finish())
    }

    fn finish(&mut self) -> FinalStandings {
        let mut rankings: Vec<PlayerStanding> = self
            .players
            .values()
            .map(|p| PlayerStanding {
                player_id: p.id().clone(),
                display_name: p.display_name().clone(),
                balance: p.balance(),
                eliminated: p.is_eliminated(),
            })
            .collect();
        rankings.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        self.phase = GamePhase::Ended;
        self.live = None;
        self.queue.clear();
        self.wagers.clear();
        self.players.clear();

        FinalStandings {
            rankings,
            jackpot: self.jackpot,
        }
    }

    /// Build the resynchronization snapshot for one player.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownPlayer` if the player has no record in
    /// this session.
    pub fn game_state_for(
        &self,
        player_id: &PlayerId,
        now: Timestamp,
    ) -> Result<GameStateView, QuizError> {
        let player = self
            .players
            .get(player_id)
            .ok_or_else(|| QuizError::UnknownPlayer(player_id.as_str().to_string()))?;

        let current_question = self
            .live
            .as_ref()
            .filter(|live| !live.is_expired(now))
            .map(LiveQuestionView::from_live);

        Ok(GameStateView {
            game_active: self.phase == GamePhase::Active,
            jackpot: self.jackpot,
            balance: player.balance(),
            eliminated: player.is_eliminated(),
            current_question,
        })
    }

    /// Credit a player's in-game balance (external purchase/conversion
    /// flows share the Player record while a game is running).
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownPlayer` if the player has no record.
    pub fn credit_player(
        &mut self,
        player_id: &PlayerId,
        amount: TokenAmount,
    ) -> Result<TokenAmount, QuizError> {
        let player = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| QuizError::UnknownPlayer(player_id.as_str().to_string()))?;
        player.credit(amount);
        Ok(player.balance())
    }

    /// Debit a player's in-game balance.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownPlayer` or `QuizError::InsufficientBalance`.
    pub fn debit_player(
        &mut self,
        player_id: &PlayerId,
        amount: TokenAmount,
    ) -> Result<TokenAmount, QuizError> {
        let player = self
            .players
            .get_mut(player_id)
            .ok_or_else(|| QuizError::UnknownPlayer(player_id.as_str().to_string()))?;
        player.debit(amount)?;
        Ok(player.balance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::factory::QuestionIdFactory;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - GameSession 状態機械の全遷移（質問のライブ化・キュー・解決・終了）
    // - 賭けの検証（残高超過、長さ不一致、締切後、脱落者）
    // - 解決時の精算（ジャックポットへの没収、脱落判定、トークン保存則）
    //
    // 【なぜこのテストが必要か】
    // - セッションはすべての賭け金を扱う唯一の可変共有状態であり、
    //   精算の正しさ（トークンが生成も消滅もしないこと）を保証する必要がある
    //
    // 【どのようなシナリオをテストするか】
    // 1. ライブ中の質問は 1 つまで、超過分は FIFO で昇格する
    // 2. 正解に賭けなかったプレイヤーのみ脱落する
    // 3. 解決時のトークン保存則
    // 4. 残り 1 人以下で自動的にゲーム終了する
    // ========================================

    fn tokens(v: f64) -> TokenAmount {
        TokenAmount::from_f64(v).unwrap()
    }

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s.to_string()).unwrap()
    }

    fn make_question(correct_index: usize) -> Question {
        Question::new(
            QuestionIdFactory::generate().unwrap(),
            "Which color?".to_string(),
            vec!["Red".to_string(), "Blue".to_string()],
            correct_index,
            5,
            Timestamp::new(0),
        )
        .unwrap()
    }

    fn join(session: &mut GameSession, id: &str) -> PlayerId {
        let player_id = pid(id);
        session.get_or_create_player(
            player_id.clone(),
            DisplayName::new(id.to_string()).unwrap(),
        );
        player_id
    }

    #[test]
    fn test_at_most_one_live_question_fifo_promotion() {
        // テスト項目: ライブ中の質問は常に 1 つで、超過分は FIFO 順に昇格する
        // given (前提条件): 3 人のプレイヤー（自動終了を避けるため）
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        join(&mut session, "bob");
        join(&mut session, "carol");

        // when (操作): 3 問を連続で提出
        let q1 = make_question(0);
        let q2 = make_question(1);
        let q3 = make_question(0);
        let q1_id = q1.id().clone();
        let q2_id = q2.id().clone();

        let p1 = session.submit_question(q1, Timestamp::new(1_000)).unwrap();
        let p2 = session.submit_question(q2, Timestamp::new(1_001)).unwrap();
        let p3 = session.submit_question(q3, Timestamp::new(1_002)).unwrap();

        // then (期待する結果): 1 問目がライブ、残りはキュー位置 1, 2
        assert!(matches!(p1, QuestionPlacement::Live(_)));
        assert_eq!(p2, QuestionPlacement::Queued { position: 1 });
        assert_eq!(p3, QuestionPlacement::Queued { position: 2 });
        assert_eq!(session.live_question().unwrap().id(), &q1_id);
        assert_eq!(session.queue_len(), 2);

        // when (操作): 全員正解に賭けて 1 問目を解決
        for id in ["alice", "bob", "carol"] {
            session
                .submit_bet(&pid(id), &q1_id, vec![tokens(1.0), tokens(0.0)], Timestamp::new(2_000))
                .unwrap();
        }
        let resolution = session.resolve(&q1_id, Timestamp::new(7_000)).unwrap();

        // then (期待する結果): キュー先頭 (q2) がライブに昇格している
        let next = resolution.next.unwrap();
        assert_eq!(next.id, q2_id);
        assert_eq!(session.live_question().unwrap().id(), &q2_id);
        assert_eq!(session.queue_len(), 1);
        let _ = alice;
    }

    #[test]
    fn test_submit_bet_over_budget_rejected_no_side_effects() {
        // テスト項目: 残高超過の賭けは InvalidWager で拒否され、記録されない
        // given (前提条件): 残高 5 トークンのプレイヤー
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        session.debit_player(&alice, tokens(45.0)).unwrap();

        let question = make_question(0);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();

        // when (操作): 合計 7 トークンの賭け
        let result = session.submit_bet(
            &alice,
            &q_id,
            vec![tokens(3.0), tokens(4.0)],
            Timestamp::new(2_000),
        );

        // then (期待する結果): 拒否され、残高は変わらず、賭けは残らない
        assert!(matches!(result, Err(QuizError::InvalidWager { .. })));
        assert_eq!(session.player(&alice).unwrap().balance(), tokens(5.0));
        assert!(session.wagers.is_empty());
    }

    #[test]
    fn test_submit_bet_wrong_length_rejected() {
        // テスト項目: 選択肢数と異なる長さの賭けベクトルは拒否される
        // given (前提条件):
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        let question = make_question(0);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();

        // when (操作): 2 択に対して 3 要素の賭け
        let result = session.submit_bet(
            &alice,
            &q_id,
            vec![tokens(1.0), tokens(1.0), tokens(1.0)],
            Timestamp::new(2_000),
        );

        // then (期待する結果):
        assert!(matches!(result, Err(QuizError::InvalidWager { .. })));
    }

    #[test]
    fn test_submit_bet_after_deadline_rejected() {
        // テスト項目: 締切を過ぎた賭けは StaleQuestion で拒否される
        // given (前提条件): 制限時間 5 秒の質問が t=1000ms にライブ化
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        let question = make_question(0);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();

        // when (操作): 締切ちょうど (t=6000ms) に到着した賭け
        let result = session.submit_bet(
            &alice,
            &q_id,
            vec![tokens(1.0), tokens(0.0)],
            Timestamp::new(6_000),
        );

        // then (期待する結果):
        assert!(matches!(result, Err(QuizError::StaleQuestion(_))));
    }

    #[test]
    fn test_submit_bet_last_write_wins() {
        // テスト項目: 締切前の再提出は前の賭けを上書きする
        // given (前提条件):
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        join(&mut session, "bob");
        let question = make_question(1);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();

        // when (操作): 2 回賭けてから解決
        session
            .submit_bet(&alice, &q_id, vec![tokens(10.0), tokens(0.0)], Timestamp::new(2_000))
            .unwrap();
        session
            .submit_bet(&alice, &q_id, vec![tokens(0.0), tokens(20.0)], Timestamp::new(3_000))
            .unwrap();
        let resolution = session.resolve(&q_id, Timestamp::new(6_000)).unwrap();

        // then (期待する結果): 2 回目の賭けで精算される（alice は勝ち残る）
        let alice_outcome = resolution
            .outcomes
            .iter()
            .find(|o| o.player_id == alice)
            .unwrap();
        assert!(alice_outcome.won);
        assert_eq!(alice_outcome.bets, Some(vec![tokens(0.0), tokens(20.0)]));
    }

    #[test]
    fn test_resolve_elimination_iff_zero_on_correct() {
        // テスト項目: 正解への賭けが 0 のプレイヤーのみ脱落する（未提出も含む）
        // given (前提条件): 4 人のプレイヤー、正解は index 1
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice"); // 不正解のみ
        let bob = join(&mut session, "bob"); // 正解のみ
        let carol = join(&mut session, "carol"); // 両方に分散
        let dave = join(&mut session, "dave"); // 賭けなし

        let question = make_question(1);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();

        session
            .submit_bet(&alice, &q_id, vec![tokens(10.0), tokens(0.0)], Timestamp::new(2_000))
            .unwrap();
        session
            .submit_bet(&bob, &q_id, vec![tokens(0.0), tokens(20.0)], Timestamp::new(2_000))
            .unwrap();
        session
            .submit_bet(&carol, &q_id, vec![tokens(5.0), tokens(5.0)], Timestamp::new(2_000))
            .unwrap();

        // when (操作):
        let resolution = session.resolve(&q_id, Timestamp::new(6_000)).unwrap();

        // then (期待する結果): alice と dave のみ脱落
        assert_eq!(resolution.eliminated, vec![alice.clone(), dave.clone()]);
        assert!(session.player(&alice).unwrap().is_eliminated());
        assert!(!session.player(&bob).unwrap().is_eliminated());
        assert!(!session.player(&carol).unwrap().is_eliminated());
        assert!(session.player(&dave).unwrap().is_eliminated());

        // 残高: alice 40 (10 没収), bob 50 (変化なし), carol 45 (5 没収), dave 50
        assert_eq!(session.player(&alice).unwrap().balance(), tokens(40.0));
        assert_eq!(session.player(&bob).unwrap().balance(), tokens(50.0));
        assert_eq!(session.player(&carol).unwrap().balance(), tokens(45.0));
        assert_eq!(session.player(&dave).unwrap().balance(), tokens(50.0));
        assert_eq!(resolution.jackpot, tokens(15.0));
        assert_eq!(resolution.remaining_players, 2);
    }

    #[test]
    fn test_resolve_wager_conservation() {
        // テスト項目: 解決時にトークンが生成も消滅もしない
        // given (前提条件): 3 人が賭けた状態
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        let bob = join(&mut session, "bob");
        let carol = join(&mut session, "carol");

        let question = make_question(0);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();

        session
            .submit_bet(&alice, &q_id, vec![tokens(12.5), tokens(7.5)], Timestamp::new(2_000))
            .unwrap();
        session
            .submit_bet(&bob, &q_id, vec![tokens(0.0), tokens(30.0)], Timestamp::new(2_000))
            .unwrap();
        session
            .submit_bet(&carol, &q_id, vec![tokens(3.0), tokens(0.0)], Timestamp::new(2_000))
            .unwrap();
        let committed: TokenAmount = [tokens(20.0), tokens(30.0), tokens(3.0)]
            .into_iter()
            .sum();

        // when (操作):
        let resolution = session.resolve(&q_id, Timestamp::new(6_000)).unwrap();

        // then (期待する結果): 事前の総賭け金 = 勝者への返還 + ジャックポット増分
        let returned: TokenAmount = resolution
            .outcomes
            .iter()
            .map(|o| o.tokens_returned)
            .sum();
        assert_eq!(committed, returned + resolution.jackpot);
    }

    #[test]
    fn test_resolve_caps_forfeit_after_external_debit() {
        // テスト項目: 賭けの後の外部減算で残高が賭け額を下回っても、
        //            没収は残高までに抑えられ、トークンが生成されない
        // given (前提条件): alice が全額 50 を不正解に賭けた後、45 を外部減算
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        let bob = join(&mut session, "bob");

        let question = make_question(1);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();
        session
            .submit_bet(&alice, &q_id, vec![tokens(50.0), tokens(0.0)], Timestamp::new(2_000))
            .unwrap();
        session
            .submit_bet(&bob, &q_id, vec![tokens(0.0), tokens(20.0)], Timestamp::new(2_000))
            .unwrap();
        session.debit_player(&alice, tokens(45.0)).unwrap();

        // when (操作):
        let resolution = session.resolve(&q_id, Timestamp::new(6_000)).unwrap();

        // then (期待する結果): ジャックポットには実際に減算された 5 のみ入る
        let alice_outcome = resolution
            .outcomes
            .iter()
            .find(|o| o.player_id == alice)
            .unwrap();
        assert_eq!(alice_outcome.new_balance, tokens(0.0));
        assert_eq!(alice_outcome.tokens_lost, tokens(5.0));
        assert_eq!(resolution.jackpot, tokens(5.0));

        // 減算後の総量 55 = 残高合計 + ジャックポット
        let bob_outcome = resolution
            .outcomes
            .iter()
            .find(|o| o.player_id == bob)
            .unwrap();
        let total = alice_outcome.new_balance + bob_outcome.new_balance + resolution.jackpot;
        assert_eq!(total, tokens(55.0));
    }

    #[test]
    fn test_resolve_auto_game_end_with_one_survivor() {
        // テスト項目: 残りプレイヤーが 1 人になると自動的にゲームが終了する
        // given (前提条件): 2 人のうち alice のみ不正解に賭けた状態
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        let bob = join(&mut session, "bob");

        let question = make_question(1);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();

        session
            .submit_bet(&alice, &q_id, vec![tokens(10.0), tokens(0.0)], Timestamp::new(2_000))
            .unwrap();
        session
            .submit_bet(&bob, &q_id, vec![tokens(0.0), tokens(20.0)], Timestamp::new(2_000))
            .unwrap();

        // when (操作):
        let resolution = session.resolve(&q_id, Timestamp::new(6_000)).unwrap();

        // then (期待する結果): A は 40 で脱落、B は 50 のまま、ジャックポット 10
        let alice_outcome = resolution
            .outcomes
            .iter()
            .find(|o| o.player_id == alice)
            .unwrap();
        assert!(!alice_outcome.won);
        assert_eq!(alice_outcome.new_balance, tokens(40.0));
        let bob_outcome = resolution
            .outcomes
            .iter()
            .find(|o| o.player_id == bob)
            .unwrap();
        assert!(bob_outcome.won);
        assert_eq!(bob_outcome.new_balance, tokens(50.0));
        assert_eq!(resolution.jackpot, tokens(10.0));
        assert_eq!(resolution.remaining_players, 1);

        // ゲームは自動終了し、bob が首位
        let standings = resolution.standings.unwrap();
        assert_eq!(standings.rankings[0].player_id, bob);
        assert_eq!(standings.rankings[0].balance, tokens(50.0));
        assert_eq!(standings.jackpot, tokens(10.0));
        assert_eq!(session.phase(), GamePhase::Ended);
        assert_eq!(session.player_count(), 0);
    }

    #[test]
    fn test_resolve_stale_question_after_settlement() {
        // テスト項目: 解決済みの質問 ID での再解決・賭けは StaleQuestion になる
        // given (前提条件): q1 解決後に q2 がライブ
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        join(&mut session, "bob");
        join(&mut session, "carol");

        let q1 = make_question(0);
        let q2 = make_question(0);
        let q1_id = q1.id().clone();
        session.submit_question(q1, Timestamp::new(1_000)).unwrap();
        session.submit_question(q2, Timestamp::new(1_001)).unwrap();

        for id in ["alice", "bob", "carol"] {
            session
                .submit_bet(&pid(id), &q1_id, vec![tokens(1.0), tokens(0.0)], Timestamp::new(2_000))
                .unwrap();
        }
        session.resolve(&q1_id, Timestamp::new(6_000)).unwrap();
        let jackpot_after_q1 = session.jackpot();

        // when (操作): q1 への遅れた賭けとタイマーの二重発火
        let late_bet = session.submit_bet(
            &alice,
            &q1_id,
            vec![tokens(1.0), tokens(0.0)],
            Timestamp::new(6_500),
        );
        let double_fire = session.resolve(&q1_id, Timestamp::new(6_500));

        // then (期待する結果): 両方 StaleQuestion で、q2 の状態は無傷
        assert!(matches!(late_bet, Err(QuizError::StaleQuestion(_))));
        assert!(matches!(double_fire, Err(QuizError::StaleQuestion(_))));
        assert_eq!(session.jackpot(), jackpot_after_q1);
        assert!(session.live_question().is_some());
    }

    #[test]
    fn test_end_game_rejects_further_actions() {
        // テスト項目: 終了後の質問・賭けは GameEnded で拒否される
        // given (前提条件):
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        session.end_game().unwrap();

        // when (操作):
        let question = make_question(0);
        let q_id = question.id().clone();
        let submit = session.submit_question(question, Timestamp::new(1_000));
        let bet = session.submit_bet(&alice, &q_id, vec![tokens(1.0), tokens(0.0)], Timestamp::new(1_000));
        let again = session.end_game();

        // then (期待する結果):
        assert_eq!(submit, Err(QuizError::GameEnded));
        assert_eq!(bet, Err(QuizError::GameEnded));
        assert_eq!(again, Err(QuizError::GameEnded));
    }

    #[test]
    fn test_reconnect_resumes_player_state() {
        // テスト項目: 再接続時に残高と脱落フラグが引き継がれる（2 つ目の命は無い）
        // given (前提条件): alice が 10 トークン失って脱落済み
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        join(&mut session, "bob");
        join(&mut session, "carol");

        let question = make_question(1);
        let q_id = question.id().clone();
        session.submit_question(question, Timestamp::new(1_000)).unwrap();
        session
            .submit_bet(&alice, &q_id, vec![tokens(10.0), tokens(0.0)], Timestamp::new(2_000))
            .unwrap();
        for id in ["bob", "carol"] {
            session
                .submit_bet(&pid(id), &q_id, vec![tokens(0.0), tokens(1.0)], Timestamp::new(2_000))
                .unwrap();
        }
        session.resolve(&q_id, Timestamp::new(6_000)).unwrap();

        // when (操作): alice が再接続
        let resumed = session.get_or_create_player(
            alice.clone(),
            DisplayName::new("alice".to_string()).unwrap(),
        );

        // then (期待する結果): 残高 40・脱落済みのまま
        assert_eq!(resumed.balance(), tokens(40.0));
        assert!(resumed.is_eliminated());
    }

    #[test]
    fn test_game_state_for_hides_expired_question() {
        // テスト項目: 締切を過ぎたライブ質問は game_state に含まれない
        // given (前提条件):
        let mut session = GameSession::new(Timestamp::new(0));
        let alice = join(&mut session, "alice");
        let question = make_question(0);
        session.submit_question(question, Timestamp::new(1_000)).unwrap();

        // when (操作):
        let before = session.game_state_for(&alice, Timestamp::new(2_000)).unwrap();
        let after = session.game_state_for(&alice, Timestamp::new(10_000)).unwrap();

        // then (期待する結果):
        assert!(before.current_question.is_some());
        assert!(after.current_question.is_none());
        assert!(before.game_active);
    }
}
