//! クイズプロトコルの DTO
//!
//! ホスト／プレイヤーから受信するコマンドと、サーバから配信する
//! イベントメッセージのワイヤ形式を定義します。すべてのメッセージは
//! `type` フィールドで判別される JSON テキストです。
//!
//! トークン量はワイヤ上では JSON 数値（トークン単位）で表現し、
//! ドメインの固定小数点表現との変換をこの層で行います。

use serde::{Deserialize, Serialize};

use crate::domain::{
    BetAccepted, FinalStandings, GameStateView, LiveQuestionView, PlayerOutcome, QuizError,
    Resolution, TokenAmount,
};

/// ホストから受信するコマンド
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    /// 質問の出題
    SubmitQuestion {
        question: String,
        options: Vec<String>,
        correct_index: usize,
        time_limit: u32,
    },
    /// ゲームの終了
    EndGame,
}

/// プレイヤーから受信するコマンド
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// ライブ中の質問への賭け（選択肢ごとの金額ベクトル）
    SubmitBet {
        question_id: String,
        bets: Vec<f64>,
    },
}

/// プレイヤー向けの質問表現
///
/// 正解インデックスは含みません。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionDto {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub time_limit: u32,
    pub started_at: i64,
    pub deadline: i64,
}

impl From<&LiveQuestionView> for QuestionDto {
    fn from(view: &LiveQuestionView) -> Self {
        Self {
            id: view.id.as_str().to_string(),
            question: view.prompt.clone(),
            options: view.options.clone(),
            time_limit: view.time_limit_secs,
            started_at: view.started_at.value(),
            deadline: view.deadline.value(),
        }
    }
}

/// 1 プレイヤー分の精算結果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerResultDto {
    pub player_id: String,
    pub display_name: String,
    /// 賭けなかった場合は null
    pub bets: Option<Vec<f64>>,
    pub won: bool,
    pub tokens_returned: f64,
    pub tokens_lost: f64,
    pub new_balance: f64,
}

impl From<&PlayerOutcome> for PlayerResultDto {
    fn from(outcome: &PlayerOutcome) -> Self {
        Self {
            player_id: outcome.player_id.as_str().to_string(),
            display_name: outcome.display_name.as_str().to_string(),
            bets: outcome
                .bets
                .as_ref()
                .map(|bets| bets.iter().map(|b| b.to_f64()).collect()),
            won: outcome.won,
            tokens_returned: outcome.tokens_returned.to_f64(),
            tokens_lost: outcome.tokens_lost.to_f64(),
            new_balance: outcome.new_balance.to_f64(),
        }
    }
}

/// 最終順位表の 1 行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerStandingDto {
    pub rank: usize,
    pub player_id: String,
    pub display_name: String,
    pub balance: f64,
    pub eliminated: bool,
}

/// ゲーム終了時の最終順位表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalStandingsDto {
    pub rankings: Vec<PlayerStandingDto>,
    pub jackpot: f64,
}

impl From<&FinalStandings> for FinalStandingsDto {
    fn from(standings: &FinalStandings) -> Self {
        Self {
            rankings: standings
                .rankings
                .iter()
                .enumerate()
                .map(|(i, standing)| PlayerStandingDto {
                    rank: i + 1,
                    player_id: standing.player_id.as_str().to_string(),
                    display_name: standing.display_name.as_str().to_string(),
                    balance: standing.balance.to_f64(),
                    eliminated: standing.eliminated,
                })
                .collect(),
            jackpot: standings.jackpot.to_f64(),
        }
    }
}

/// サーバから配信するクイズイベント
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuizServerMessage {
    /// プレイヤーへの新しいライブ質問の告知
    NewQuestion { question: QuestionDto },
    /// ホストへのキュー登録の確認
    QuestionQueued { position: usize },
    /// ホストへのライブ化の確認
    QuestionLive { question: QuestionDto },
    /// プレイヤーへの賭け受理の確認
    BetConfirmed {
        question_id: String,
        bets: Vec<f64>,
        new_balance: f64,
    },
    /// 解決結果の全員への配信
    Results {
        question_id: String,
        correct_index: usize,
        results: Vec<PlayerResultDto>,
        jackpot: f64,
        remaining_players: usize,
    },
    /// 脱落したプレイヤーへの個別通知
    Eliminated { jackpot: f64 },
    /// ホストへの出題可能通知（ライブ質問もキューも無い状態）
    ReadyForQuestion { remaining_players: usize },
    /// ゲーム終了と最終順位表の全員への配信
    GameEnded { standings: FinalStandingsDto },
    /// 接続・再接続時のプレイヤーへの状態スナップショット
    GameState {
        game_active: bool,
        jackpot: f64,
        balance: f64,
        eliminated: bool,
        current_question: Option<QuestionDto>,
    },
    /// エラー通知
    Error { code: String, message: String },
}

impl QuizServerMessage {
    /// ドメインエラーからエラーメッセージを構築
    pub fn from_error(error: &QuizError) -> Self {
        let code = match error {
            QuizError::InvalidQuestion { .. } => "invalid_question",
            QuizError::InvalidWager { .. } => "invalid_wager",
            QuizError::StaleQuestion(_) => "stale_question",
            QuizError::AlreadyEliminated(_) => "already_eliminated",
            QuizError::GameEnded => "game_ended",
            QuizError::UnknownPlayer(_) => "unknown_player",
            QuizError::InsufficientBalance { .. } => "insufficient_balance",
        };
        Self::Error {
            code: code.to_string(),
            message: error.to_string(),
        }
    }

    /// 賭け受理の確認メッセージを構築
    pub fn bet_confirmed(question_id: &str, accepted: &BetAccepted) -> Self {
        Self::BetConfirmed {
            question_id: question_id.to_string(),
            bets: accepted.bets.iter().map(|b| b.to_f64()).collect(),
            new_balance: accepted.balance.to_f64(),
        }
    }

    /// 解決結果の配信メッセージを構築
    pub fn results(resolution: &Resolution) -> Self {
        Self::Results {
            question_id: resolution.question_id.as_str().to_string(),
            correct_index: resolution.correct_index,
            results: resolution.outcomes.iter().map(PlayerResultDto::from).collect(),
            jackpot: resolution.jackpot.to_f64(),
            remaining_players: resolution.remaining_players,
        }
    }

    /// 状態スナップショットのメッセージを構築
    pub fn game_state(view: &GameStateView) -> Self {
        Self::GameState {
            game_active: view.game_active,
            jackpot: view.jackpot.to_f64(),
            balance: view.balance.to_f64(),
            eliminated: view.eliminated,
            current_question: view.current_question.as_ref().map(QuestionDto::from),
        }
    }

    /// 脱落通知のメッセージを構築
    pub fn eliminated(jackpot: TokenAmount) -> Self {
        Self::Eliminated {
            jackpot: jackpot.to_f64(),
        }
    }
}

/// `/debug/session` が返すセッションスナップショット
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshotDto {
    pub game_active: bool,
    pub live_question_id: Option<String>,
    pub queued_questions: usize,
    pub players: usize,
    pub remaining_players: usize,
    pub jackpot: f64,
    pub broadcaster_connected: bool,
    pub viewers: usize,
    pub chat_participants: usize,
    pub quiz_host_connected: bool,
    pub quiz_players: usize,
}
