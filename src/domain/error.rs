//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::TokenAmount;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueObjectError {
    /// PlayerId validation error
    #[error("PlayerId cannot be empty")]
    PlayerIdEmpty,

    /// PlayerId too long error
    #[error("PlayerId cannot exceed {max} characters (got {actual})")]
    PlayerIdTooLong { max: usize, actual: usize },

    /// DisplayName validation error
    #[error("DisplayName cannot be empty")]
    DisplayNameEmpty,

    /// DisplayName too long error
    #[error("DisplayName cannot exceed {max} characters (got {actual})")]
    DisplayNameTooLong { max: usize, actual: usize },

    /// QuestionId validation error
    #[error("QuestionId cannot be empty")]
    QuestionIdEmpty,

    /// ChatText validation error
    #[error("chat text cannot be empty after trimming")]
    ChatTextEmpty,

    /// ChatText too long error
    #[error("chat text cannot exceed {max} characters (got {actual})")]
    ChatTextTooLong { max: usize, actual: usize },

    /// Token amount must be non-negative
    #[error("token amount cannot be negative (got {0})")]
    TokenAmountNegative(f64),

    /// Token amount must be a finite number
    #[error("token amount must be a finite number")]
    TokenAmountNotFinite,
}

/// Errors raised by the quiz engine and the player directory.
///
/// Validation errors on player-submitted actions are reported back to the
/// originating connection only; they never corrupt shared session state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuizError {
    /// Bad option count, correct index or time limit on question submission
    #[error("invalid question: {reason}")]
    InvalidQuestion { reason: String },

    /// Malformed or over-budget bet
    #[error("invalid wager: {reason}")]
    InvalidWager { reason: String },

    /// Bet references a question that is not the current live question
    #[error("question '{0}' is not live")]
    StaleQuestion(String),

    /// The player has already been eliminated from the game
    #[error("player '{0}' has been eliminated")]
    AlreadyEliminated(String),

    /// The game session has ended; no further questions or bets are accepted
    #[error("the game has ended")]
    GameEnded,

    /// The player is not part of this game session
    #[error("player '{0}' is not part of this game")]
    UnknownPlayer(String),

    /// Directory debit exceeding the player's current balance
    #[error("insufficient balance: have {have}, tried to debit {requested}")]
    InsufficientBalance {
        have: TokenAmount,
        requested: TokenAmount,
    },
}

/// Errors raised when pushing a message to a live connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagePushError {
    /// No connection registered under the given id
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    /// The send channel for the connection is closed
    #[error("failed to push message: {0}")]
    PushFailed(String),
}
