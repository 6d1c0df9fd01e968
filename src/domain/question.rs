//! Quiz question entities.
//!
//! A question moves through an explicit lifecycle: created on submission,
//! possibly queued behind the current live question, promoted to live with a
//! deadline, and finally resolved. The live stage is a separate type so that
//! "resolving a question that never went live" is not representable.

use super::{
    error::QuizError,
    value_object::{QuestionId, Timestamp},
};

/// Minimum number of answer options per question.
pub const MIN_OPTIONS: usize = 2;

/// Maximum number of answer options per question.
pub const MAX_OPTIONS: usize = 4;

/// Minimum question time limit in seconds.
pub const MIN_TIME_LIMIT_SECS: u32 = 5;

/// Maximum question time limit in seconds.
pub const MAX_TIME_LIMIT_SECS: u32 = 300;

/// A validated quiz question that has not yet gone live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    time_limit_secs: u32,
    created_at: Timestamp,
}

impl Question {
    /// Create a new question, validating the submission.
    ///
    /// Empty option strings are dropped before validation, so the correct
    /// index must point into the filled options.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidQuestion` if the filled option count is
    /// outside [2, 4], the correct index is out of range, or the time limit
    /// is outside [5, 300] seconds.
    pub fn new(
        id: QuestionId,
        prompt: String,
        options: Vec<String>,
        correct_index: usize,
        time_limit_secs: u32,
        created_at: Timestamp,
    ) -> Result<Self, QuizError> {
        let options: Vec<String> = options
            .into_iter()
            .filter(|opt| !opt.trim().is_empty())
            .collect();

        if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
            return Err(QuizError::InvalidQuestion {
                reason: format!(
                    "must have {MIN_OPTIONS}-{MAX_OPTIONS} options (got {})",
                    options.len()
                ),
            });
        }
        if correct_index >= options.len() {
            return Err(QuizError::InvalidQuestion {
                reason: format!(
                    "correct_index {} out of range for {} options",
                    correct_index,
                    options.len()
                ),
            });
        }
        if !(MIN_TIME_LIMIT_SECS..=MAX_TIME_LIMIT_SECS).contains(&time_limit_secs) {
            return Err(QuizError::InvalidQuestion {
                reason: format!(
                    "time_limit must be {MIN_TIME_LIMIT_SECS}-{MAX_TIME_LIMIT_SECS} seconds (got {time_limit_secs})"
                ),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct_index,
            time_limit_secs,
            created_at,
        })
    }

    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Index of the correct option. Never sent to players.
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// The one question currently accepting wagers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveQuestion {
    question: Question,
    started_at: Timestamp,
    deadline: Timestamp,
}

impl LiveQuestion {
    /// Promote a question to live, fixing its start time and deadline.
    pub fn start(question: Question, now: Timestamp) -> Self {
        let deadline = now.plus_secs(question.time_limit_secs());
        Self {
            question,
            started_at: now,
            deadline,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn id(&self) -> &QuestionId {
        self.question.id()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    /// Whether the wagering deadline has passed.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.deadline
    }

    /// Consume the live stage, returning the underlying question for
    /// resolution.
    pub fn into_question(self) -> Question {
        self.question
    }
}
