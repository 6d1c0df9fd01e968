//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Player identifier value object.
///
/// The stable external user id handed to us at connect time. The quiz engine
/// treats it as opaque and immutable for the lifetime of a game session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a new PlayerId.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or longer than 100 characters.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::PlayerIdEmpty);
        }
        let len = id.len();
        if len > 100 {
            return Err(ValueObjectError::PlayerIdTooLong {
                max: 100,
                actual: len,
            });
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display label for a player, shown to other participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Create a new DisplayName.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or longer than 100 characters.
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.is_empty() {
            return Err(ValueObjectError::DisplayNameEmpty);
        }
        let len = name.len();
        if len > 100 {
            return Err(ValueObjectError::DisplayNameTooLong {
                max: 100,
                actual: len,
            });
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Question identifier value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(String);

impl QuestionId {
    /// Create a new QuestionId.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::QuestionIdEmpty);
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection identifier value object (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Wrap an existing UUID.
    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a connection is bound to for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The single connection producing video frames for the session.
    Broadcaster,
    /// A connection passively receiving relayed frames.
    Viewer,
    /// A connection participating in the chat fan-out.
    ChatParticipant,
    /// The single connection submitting quiz questions.
    QuizHost,
    /// A connection bound to an authenticated player wagering on questions.
    QuizPlayer,
}

impl Role {
    /// Whether at most one connection may hold this role at a time.
    ///
    /// Single-slot roles use evict-and-replace: a new registration closes
    /// the previous holder.
    pub fn is_single_slot(self) -> bool {
        matches!(self, Role::Broadcaster | Role::QuizHost)
    }
}

/// Chat message text value object.
///
/// Text that is empty after trimming is rejected; surrounding whitespace is
/// stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatText(String);

impl ChatText {
    /// Create a new ChatText.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty after trimming or longer than
    /// 10000 characters.
    pub fn new(text: String) -> Result<Self, ValueObjectError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::ChatTextEmpty);
        }
        let len = trimmed.len();
        if len > 10000 {
            return Err(ValueObjectError::ChatTextTooLong {
                max: 10000,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// This timestamp shifted forward by the given number of seconds.
    pub fn plus_secs(&self, secs: u32) -> Self {
        Self(self.0 + i64::from(secs) * 1000)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of milli-token units per whole token.
const MILLIS_PER_TOKEN: u64 = 1000;

/// A non-negative quantity of game tokens.
///
/// Stored as fixed-point milli-tokens so that repeated wager settlement does
/// not accumulate floating-point drift. The wire format uses plain JSON
/// numbers; conversion happens at the DTO boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(u64);

impl TokenAmount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from whole tokens.
    pub fn from_tokens(tokens: u64) -> Self {
        Self(tokens * MILLIS_PER_TOKEN)
    }

    /// Create an amount from raw milli-token units.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Parse an amount from a wire-format JSON number.
    ///
    /// The value is rounded to the nearest milli-token.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative, NaN or infinite.
    pub fn from_f64(value: f64) -> Result<Self, ValueObjectError> {
        if !value.is_finite() {
            return Err(ValueObjectError::TokenAmountNotFinite);
        }
        if value < 0.0 {
            return Err(ValueObjectError::TokenAmountNegative(value));
        }
        Ok(Self((value * MILLIS_PER_TOKEN as f64).round() as u64))
    }

    /// Convert to a wire-format JSON number.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / MILLIS_PER_TOKEN as f64
    }

    /// Raw milli-token units.
    pub fn millis(self) -> u64 {
        self.0
    }

    /// Whether this amount is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating subtraction; clamps at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked subtraction; `None` if `other` exceeds `self`.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl std::ops::Add for TokenAmount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl std::ops::AddAssign for TokenAmount {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl std::iter::Sum for TokenAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}
