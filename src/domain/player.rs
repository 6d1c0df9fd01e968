//! Player entity and wager value object.

use super::{
    error::QuizError,
    value_object::{DisplayName, PlayerId, TokenAmount},
};

/// Starting token stake granted to every player on first connection.
pub const STARTING_BALANCE: TokenAmount = TokenAmount::from_millis(50_000);

/// A participant in the quiz game.
///
/// Created on the first quiz connection for a user id within a game session;
/// reconnects resume the same record, so a reconnect never grants a fresh
/// stake or clears an elimination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    display_name: DisplayName,
    balance: TokenAmount,
    eliminated: bool,
}

impl Player {
    /// Create a new player with the starting balance.
    pub fn new(id: PlayerId, display_name: DisplayName) -> Self {
        Self {
            id,
            display_name,
            balance: STARTING_BALANCE,
            eliminated: false,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn balance(&self) -> TokenAmount {
        self.balance
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    /// Mark the player as eliminated. Terminal for the session.
    pub fn eliminate(&mut self) {
        self.eliminated = true;
    }

    /// Credit tokens to the player's balance.
    pub fn credit(&mut self, amount: TokenAmount) {
        self.balance += amount;
    }

    /// Debit tokens from the player's balance.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InsufficientBalance` if `amount` exceeds the
    /// current balance.
    pub fn debit(&mut self, amount: TokenAmount) -> Result<(), QuizError> {
        match self.balance.checked_sub(amount) {
            Some(remaining) => {
                self.balance = remaining;
                Ok(())
            }
            None => Err(QuizError::InsufficientBalance {
                have: self.balance,
                requested: amount,
            }),
        }
    }

    /// Forfeit tokens during resolution, clamped to the current balance.
    ///
    /// A committed wager is checked against the balance at bet time, but an
    /// external debit between bet and resolution can undercut it. Returns
    /// the amount actually deducted so the caller adds exactly that to the
    /// jackpot.
    pub(crate) fn forfeit(&mut self, amount: TokenAmount) -> TokenAmount {
        let deducted = amount.min(self.balance);
        self.balance = self.balance.saturating_sub(deducted);
        deducted
    }
}

/// A player's committed bet for the live question: one non-negative amount
/// per answer option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerVector {
    amounts: Vec<TokenAmount>,
}

impl WagerVector {
    /// Create a wager vector, validating its shape against the live
    /// question's option count.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidWager` if the length does not match the
    /// option count. Negative amounts are unrepresentable in `TokenAmount`
    /// and rejected at the DTO boundary.
    pub fn new(amounts: Vec<TokenAmount>, option_count: usize) -> Result<Self, QuizError> {
        if amounts.len() != option_count {
            return Err(QuizError::InvalidWager {
                reason: format!(
                    "expected {} amounts, got {}",
                    option_count,
                    amounts.len()
                ),
            });
        }
        Ok(Self { amounts })
    }

    pub fn amounts(&self) -> &[TokenAmount] {
        &self.amounts
    }

    /// Total tokens committed across all options.
    pub fn total(&self) -> TokenAmount {
        self.amounts.iter().copied().sum()
    }

    /// Amount placed on the given option index.
    pub fn amount_on(&self, index: usize) -> TokenAmount {
        self.amounts.get(index).copied().unwrap_or(TokenAmount::ZERO)
    }

    /// Total placed on every option except the given one.
    pub fn amount_off(&self, index: usize) -> TokenAmount {
        self.total().saturating_sub(self.amount_on(index))
    }
}
