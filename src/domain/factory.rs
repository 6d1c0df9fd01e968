//! Domain factories for creating domain identifiers.

use super::{
    error::ValueObjectError,
    value_object::{ConnectionId, QuestionId},
};

/// Factory for generating QuestionId instances.
///
/// This factory encapsulates the generation concern, separating it from the
/// validation logic in QuestionId.
pub struct QuestionIdFactory;

impl QuestionIdFactory {
    /// Generate a new QuestionId with a random UUID v4, prefixed with `q-`.
    ///
    /// # Errors
    ///
    /// This method should not fail in practice, but returns Result for
    /// consistency with the domain error handling pattern.
    pub fn generate() -> Result<QuestionId, ValueObjectError> {
        QuestionId::new(format!("q-{}", uuid::Uuid::new_v4()))
    }
}

/// Factory for generating ConnectionId instances.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    pub fn generate() -> ConnectionId {
        ConnectionId::from_uuid(uuid::Uuid::new_v4())
    }
}
