//! Domain layer.
//!
//! Pure business objects and rules for the broadcast/quiz game:
//! value objects, the question and player entities, the game session state
//! machine, and the interfaces the domain requires from the outer layers
//! (dependency inversion).

pub mod error;
pub mod factory;
pub mod player;
pub mod question;
pub mod registry;
pub mod session;
pub mod value_object;

pub use error::{MessagePushError, QuizError, ValueObjectError};
pub use factory::{ConnectionIdFactory, QuestionIdFactory};
pub use player::{Player, WagerVector, STARTING_BALANCE};
pub use question::{LiveQuestion, Question};
pub use registry::{ConnectionInfo, ConnectionRegistry, RegistryChannel};
pub use session::{
    BetAccepted, FinalStandings, GamePhase, GameSession, GameStateView, LiveQuestionView,
    PlayerOutcome, PlayerStanding, QuestionPlacement, Resolution,
};
pub use value_object::{
    ChatText, ConnectionId, DisplayName, PlayerId, QuestionId, Role, Timestamp, TokenAmount,
};
