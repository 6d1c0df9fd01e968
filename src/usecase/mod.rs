//! Usecase layer.
//!
//! One struct per application operation. Usecases own the orchestration
//! between the shared game session, the connection registry and the wire
//! DTOs; WebSocket handlers stay thin and only parse/forward.

pub mod connect_player;
pub mod end_game;
pub mod error;
pub mod relay_frame;
pub mod resolve_question;
pub mod send_chat;
pub mod submit_bet;
pub mod submit_question;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::GameSession;

/// The single writer-serialized game session shared by all usecases.
///
/// Every mutating quiz operation locks this mutex, so question submission,
/// bet recording and timer-driven resolution never interleave partially.
pub type SharedGameSession = Arc<Mutex<GameSession>>;

pub use connect_player::ConnectPlayerUseCase;
pub use end_game::EndGameUseCase;
pub use error::{ChatError, RelayError};
pub use relay_frame::RelayFrameUseCase;
pub use resolve_question::ResolveQuestionUseCase;
pub use send_chat::SendChatUseCase;
pub use submit_bet::SubmitBetUseCase;
pub use submit_question::SubmitQuestionUseCase;
