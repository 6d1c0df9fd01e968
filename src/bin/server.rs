//! Live broadcast relay & quiz wagering server.
//!
//! Relays video frames from a single broadcaster to viewers, fans out chat,
//! and runs an elimination-wagering quiz game alongside the stream.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;

use quizcast::{
    common::{logger::setup_logger, time::get_unix_timestamp_ms},
    domain::{GameSession, Timestamp},
    infrastructure::registry::ChannelConnectionRegistry,
    ui::Server,
    usecase::{
        ConnectPlayerUseCase, EndGameUseCase, RelayFrameUseCase, ResolveQuestionUseCase,
        SendChatUseCase, SharedGameSession, SubmitBetUseCase, SubmitQuestionUseCase,
    },
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Live broadcast relay & quiz wagering server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. ConnectionRegistry
    // 2. GameSession
    // 3. UseCases
    // 4. Server

    // 1. Create ConnectionRegistry (channel-backed implementation)
    let registry = Arc::new(ChannelConnectionRegistry::new());

    // 2. Create the game session
    let session: SharedGameSession = Arc::new(Mutex::new(GameSession::new(Timestamp::new(
        get_unix_timestamp_ms(),
    ))));
    tracing::info!("Game session created");

    // 3. Create UseCases
    let resolve_question_usecase = Arc::new(ResolveQuestionUseCase::new(
        session.clone(),
        registry.clone(),
    ));
    let connect_player_usecase = Arc::new(ConnectPlayerUseCase::new(
        session.clone(),
        registry.clone(),
    ));
    let submit_question_usecase = Arc::new(SubmitQuestionUseCase::new(
        session.clone(),
        resolve_question_usecase.clone(),
    ));
    let submit_bet_usecase = Arc::new(SubmitBetUseCase::new(session.clone()));
    let end_game_usecase = Arc::new(EndGameUseCase::new(session.clone(), registry.clone()));
    let relay_frame_usecase = Arc::new(RelayFrameUseCase::new(registry.clone()));
    let send_chat_usecase = Arc::new(SendChatUseCase::new(registry.clone()));

    // 4. Create and run the server
    let server = Server::new(
        registry,
        session,
        connect_player_usecase,
        submit_question_usecase,
        submit_bet_usecase,
        end_game_usecase,
        relay_frame_usecase,
        send_chat_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
