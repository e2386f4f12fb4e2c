//! Chess Console library - turn orchestration for two-player chess sessions
//!
//! Two pluggable players (a person at a UI, a computer, a remote peer) take
//! turns on top of a rules engine. The console asks the right player for a
//! move, validates it, publishes lifecycle events and handles take-backs.
//!
//! # Architecture
//!
//! - **Rules**: [`RulesEngine`] capability, [`StandardChess`] adapter
//! - **State**: [`GameState`] with a history cursor independent of the live ply
//! - **Events**: [`EventBus`] broadcasting [`ConsoleEvent`]s
//! - **Players**: [`Player`] capability, human/random/scripted implementations
//! - **Orchestrator**: [`TurnOrchestrator`] turn-taking state machine
//! - **Console**: [`ChessConsole`] session facade and task-queue driver
//!
//! # Example
//!
//! ```
//! use chess_console::{ChessConsole, GameProps, ScriptedPlayer, StandardChess};
//!
//! # fn example() -> Result<(), chess_console::ConsoleError> {
//! let player = ScriptedPlayer::new("Alice", ["f3", "g4"]);
//! let opponent = ScriptedPlayer::new("Bob", ["e5", "Qh4#"]);
//! let mut console = ChessConsole::new(
//!     StandardChess::new(),
//!     Box::new(player),
//!     Box::new(opponent),
//!     GameProps::default(),
//! );
//! console.init_game(GameProps::default())?;
//! console.run_until_idle()?;
//! assert_eq!(console.state().ply_count(), 4);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod bus;
mod config;
mod console;
mod error;
mod events;
mod orchestrator;
mod player;
mod render;
mod rules;
mod state;
mod types;

// Crate-level exports - Core types
pub use types::{Color, PlayerInfo, Seat, WonColor};

// Crate-level exports - Errors
pub use error::{ConfigError, ConsoleError, InvalidHistoryError, ProtocolViolation};

// Crate-level exports - Rules engine
pub use rules::{MoveResult, PgnGame, RulesEngine, StandardChess, parse_pgn, write_pgn};

// Crate-level exports - State and events
pub use bus::{EventBus, SubscriptionId};
pub use events::ConsoleEvent;
pub use state::{GameState, StateSnapshot};

// Crate-level exports - Players
pub use player::{
    HumanInput, HumanPlayer, MoveReply, Player, RandomPlayer, RequestToken, ResultLog,
    ScriptedPlayer,
};

// Crate-level exports - Orchestration
pub use console::ChessConsole;
pub use orchestrator::{Task, TurnOrchestrator, TurnState};

// Crate-level exports - Configuration
pub use config::{ConsoleConfig, ConsoleSettings, GameProps, PlayerKind, SeatSettings};

// Crate-level exports - Rendering
pub use render::render_board;
