//! Lifecycle events published by the console.

use crate::config::GameProps;
use crate::rules::MoveResult;
use crate::types::{Color, PlayerInfo};
use serde::Serialize;
use strum::IntoStaticStr;

/// One lifecycle transition. Published once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, IntoStaticStr)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ConsoleEvent {
    /// A new game was started.
    NewGame {
        /// Props the game was started with.
        props: GameProps,
    },
    /// A game was initialized (fresh or from history).
    InitGame {
        /// Props the game was initialized with.
        props: GameProps,
    },
    /// The game ended. `won_color` is `None` for a draw.
    GameOver {
        /// Winning side.
        won_color: Option<Color>,
    },
    /// A player was asked for a move.
    MoveRequest {
        /// Player to move.
        player: PlayerInfo,
    },
    /// A submitted move was accepted and applied.
    LegalMove {
        /// Player who moved.
        player: PlayerInfo,
        /// Move token as submitted.
        #[serde(rename = "move")]
        mv: String,
        /// Rules-engine detail of the move.
        move_result: MoveResult,
    },
    /// A submitted move was rejected; the turn did not advance.
    IllegalMove {
        /// Player who submitted the move.
        player: PlayerInfo,
        /// Move token as submitted.
        #[serde(rename = "move")]
        mv: String,
    },
    /// Moves were taken back.
    MoveUndone,
    /// A game history was loaded into the rules engine.
    Load,
}

impl ConsoleEvent {
    /// Event kind as a camel-case name (`legalMove`, `gameOver`, ...).
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
