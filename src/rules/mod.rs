//! Rules-engine capability consumed by the console.
//!
//! The console never interprets moves itself. It hands move tokens to a
//! [`RulesEngine`] and only looks at the answers: legal or not, whose turn,
//! game over or not.

mod pgn;
mod standard;

pub use pgn::{PgnGame, parse_pgn, write_pgn};
pub use standard::StandardChess;

use crate::error::InvalidHistoryError;
use crate::types::Color;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Detail about a move the rules engine accepted.
///
/// The console passes it through untouched to events and players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct MoveResult {
    /// Side that made the move.
    pub(crate) color: Color,
    /// Standard algebraic notation, including check suffix.
    pub(crate) san: String,
    /// Long algebraic notation (`e2e4`, `e7e8q`).
    pub(crate) uci: String,
    /// Origin square, absent only for drops.
    pub(crate) from: Option<String>,
    /// Destination square.
    pub(crate) to: String,
    /// Moving piece as a lowercase letter (`p`, `n`, `b`, `r`, `q`, `k`).
    pub(crate) piece: char,
    /// Captured piece, if any.
    pub(crate) captured: Option<char>,
    /// Promotion piece, if any.
    pub(crate) promotion: Option<char>,
    /// Move gives check.
    pub(crate) check: bool,
    /// Move gives checkmate.
    pub(crate) checkmate: bool,
}

/// Operations the console needs from a rules engine.
pub trait RulesEngine {
    /// Returns to the initial position and clears the history.
    fn reset(&mut self);

    /// Replaces the current game with the one described by `pgn`.
    ///
    /// With `sloppy`, long-algebraic tokens are accepted besides SAN. On error
    /// the engine is left as it was.
    fn load_pgn(&mut self, pgn: &str, sloppy: bool) -> Result<(), InvalidHistoryError>;

    /// Validates and plays `token`. Returns `None` if it is not a legal move.
    fn make_move(&mut self, token: &str) -> Option<MoveResult>;

    /// Takes back the last ply, returning it. `None` on empty history.
    fn undo(&mut self) -> Option<MoveResult>;

    /// Side to move in the live position.
    fn turn(&self) -> Color;

    /// Whether the game has ended for any reason.
    fn is_game_over(&self) -> bool;

    /// Whether the side to move is checkmated.
    fn is_checkmate(&self) -> bool;

    /// FEN of the live position.
    fn fen(&self) -> String;

    /// Moves played so far, oldest first.
    fn history(&self) -> &[MoveResult];

    /// Legal moves in the live position, in SAN.
    fn legal_moves(&self) -> Vec<String>;

    /// Exports the game as PGN with the given tag pairs.
    fn pgn(&self, tags: &[(String, String)]) -> String;

    /// Number of plies played.
    fn ply_count(&self) -> usize {
        self.history().len()
    }
}
