//! Player capability and implementations.

mod human;
mod random;
mod scripted;

pub use human::{HumanInput, HumanPlayer};
pub use random::RandomPlayer;
pub use scripted::{ResultLog, ScriptedPlayer};

use crate::orchestrator::Task;
use crate::rules::MoveResult;
use derive_more::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Identifies one issued move request.
///
/// Replies carrying a token other than the outstanding one are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("request#{}", _0)]
pub struct RequestToken(pub(crate) u64);

/// Value of the shared outstanding-request slot while no move is awaited.
pub(crate) const NO_REQUEST: u64 = u64::MAX;

/// Callback handle given to a player with each move request.
///
/// Cloneable and `Send`, so a player may answer from another task or thread.
/// After an illegal move the same handle may be used again to retry.
#[derive(Debug, Clone)]
pub struct MoveReply {
    token: RequestToken,
    outstanding: Arc<AtomicU64>,
    tasks: mpsc::UnboundedSender<Task>,
}

impl MoveReply {
    pub(crate) fn new(
        token: RequestToken,
        outstanding: Arc<AtomicU64>,
        tasks: mpsc::UnboundedSender<Task>,
    ) -> Self {
        Self {
            token,
            outstanding,
            tasks,
        }
    }

    /// The request this reply answers.
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Whether the request is still the one the console is waiting on.
    ///
    /// Turns false once a legal move was made, the game ended, or a new game,
    /// undo or re-prompt issued a newer request.
    pub fn is_current(&self) -> bool {
        self.outstanding.load(Ordering::Acquire) == self.token.0
    }

    /// Submits a move. Delivery happens on a later tick of the console loop.
    ///
    /// Returns `false` if the console no longer exists.
    #[instrument(skip(self, mv), fields(token = %self.token))]
    pub fn send(&self, mv: impl Into<String>) -> bool {
        let mv = mv.into();
        debug!(mv = %mv, "Queueing move response");
        self.tasks
            .send(Task::MoveResponse {
                token: self.token,
                mv,
            })
            .is_ok()
    }
}

/// An agent taking part in a game: a person at a UI, an engine, a remote peer.
///
/// The console only ever talks to players through this trait.
pub trait Player {
    /// Display name.
    fn name(&self) -> &str;

    /// It is this player's turn in position `fen`.
    ///
    /// Answer through `reply`, now or on any later tick, or never.
    fn move_request(&mut self, fen: &str, reply: MoveReply);

    /// Outcome of the move this player just submitted. `result` is `None`
    /// when the move was illegal; the player is still to move.
    fn move_result(&mut self, mv: &str, result: Option<&MoveResult>);
}
