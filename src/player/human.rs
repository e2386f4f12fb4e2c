//! Human player fed by a UI input handle.

use super::{MoveReply, Player};
use crate::rules::MoveResult;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

#[derive(Debug, Default)]
struct Pending {
    reply: Option<MoveReply>,
    fen: Option<String>,
    rejected: Option<String>,
}

fn lock(shared: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Player whose moves come from a person via [`HumanInput`].
#[derive(Debug)]
pub struct HumanPlayer {
    name: String,
    shared: Arc<Mutex<Pending>>,
}

/// UI-side handle of a [`HumanPlayer`].
#[derive(Debug, Clone)]
pub struct HumanInput {
    name: String,
    shared: Arc<Mutex<Pending>>,
}

impl HumanPlayer {
    /// Creates a human player and the handle its moves are typed into.
    #[instrument(skip(name))]
    pub fn new(name: impl Into<String>) -> (Self, HumanInput) {
        let name = name.into();
        info!(name = %name, "Creating human player");
        let shared = Arc::new(Mutex::new(Pending::default()));
        let input = HumanInput {
            name: name.clone(),
            shared: Arc::clone(&shared),
        };
        (Self { name, shared }, input)
    }
}

impl Player for HumanPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, reply), fields(name = %self.name))]
    fn move_request(&mut self, fen: &str, reply: MoveReply) {
        debug!("Waiting for human input");
        let mut pending = lock(&self.shared);
        pending.reply = Some(reply);
        pending.fen = Some(fen.to_string());
        pending.rejected = None;
    }

    fn move_result(&mut self, mv: &str, result: Option<&MoveResult>) {
        let mut pending = lock(&self.shared);
        match result {
            // Keep the reply so the person can try again.
            None => pending.rejected = Some(mv.to_string()),
            Some(_) => *pending = Pending::default(),
        }
    }
}

impl HumanInput {
    /// Name of the player this handle belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the player has been asked for a move and the request is still
    /// the one the console is waiting on.
    pub fn is_waiting(&self) -> bool {
        lock(&self.shared)
            .reply
            .as_ref()
            .is_some_and(MoveReply::is_current)
    }

    /// Position the pending request was issued in.
    pub fn position(&self) -> Option<String> {
        lock(&self.shared).fen.clone()
    }

    /// The last move rejected as illegal for the pending request.
    pub fn last_rejected(&self) -> Option<String> {
        lock(&self.shared).rejected.clone()
    }

    /// Submits a move for the pending request. Returns `false` if the player
    /// has not been asked for a move or the request was superseded.
    #[instrument(skip(self, mv), fields(name = %self.name))]
    pub fn submit(&self, mv: impl Into<String>) -> bool {
        let reply = lock(&self.shared).reply.clone();
        match reply {
            Some(reply) if reply.is_current() => reply.send(mv),
            Some(reply) => {
                debug!(token = %reply.token(), "Ignoring input, request superseded");
                false
            }
            None => {
                debug!("Ignoring input, not this player's turn");
                false
            }
        }
    }
}
