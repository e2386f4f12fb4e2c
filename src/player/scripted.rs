//! Player that replays a fixed list of moves.

use super::{MoveReply, Player};
use crate::rules::MoveResult;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::debug;

/// Shared record of the `move_result` calls a [`ScriptedPlayer`] received.
pub type ResultLog = Rc<RefCell<Vec<(String, Option<MoveResult>)>>>;

/// Answers each move request with the next scripted move.
///
/// When the script runs out it stops answering, like a person who walked away.
#[derive(Debug)]
pub struct ScriptedPlayer {
    name: String,
    moves: VecDeque<String>,
    retry_on_illegal: bool,
    reply: Option<MoveReply>,
    log: ResultLog,
}

impl ScriptedPlayer {
    /// Creates a player that will play `moves` in order.
    pub fn new<I, S>(name: impl Into<String>, moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            moves: moves.into_iter().map(Into::into).collect(),
            retry_on_illegal: false,
            reply: None,
            log: ResultLog::default(),
        }
    }

    /// After an illegal move, immediately try the next scripted move.
    pub fn retry_on_illegal(mut self, retry: bool) -> Self {
        self.retry_on_illegal = retry;
        self
    }

    /// Handle to the results this player receives.
    pub fn results(&self) -> ResultLog {
        Rc::clone(&self.log)
    }

    fn play_next(&mut self) {
        let Some(reply) = &self.reply else {
            return;
        };
        match self.moves.pop_front() {
            Some(mv) => {
                debug!(name = %self.name, mv = %mv, "Scripted move");
                reply.send(mv);
            }
            None => debug!(name = %self.name, "Script exhausted"),
        }
    }
}

impl Player for ScriptedPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn move_request(&mut self, _fen: &str, reply: MoveReply) {
        self.reply = Some(reply);
        self.play_next();
    }

    fn move_result(&mut self, mv: &str, result: Option<&MoveResult>) {
        self.log
            .borrow_mut()
            .push((mv.to_string(), result.cloned()));
        if result.is_some() {
            self.reply = None;
        } else if self.retry_on_illegal {
            self.play_next();
        }
    }
}
