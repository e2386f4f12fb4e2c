//! Computer player that picks a uniformly random legal move.

use super::{MoveReply, Player};
use crate::rules::MoveResult;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Position};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Plays random legal moves, optionally after a simulated think time.
///
/// With a think time and a running tokio runtime the answer arrives from a
/// spawned task; otherwise it is queued immediately.
#[derive(Debug)]
pub struct RandomPlayer {
    name: String,
    rng: ChaCha8Rng,
    think_time: Duration,
}

impl RandomPlayer {
    /// Creates a player seeded from system entropy.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rng: ChaCha8Rng::from_entropy(),
            think_time: Duration::ZERO,
        }
    }

    /// Creates a player with a reproducible move sequence.
    pub fn seeded(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            think_time: Duration::ZERO,
        }
    }

    /// Delays each answer by `think_time`.
    pub fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }

    fn choose(&mut self, fen: &str) -> Option<String> {
        let position: Chess = match fen.parse::<Fen>() {
            Ok(parsed) => match parsed.into_position(CastlingMode::Standard) {
                Ok(position) => position,
                Err(e) => {
                    error!(fen, error = %e, "Unplayable position");
                    return None;
                }
            },
            Err(e) => {
                error!(fen, error = %e, "Unparsable FEN");
                return None;
            }
        };
        let moves = position.legal_moves();
        let m = *moves.choose(&mut self.rng)?;
        Some(SanPlus::from_move(position, m).to_string())
    }
}

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, reply), fields(name = %self.name, token = %reply.token()))]
    fn move_request(&mut self, fen: &str, reply: MoveReply) {
        let Some(mv) = self.choose(fen) else {
            warn!("No move to play");
            return;
        };
        debug!(mv = %mv, "Random move chosen");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) if !self.think_time.is_zero() => {
                let think_time = self.think_time;
                handle.spawn(async move {
                    tokio::time::sleep(think_time).await;
                    reply.send(mv);
                });
            }
            _ => {
                reply.send(mv);
            }
        }
    }

    fn move_result(&mut self, mv: &str, result: Option<&MoveResult>) {
        if result.is_none() {
            // Only legal moves are generated, so this means a mismatched engine.
            warn!(name = %self.name, mv, "Random move rejected");
        }
    }
}
