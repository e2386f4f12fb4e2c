//! Turn-taking state machine.
//!
//! The orchestrator decides whose move it is, asks that player, validates the
//! answer against the rules engine, publishes what happened and either asks
//! for the next move or ends the game.
//!
//! ```text
//! Idle --init_game--> AwaitingMove --legal move--> AwaitingMove
//!                          |   ^                        |
//!                          |   +--illegal move (same)   +--terminal--> GameOver
//!                          +--undo_move--> AwaitingMove
//! GameOver --new_game/init_game--> AwaitingMove
//! ```
//!
//! Player requests are never delivered synchronously: `next_move` queues a
//! [`Task::RequestMove`] which the console loop hands to the player on its
//! next tick, after every subscriber has seen the `MoveRequest` event.

use crate::bus::EventBus;
use crate::config::{ConsoleConfig, GameProps};
use crate::error::{ConsoleError, ProtocolViolation};
use crate::events::ConsoleEvent;
use crate::player::{MoveReply, NO_REQUEST, Player, RequestToken};
use crate::rules::RulesEngine;
use crate::state::GameState;
use crate::types::{Color, PlayerInfo, Seat, WonColor};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Unit of work on the console's single-threaded task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Deliver the move request `token` to the player to move.
    RequestMove {
        /// Request being delivered.
        token: RequestToken,
    },
    /// A player answered request `token` with `mv`.
    MoveResponse {
        /// Request being answered.
        token: RequestToken,
        /// Submitted move token.
        mv: String,
    },
}

/// Observable phase of the turn loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No game loaded.
    Idle,
    /// A move was requested from `seat` and not yet legally answered.
    AwaitingMove {
        /// Outstanding request.
        token: RequestToken,
        /// Seat asked to move.
        seat: Seat,
    },
    /// The game ended.
    GameOver {
        /// Winner, `None` for a draw.
        won_color: WonColor,
    },
}

/// Owns game state, both players and the event bus, and runs the turn loop.
pub struct TurnOrchestrator<R: RulesEngine> {
    state: GameState<R>,
    bus: EventBus,
    player: Box<dyn Player>,
    opponent: Box<dyn Player>,
    config: ConsoleConfig,
    turn: TurnState,
    outstanding: Arc<AtomicU64>,
    loaded: bool,
    next_token: u64,
    tasks: mpsc::UnboundedSender<Task>,
}

impl<R: RulesEngine> TurnOrchestrator<R> {
    /// Creates an idle orchestrator. Requests and replies are queued on `tasks`.
    pub fn new(
        engine: R,
        player: Box<dyn Player>,
        opponent: Box<dyn Player>,
        config: ConsoleConfig,
        tasks: mpsc::UnboundedSender<Task>,
    ) -> Self {
        info!(
            player = player.name(),
            opponent = opponent.name(),
            "Creating turn orchestrator"
        );
        Self {
            state: GameState::new(engine),
            bus: EventBus::new(),
            player,
            opponent,
            config,
            turn: TurnState::Idle,
            outstanding: Arc::new(AtomicU64::new(NO_REQUEST)),
            loaded: false,
            next_token: 0,
            tasks,
        }
    }

    /// Effective configuration of the current game.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Game state.
    pub fn state(&self) -> &GameState<R> {
        &self.state
    }

    /// Game state, for scrubbing and orientation commands.
    pub fn state_mut(&mut self) -> &mut GameState<R> {
        &mut self.state
    }

    /// Event bus, for subscribing.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Current phase of the turn loop.
    pub fn turn_state(&self) -> TurnState {
        self.turn
    }

    /// Starts a new game: resets state per `props`, announces `NewGame`, then
    /// continues as [`init_game`](Self::init_game).
    #[instrument(skip(self, props))]
    pub fn new_game(&mut self, props: GameProps) -> Result<(), ConsoleError> {
        self.start(props, true)
    }

    /// Initializes a game from `props`, loading `props.history` if present,
    /// and asks the player to move.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::InvalidHistory`] if the history is rejected. The
    /// previous game and configuration are then left untouched.
    #[instrument(skip(self, props))]
    pub fn init_game(&mut self, props: GameProps) -> Result<(), ConsoleError> {
        self.start(props, false)
    }

    fn start(&mut self, props: GameProps, announce_new: bool) -> Result<(), ConsoleError> {
        let config = self.config.merge(&props);
        let history = props.history.as_deref();
        self.state.reset_facing(history, *config.player_color())?;

        self.loaded = true;
        self.config = config;
        info!(
            player_color = %self.config.player_color(),
            ply_count = self.state.ply_count(),
            "Game initialized"
        );

        if announce_new {
            self.bus.publish(&ConsoleEvent::NewGame {
                props: props.clone(),
            });
        }
        if history.is_some() {
            self.bus.publish(&ConsoleEvent::Load);
        }
        self.bus.publish(&ConsoleEvent::InitGame { props });
        self.continue_or_finish()
    }

    /// Seat playing white in the current game.
    pub fn player_white(&self) -> Seat {
        self.seat_for(Color::White)
    }

    /// Seat playing black in the current game.
    pub fn player_black(&self) -> Seat {
        self.seat_for(Color::Black)
    }

    fn seat_for(&self, color: Color) -> Seat {
        if color == *self.config.player_color() {
            Seat::Player
        } else {
            Seat::Opponent
        }
    }

    /// Seat to move in the live position, `None` if the game is over.
    pub fn player_to_move(&self) -> Option<Seat> {
        let engine = self.state.engine();
        if engine.is_game_over() {
            None
        } else {
            Some(self.seat_for(engine.turn()))
        }
    }

    /// Name, seat and color of `seat` as carried by events.
    pub fn player_info(&self, seat: Seat) -> PlayerInfo {
        let color = match seat {
            Seat::Player => *self.config.player_color(),
            Seat::Opponent => self.config.player_color().other(),
        };
        PlayerInfo::new(seat, self.seated(seat).name().to_string(), color)
    }

    fn seated(&self, seat: Seat) -> &dyn Player {
        match seat {
            Seat::Player => self.player.as_ref(),
            Seat::Opponent => self.opponent.as_ref(),
        }
    }

    fn seated_mut(&mut self, seat: Seat) -> &mut dyn Player {
        match seat {
            Seat::Player => self.player.as_mut(),
            Seat::Opponent => self.opponent.as_mut(),
        }
    }

    /// Issues a move request to the seat to move, superseding any outstanding
    /// request. The player itself is called on the next tick.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Protocol`] if no game is loaded or the game is over.
    #[instrument(skip(self))]
    pub fn next_move(&mut self) -> Result<RequestToken, ConsoleError> {
        if !self.loaded {
            return Err(ProtocolViolation::new("next_move before any game was initialized").into());
        }
        let Some(seat) = self.player_to_move() else {
            return Err(ProtocolViolation::new("next_move called on a finished game").into());
        };

        let token = RequestToken(self.next_token);
        self.next_token += 1;
        self.set_turn(TurnState::AwaitingMove { token, seat });

        let player = self.player_info(seat);
        debug!(%token, seat = %seat, "Requesting move");
        self.bus.publish(&ConsoleEvent::MoveRequest { player });
        if self.tasks.send(Task::RequestMove { token }).is_err() {
            warn!(%token, "Task queue closed, request not delivered");
        }
        Ok(token)
    }

    /// Runs one queued task. Stale tasks (superseded requests, replies to
    /// them) are dropped.
    #[instrument(skip(self, task))]
    pub fn handle(&mut self, task: Task) -> Result<(), ConsoleError> {
        match task {
            Task::RequestMove { token } => {
                let TurnState::AwaitingMove { token: current, seat } = self.turn else {
                    debug!(%token, "Dropping request, no move awaited");
                    return Ok(());
                };
                if current != token {
                    debug!(%token, %current, "Dropping superseded request");
                    return Ok(());
                }
                let fen = self.state.fen();
                let reply = MoveReply::new(token, Arc::clone(&self.outstanding), self.tasks.clone());
                self.seated_mut(seat).move_request(&fen, reply);
                Ok(())
            }
            Task::MoveResponse { token, mv } => match self.turn {
                TurnState::AwaitingMove { token: current, .. } if current == token => {
                    self.move_response(&mv)
                }
                _ => {
                    warn!(%token, mv = %mv, "Dropping stale move response");
                    Ok(())
                }
            },
        }
    }

    /// Validates and applies the answer of the player to move.
    ///
    /// An illegal move is reported and leaves the same player to move; the
    /// orchestrator does not ask again. A legal move either ends the game or
    /// requests the next move.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Protocol`] unless a move is being awaited.
    #[instrument(skip(self))]
    pub fn move_response(&mut self, mv: &str) -> Result<(), ConsoleError> {
        let TurnState::AwaitingMove { .. } = self.turn else {
            return Err(ProtocolViolation::new("move_response while no move is awaited").into());
        };
        let Some(seat) = self.player_to_move() else {
            return Err(ProtocolViolation::new("move_response on a finished game").into());
        };
        let player = self.player_info(seat);

        let Some(result) = self.state.apply_move(mv) else {
            info!(seat = %seat, mv, "Illegal move");
            self.bus.publish(&ConsoleEvent::IllegalMove {
                player,
                mv: mv.to_string(),
            });
            self.seated_mut(seat).move_result(mv, None);
            return Ok(());
        };

        info!(seat = %seat, mv, san = %result.san(), "Legal move");
        self.bus.publish(&ConsoleEvent::LegalMove {
            player,
            mv: mv.to_string(),
            move_result: result.clone(),
        });
        self.seated_mut(seat).move_result(mv, Some(&result));
        self.continue_or_finish()
    }

    /// Takes back moves so the primary seat is to move again, then asks it
    /// to move.
    ///
    /// Two plies are always popped; a third if the primary seat still isn't
    /// to move. Popping past the start of the game does nothing.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Protocol`] if no game is loaded.
    #[instrument(skip(self))]
    pub fn undo_move(&mut self) -> Result<(), ConsoleError> {
        if !self.loaded {
            return Err(ProtocolViolation::new("undo_move before any game was initialized").into());
        }
        self.state.undo_move();
        self.state.undo_move();
        if self.player_to_move() != Some(Seat::Player) {
            self.state.undo_move();
        }
        info!(ply_count = self.state.ply_count(), "Moves undone");
        self.bus.publish(&ConsoleEvent::MoveUndone);
        self.continue_or_finish()
    }

    fn continue_or_finish(&mut self) -> Result<(), ConsoleError> {
        let engine = self.state.engine();
        if !engine.is_game_over() {
            return self.next_move().map(|_| ());
        }
        let won_color = if engine.is_checkmate() {
            Some(engine.turn().other())
        } else {
            None
        };
        info!(?won_color, "Game over");
        self.set_turn(TurnState::GameOver { won_color });
        self.bus.publish(&ConsoleEvent::GameOver { won_color });
        Ok(())
    }

    fn set_turn(&mut self, turn: TurnState) {
        let outstanding = match turn {
            TurnState::AwaitingMove { token, .. } => token.0,
            TurnState::Idle | TurnState::GameOver { .. } => NO_REQUEST,
        };
        self.outstanding.store(outstanding, Ordering::Release);
        self.turn = turn;
    }
}

impl<R: RulesEngine> std::fmt::Debug for TurnOrchestrator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("player", &self.player.name())
            .field("opponent", &self.opponent.name())
            .field("config", &self.config)
            .field("turn", &self.turn)
            .field("ply_count", &self.state.ply_count())
            .finish()
    }
}
